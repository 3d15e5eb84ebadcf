//! Extracts macro definitions written as S-expressions from a text document
//! and substitutes them back into the surrounding prose.
//!
//! ```
//! use sexpsub::{DocumentModel, Parser};
//!
//! let parser = Parser::default();
//! let doc = DocumentModel::build(&parser, ["(define greeting hello)\n", "say greeting now\n"]);
//! assert_eq!(doc.render(), "say hello now\n");
//! ```

pub mod ast;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod processor;
pub mod rules;
pub mod token;

pub use ast::{Atom, Node};
pub use error::{DocumentError, LexError, ParseError, RulesError};
pub use grammar::{EntryPoint, Grammar};
pub use lexer::{TokenRule, Tokenizer, Tokens};
pub use parser::Parser;
pub use processor::{DocumentModel, MacroTable, SubstitutingReader, substitute};
pub use token::{Span, Token, TokenKind};
