use std::io;

use enumset::EnumSet;
use thiserror::Error;

use crate::rules::Rule;
use crate::token::{TokenKind, describe_kinds};

/// Raised by the tokenizer when no rule matches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unrecognized input at {position}")]
    UnrecognizedInput { position: usize },
}

/// Raised while parsing a single text into a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expecting {}; found {found} at {position}", describe_kinds(.expected))]
    Syntax {
        expected: EnumSet<TokenKind>,
        found: TokenKind,
        position: usize,
    },
    #[error("number {text:?} at {position} does not fit in a 64-bit integer")]
    NumericOverflow { text: String, position: usize },
    #[error("empty list at {position}")]
    EmptyList { position: usize },
    #[error("lists nested deeper than {limit} at {position}")]
    TooDeep { limit: usize, position: usize },
}

impl ParseError {
    /// Byte offset the error refers to.
    pub fn position(&self) -> usize {
        match self {
            ParseError::Lex(LexError::UnrecognizedInput { position })
            | ParseError::Syntax { position, .. }
            | ParseError::NumericOverflow { position, .. }
            | ParseError::EmptyList { position }
            | ParseError::TooDeep { position, .. } => *position,
        }
    }
}

/// Raised while building a document model.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("line {line}: definition needs a name and a value")]
    MalformedDefinition { line: usize },
}

/// Raised while loading a grammar description.
#[derive(Error, Debug)]
pub enum RulesError {
    #[error("invalid grammar description: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("invalid pattern for {kind}: {source}")]
    InvalidPattern {
        kind: TokenKind,
        #[source]
        source: regex::Error,
    },
    #[error("unknown token kind {0:?}")]
    UnknownKind(String),
    #[error("grammar description declares no token rules")]
    MissingRules,
    #[error("malformed declaration at {line}:{column}")]
    MalformedDeclaration { line: usize, column: usize },
}
