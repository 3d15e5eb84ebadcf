use enumset::EnumSet;

use crate::lexer::{TokenRule, Tokenizer};
use crate::token::TokenKind;

/// Deepest list nesting accepted unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Start rule of a grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// `'(' element (',' element)* ')'`
    List,
    /// `'(' element+ ')'`
    Sexpr,
    /// A quote token, anything, then the same quote token
    QuotedString,
}

/// Everything that varies between the supported grammars: token rules,
/// which token kinds are atoms, the start rule and whether `()` is allowed.
#[derive(Debug, Clone)]
pub struct Grammar {
    tokenizer: Tokenizer,
    atoms: EnumSet<TokenKind>,
    entry: EntryPoint,
    allow_empty: bool,
    max_depth: usize,
}

impl Grammar {
    pub fn new(rules: Vec<TokenRule>, entry: EntryPoint) -> Self {
        Self {
            tokenizer: Tokenizer::new(rules),
            atoms: TokenKind::Identifier | TokenKind::Number,
            entry,
            allow_empty: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Bare S-expressions of identifiers, numbers and quoted strings.
    pub fn sexpr() -> Self {
        use TokenKind::*;
        Self::new(
            vec![
                preset(Identifier, r"[A-Za-z_][A-Za-z0-9_-]*"),
                preset(Number, r"[0-9]+"),
                preset(SingleQuote, r"'"),
                preset(DoubleQuote, r#"""#),
                preset(LParen, r"\("),
                preset(RParen, r"\)"),
                preset(Whitespace, r"\s+"),
                preset(Punctuation, r"[^A-Za-z0-9_\s]"),
            ],
            EntryPoint::Sexpr,
        )
        .with_atoms(Identifier | Number | SingleQuote | DoubleQuote)
    }

    /// Comma-delimited lists, with quoted words scanned as single tokens.
    pub fn comma_list() -> Self {
        use TokenKind::*;
        Self::new(
            vec![
                preset(Identifier, r"[A-Za-z_][A-Za-z0-9_-]*"),
                preset(Number, r"[0-9]+"),
                preset(QuotedWord, r#""[^"]*"|'[^']*'"#),
                preset(Comma, r","),
                preset(LParen, r"\("),
                preset(RParen, r"\)"),
                preset(Whitespace, r"\s+"),
            ],
            EntryPoint::List,
        )
        .with_atoms(Identifier | Number | QuotedWord)
    }

    /// A whole input that is one quoted string.
    pub fn quoted() -> Self {
        use TokenKind::*;
        Self::new(
            vec![
                preset(SingleQuote, r"'"),
                preset(DoubleQuote, r#"""#),
                preset(Whitespace, r"\s+"),
                preset(Identifier, r"[A-Za-z0-9_-]+"),
                preset(Punctuation, r#"[^A-Za-z0-9_\s'"]"#),
            ],
            EntryPoint::QuotedString,
        )
        .with_atoms(SingleQuote | DoubleQuote)
    }

    pub fn with_atoms(mut self, atoms: EnumSet<TokenKind>) -> Self {
        self.atoms = atoms;
        self
    }

    pub fn with_entry(mut self, entry: EntryPoint) -> Self {
        self.entry = entry;
        self
    }

    /// Accept `()` as an empty list instead of rejecting it.
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Limit how many lists may be open at once.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn atoms(&self) -> EnumSet<TokenKind> {
        self.atoms
    }

    pub fn entry(&self) -> EntryPoint {
        self.entry
    }

    pub fn allows_empty(&self) -> bool {
        self.allow_empty
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::sexpr()
    }
}

fn preset(kind: TokenKind, pattern: &str) -> TokenRule {
    TokenRule::new(kind, pattern).expect("preset token pattern must compile")
}
