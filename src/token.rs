use std::ops::Range;

use enumset::{EnumSet, EnumSetType};
use strum::{Display, EnumString};

/// Byte range of a token within the scanned text.
pub type Span = Range<usize>;

/// Classification of a token.
///
/// `EndOfInput` is never produced by the tokenizer; the parser uses it to
/// report that it ran out of tokens.
#[derive(Debug, Hash, EnumSetType, Display, EnumString)]
pub enum TokenKind {
    Identifier,
    Number,
    QuotedWord,
    Comma,
    SingleQuote,
    DoubleQuote,
    LParen,
    RParen,
    Whitespace,
    Punctuation,
    #[strum(to_string = "end of input")]
    EndOfInput,
}

impl TokenKind {
    /// Kinds that open (and close) a quoted string.
    pub fn quotes() -> EnumSet<TokenKind> {
        TokenKind::SingleQuote | TokenKind::DoubleQuote
    }
}

/// A classified, positioned slice of the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub span: Span,
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, span: Span, text: &'a str) -> Self {
        Self { span, kind, text }
    }
}

/// Renders a kind set as `A or B or C` for diagnostics.
pub(crate) fn describe_kinds(kinds: &EnumSet<TokenKind>) -> String {
    kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}
