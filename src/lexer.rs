use regex::Regex;

use crate::error::{LexError, RulesError};
use crate::token::{Span, Token, TokenKind};

/// One entry of a tokenizer's rule list: a kind and the pattern producing it.
#[derive(Debug, Clone)]
pub struct TokenRule {
    kind: TokenKind,
    pattern: String,
    regex: Regex,
}

impl TokenRule {
    /// Compiles `pattern` so that it only matches at the scan position.
    pub fn new(kind: TokenKind, pattern: &str) -> Result<Self, RulesError> {
        let regex = Regex::new(&format!(r"\A(?:{pattern})"))
            .map_err(|source| RulesError::InvalidPattern { kind, source })?;

        Ok(Self {
            kind,
            pattern: pattern.to_owned(),
            regex,
        })
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Length of a non-empty match at the start of `rest`
    fn match_len(&self, rest: &str) -> Option<usize> {
        self.regex
            .find(rest)
            .map(|m| m.end())
            .filter(|&len| len > 0)
    }
}

/// Regex-driven tokenizer over an ordered rule list.
///
/// At every position the first rule that matches wins, even if a later rule
/// would match a longer run. The tokenizer holds no scan state, so one
/// instance can tokenize any number of inputs.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: Vec<TokenRule>,
}

impl Tokenizer {
    pub fn new(rules: Vec<TokenRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[TokenRule] {
        &self.rules
    }

    /// Lazily tokenize `text`, skipping whitespace tokens
    pub fn tokenize<'t, 'a>(&'t self, text: &'a str) -> Tokens<'t, 'a> {
        Tokens {
            rules: &self.rules,
            text,
            pos: 0,
            trivia: false,
            done: false,
        }
    }
}

/// Token sequence produced by [`Tokenizer::tokenize`].
///
/// Yields at most one error, after which the sequence ends.
#[derive(Debug, Clone)]
pub struct Tokens<'t, 'a> {
    rules: &'t [TokenRule],
    text: &'a str,
    pos: usize,
    trivia: bool,
    done: bool,
}

impl<'t, 'a> Tokens<'t, 'a> {
    /// Also yield whitespace tokens, so that the token texts cover the whole input.
    pub fn with_trivia(mut self) -> Self {
        self.trivia = true;
        self
    }

    fn scan(&mut self) -> Option<Result<Token<'a>, LexError>> {
        if self.done || self.pos >= self.text.len() {
            return None;
        }

        let text = self.text;
        let rest = &text[self.pos..];
        let found = self
            .rules
            .iter()
            .find_map(|rule| rule.match_len(rest).map(|len| (rule.kind, len)));

        match found {
            Some((kind, len)) => {
                let span: Span = self.pos..self.pos + len;
                self.pos = span.end;
                Some(Ok(Token::new(kind, span.clone(), &text[span])))
            }
            None => {
                self.done = true;
                Some(Err(LexError::UnrecognizedInput { position: self.pos }))
            }
        }
    }
}

impl<'a> Iterator for Tokens<'_, 'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.scan()? {
                Ok(token) if token.kind == TokenKind::Whitespace && !self.trivia => continue,
                item => return Some(item),
            }
        }
    }
}

impl std::iter::FusedIterator for Tokens<'_, '_> {}
