use enumset::EnumSet;

use crate::ast::{Atom, Node};
use crate::error::ParseError;
use crate::grammar::{EntryPoint, Grammar};
use crate::lexer::Tokens;
use crate::token::{Token, TokenKind};

/// Signature shared by every grammar rule.
type RuleFn = for<'g, 'a> fn(&mut Cursor<'g, 'a>) -> Result<Node, ParseError>;

/// Recursive-descent parser configured by a [`Grammar`].
///
/// The start rule and the rule used for nested lists are picked from the
/// grammar's [`EntryPoint`] once, when the parser is built.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Grammar,
    start: RuleFn,
    nested: RuleFn,
}

impl Parser {
    pub fn new(grammar: Grammar) -> Self {
        let (start, nested): (RuleFn, RuleFn) = match grammar.entry() {
            EntryPoint::List => (list, list),
            EntryPoint::Sexpr => (sexpr, sexpr),
            EntryPoint::QuotedString => (quoted_string, sexpr),
        };

        Self {
            grammar,
            start,
            nested,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parse the whole of `text` as one instance of the start rule.
    ///
    /// The first error aborts the parse; no partial tree is returned.
    pub fn parse(&self, text: &str) -> Result<Node, ParseError> {
        log::trace!("parsing {:?} as {:?}", text, self.grammar.entry());

        let mut cursor = Cursor::new(&self.grammar, self.nested, text)?;
        let node = (self.start)(&mut cursor)?;
        cursor.finish()?;
        Ok(node)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Grammar::default())
    }
}

/// Per-parse state: the last consumed token and one token of lookahead.
///
/// A `lookahead` of `None` is the end-of-input sentinel.
pub(crate) struct Cursor<'g, 'a> {
    grammar: &'g Grammar,
    nested: RuleFn,
    text: &'a str,
    stream: Tokens<'g, 'a>,
    current: Option<Token<'a>>,
    lookahead: Option<Token<'a>>,
    depth: usize,
}

impl<'g, 'a> Cursor<'g, 'a> {
    fn new(grammar: &'g Grammar, nested: RuleFn, text: &'a str) -> Result<Self, ParseError> {
        let mut cursor = Self {
            grammar,
            nested,
            text,
            stream: grammar.tokenizer().tokenize(text),
            current: None,
            lookahead: None,
            depth: 0,
        };
        cursor.consume()?;
        Ok(cursor)
    }

    fn consume(&mut self) -> Result<(), ParseError> {
        let next = self.stream.next().transpose()?;
        self.current = std::mem::replace(&mut self.lookahead, next);
        Ok(())
    }

    fn peek(&self) -> TokenKind {
        self.lookahead
            .as_ref()
            .map_or(TokenKind::EndOfInput, |t| t.kind)
    }

    fn position(&self) -> usize {
        self.lookahead
            .as_ref()
            .map_or(self.text.len(), |t| t.span.start)
    }

    fn unexpected(&self, expected: EnumSet<TokenKind>) -> ParseError {
        ParseError::Syntax {
            expected,
            found: self.peek(),
            position: self.position(),
        }
    }

    /// Consume the lookahead if its kind is one of `kinds`.
    fn expect(&mut self, kinds: impl Into<EnumSet<TokenKind>>) -> Result<Token<'a>, ParseError> {
        let kinds = kinds.into();
        let accepted = self
            .lookahead
            .as_ref()
            .is_some_and(|t| kinds.contains(t.kind));
        if !accepted {
            return Err(self.unexpected(kinds));
        }

        self.consume()?;
        self.current.clone().ok_or_else(|| self.unexpected(kinds))
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.lookahead {
            None => Ok(()),
            Some(_) => Err(self.unexpected(EnumSet::only(TokenKind::EndOfInput))),
        }
    }

    /// Handles `()` right after an opening paren.
    fn empty_list(&mut self) -> Result<Option<Node>, ParseError> {
        if self.peek() != TokenKind::RParen {
            return Ok(None);
        }
        if !self.grammar.allows_empty() {
            return Err(ParseError::EmptyList {
                position: self.position(),
            });
        }
        self.expect(TokenKind::RParen)?;
        Ok(Some(Node::List(Vec::new())))
    }
}

// list := '(' element (',' element)* ')'
fn list(c: &mut Cursor<'_, '_>) -> Result<Node, ParseError> {
    c.expect(TokenKind::LParen)?;
    if let Some(empty) = c.empty_list()? {
        return Ok(empty);
    }

    let mut items = vec![element(c)?];
    while c.expect(TokenKind::Comma | TokenKind::RParen)?.kind == TokenKind::Comma {
        items.push(element(c)?);
    }
    Ok(Node::List(items))
}

// sexpr := '(' element+ ')'
fn sexpr(c: &mut Cursor<'_, '_>) -> Result<Node, ParseError> {
    c.expect(TokenKind::LParen)?;
    if let Some(empty) = c.empty_list()? {
        return Ok(empty);
    }

    let mut items = Vec::new();
    loop {
        items.push(element(c)?);
        match c.peek() {
            TokenKind::RParen => break,
            TokenKind::EndOfInput => return Err(c.unexpected(EnumSet::only(TokenKind::RParen))),
            _ => {}
        }
    }
    c.expect(TokenKind::RParen)?;
    Ok(Node::List(items))
}

// quoted := QUOTE <anything but that quote>* QUOTE
fn quoted_string(c: &mut Cursor<'_, '_>) -> Result<Node, ParseError> {
    let open = c.expect(TokenKind::quotes())?;
    loop {
        match c.peek() {
            kind if kind == open.kind => break,
            TokenKind::EndOfInput => return Err(c.unexpected(EnumSet::only(open.kind))),
            _ => c.consume()?,
        }
    }
    let close = c.expect(open.kind)?;
    Ok(Node::quoted(&c.text[open.span.end..close.span.start]))
}

// element := atom | quoted | nested list
fn element(c: &mut Cursor<'_, '_>) -> Result<Node, ParseError> {
    let atoms = c.grammar.atoms();
    match c.peek() {
        kind if atoms.contains(kind) && TokenKind::quotes().contains(kind) => quoted_string(c),
        kind if atoms.contains(kind) => atom(c),
        TokenKind::LParen => {
            let limit = c.grammar.max_depth();
            if c.depth >= limit {
                return Err(ParseError::TooDeep {
                    limit,
                    position: c.position(),
                });
            }
            c.depth += 1;
            let nested = c.nested;
            let node = nested(c);
            c.depth -= 1;
            node
        }
        _ => Err(c.unexpected(atoms | TokenKind::LParen)),
    }
}

fn atom(c: &mut Cursor<'_, '_>) -> Result<Node, ParseError> {
    let token = c.expect(c.grammar.atoms())?;
    let atom = match token.kind {
        TokenKind::Number => {
            let value = token
                .text
                .parse::<i64>()
                .map_err(|_| ParseError::NumericOverflow {
                    text: token.text.to_owned(),
                    position: token.span.start,
                })?;
            Atom::Number(value)
        }
        TokenKind::QuotedWord => Atom::QuotedWord(unquote(token.text).to_owned()),
        _ => Atom::Identifier(token.text.to_owned()),
    };
    Ok(Node::Atom(atom))
}

/// Strips one pair of matching quote characters, if present.
fn unquote(text: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&q| text.strip_prefix(q).and_then(|t| t.strip_suffix(q)))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::LexError;

    fn sexpr_parser(atoms: EnumSet<TokenKind>) -> Parser {
        Parser::new(Grammar::sexpr().with_atoms(atoms))
    }

    #[test]
    fn test_parse_flat_sexpr() {
        let parser = sexpr_parser(EnumSet::only(TokenKind::Identifier));
        assert_eq!(
            parser.parse("(a b c)").unwrap(),
            Node::List(vec![Node::ident("a"), Node::ident("b"), Node::ident("c")])
        );
    }

    #[test]
    fn test_parse_nested_sexpr() {
        let parser = sexpr_parser(EnumSet::only(TokenKind::Identifier));
        assert_eq!(
            parser.parse("(a (b c))").unwrap(),
            Node::List(vec![
                Node::ident("a"),
                Node::List(vec![Node::ident("b"), Node::ident("c")]),
            ])
        );
    }

    #[test]
    fn test_parse_number_atom() {
        let parser = sexpr_parser(TokenKind::Identifier | TokenKind::Number);
        assert_eq!(
            parser.parse("(x 42)").unwrap(),
            Node::List(vec![Node::ident("x"), Node::number(42)])
        );
    }

    #[test]
    fn test_missing_close_paren() {
        let parser = sexpr_parser(EnumSet::only(TokenKind::Identifier));
        assert_eq!(
            parser.parse("(a b"),
            Err(ParseError::Syntax {
                expected: EnumSet::only(TokenKind::RParen),
                found: TokenKind::EndOfInput,
                position: 4,
            })
        );
    }

    #[test]
    fn test_numeric_overflow() {
        let parser = Parser::default();
        assert_eq!(
            parser.parse("(x 99999999999999999999)"),
            Err(ParseError::NumericOverflow {
                text: "99999999999999999999".to_owned(),
                position: 3,
            })
        );
    }

    #[rstest]
    #[case::sexpr(Grammar::sexpr())]
    #[case::list(Grammar::comma_list())]
    fn test_empty_list_rejected(#[case] grammar: Grammar) {
        let parser = Parser::new(grammar);
        assert_eq!(parser.parse("()"), Err(ParseError::EmptyList { position: 1 }));
    }

    #[rstest]
    #[case::sexpr(Grammar::sexpr(), "(a ())")]
    #[case::list(Grammar::comma_list(), "(a, ())")]
    fn test_empty_list_allowed(#[case] grammar: Grammar, #[case] input: &str) {
        let parser = Parser::new(grammar.allow_empty(true));
        assert_eq!(
            parser.parse(input).unwrap(),
            Node::List(vec![Node::ident("a"), Node::List(vec![])])
        );
    }

    #[test]
    fn test_comma_list() {
        let parser = Parser::new(Grammar::comma_list());
        assert_eq!(
            parser.parse(r#"(a, 1, "two words", (b, c))"#).unwrap(),
            Node::List(vec![
                Node::ident("a"),
                Node::number(1),
                Node::quoted("two words"),
                Node::List(vec![Node::ident("b"), Node::ident("c")]),
            ])
        );
    }

    #[test]
    fn test_comma_list_requires_separator() {
        let parser = Parser::new(Grammar::comma_list());
        assert_eq!(
            parser.parse("(a b)"),
            Err(ParseError::Syntax {
                expected: TokenKind::Comma | TokenKind::RParen,
                found: TokenKind::Identifier,
                position: 3,
            })
        );
    }

    #[test]
    fn test_quoted_string_in_sexpr() {
        let parser = Parser::default();
        assert_eq!(
            parser.parse(r#"(define greet "Hello,  world!")"#).unwrap(),
            Node::List(vec![
                Node::ident("define"),
                Node::ident("greet"),
                Node::quoted("Hello,  world!"),
            ])
        );
    }

    #[test]
    fn test_single_quotes_may_contain_double() {
        let parser = Parser::default();
        assert_eq!(
            parser.parse(r#"(q 'say "hi"')"#).unwrap(),
            Node::List(vec![Node::ident("q"), Node::quoted(r#"say "hi""#)])
        );
    }

    #[test]
    fn test_quoted_entry_point() {
        let parser = Parser::new(Grammar::quoted());
        assert_eq!(
            parser.parse(r#""it's (fine)""#).unwrap(),
            Node::quoted("it's (fine)")
        );
        assert_eq!(
            parser.parse("'open"),
            Err(ParseError::Syntax {
                expected: EnumSet::only(TokenKind::SingleQuote),
                found: TokenKind::EndOfInput,
                position: 5,
            })
        );
    }

    #[rstest]
    #[case("a b", TokenKind::Identifier, 0)]
    #[case("(a) b", TokenKind::Identifier, 4)]
    #[case(")", TokenKind::RParen, 0)]
    fn test_syntax_errors(#[case] input: &str, #[case] found: TokenKind, #[case] position: usize) {
        let parser = Parser::default();
        match parser.parse(input) {
            Err(ParseError::Syntax {
                found: f,
                position: p,
                ..
            }) => {
                assert_eq!(f, found);
                assert_eq!(p, position);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let parser = Parser::default();
        assert_eq!(
            parser.parse("   "),
            Err(ParseError::Syntax {
                expected: EnumSet::only(TokenKind::LParen),
                found: TokenKind::EndOfInput,
                position: 3,
            })
        );
    }

    #[test]
    fn test_lex_error_surfaces() {
        let parser = Parser::new(Grammar::comma_list());
        assert_eq!(
            parser.parse("(a, %)"),
            Err(ParseError::Lex(LexError::UnrecognizedInput { position: 4 }))
        );
    }

    #[test]
    fn test_unaccepted_atom_kind() {
        let parser = sexpr_parser(EnumSet::only(TokenKind::Identifier));
        assert_eq!(
            parser.parse("(x 42)"),
            Err(ParseError::Syntax {
                expected: TokenKind::Identifier | TokenKind::LParen,
                found: TokenKind::Number,
                position: 3,
            })
        );
    }

    #[test]
    fn test_parser_is_reusable() {
        let parser = Parser::default();
        assert!(parser.parse("(a b").is_err());
        assert_eq!(
            parser.parse("(a b)").unwrap(),
            Node::List(vec![Node::ident("a"), Node::ident("b")])
        );
    }

    #[rstest]
    #[case::sexpr(Grammar::sexpr())]
    #[case::list(Grammar::comma_list())]
    fn test_deep_nesting_is_an_error(#[case] grammar: Grammar) {
        let parser = Parser::new(grammar);
        let line = "(".repeat(100_000);
        assert_eq!(
            parser.parse(&line),
            Err(ParseError::TooDeep {
                limit: 100,
                position: 101,
            })
        );
    }

    #[test]
    fn test_nesting_up_to_limit() {
        let parser = Parser::new(Grammar::sexpr().with_max_depth(2));
        assert!(parser.parse("(a (b (c)))").is_ok());
        assert_eq!(
            parser.parse("(a (b (c (d))))"),
            Err(ParseError::TooDeep {
                limit: 2,
                position: 9,
            })
        );
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""x y""#), "x y");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote(r#""x'"#), r#""x'"#);
    }
}
