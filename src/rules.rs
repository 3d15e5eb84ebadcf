use enumset::EnumSet;
use pest::{Parser, iterators::Pair};
use pest_derive::Parser;

use crate::error::RulesError;
use crate::grammar::{EntryPoint, Grammar};
use crate::lexer::TokenRule;
use crate::token::TokenKind;

#[derive(Parser)]
#[grammar = "src/rules.pest"]
pub struct RulesParser;

/// Parse a grammar description such as
///
/// ```text
/// grammar = sexpr
/// token Identifier = /[a-z]+/
/// token LParen = /\(/
/// token RParen = /\)/
/// token Whitespace = /\s+/
/// atoms = Identifier
/// ```
///
/// Token rules keep their order; `\/` is a literal slash in a pattern.
/// Without a `grammar` line the entry point is `sexpr`; without an `atoms`
/// line identifiers and numbers are atoms.
pub fn load(source: &str) -> Result<Grammar, RulesError> {
    let file = RulesParser::parse(Rule::file, source)
        .map_err(Box::new)?
        .next()
        .ok_or(RulesError::MissingRules)?;

    let mut rules = Vec::new();
    let mut atoms = None;
    let mut entry = EntryPoint::Sexpr;
    let mut allow_empty = false;

    for decl in file.into_inner() {
        match decl.as_rule() {
            Rule::token_rule => rules.push(token_rule(decl)?),
            Rule::atoms => atoms = Some(atom_kinds(decl)?),
            Rule::entry => entry = entry_point(decl),
            Rule::option => allow_empty = true,
            _ => {}
        }
    }

    if rules.is_empty() {
        return Err(RulesError::MissingRules);
    }
    log::debug!("loaded {} token rules, entry {:?}", rules.len(), entry);

    let mut grammar = Grammar::new(rules, entry).allow_empty(allow_empty);
    if let Some(atoms) = atoms {
        grammar = grammar.with_atoms(atoms);
    }
    Ok(grammar)
}

fn token_rule(pair: Pair<Rule>) -> Result<TokenRule, RulesError> {
    let (line, column) = pair.line_col();
    let mut inner = pair.into_inner();
    let (Some(kind), Some(pattern)) = (inner.next(), inner.next()) else {
        return Err(RulesError::MalformedDeclaration { line, column });
    };

    let kind = parse_kind(kind.as_str())?;
    let body = pattern.as_str();
    let body = body
        .strip_prefix('/')
        .and_then(|b| b.strip_suffix('/'))
        .unwrap_or(body)
        .replace(r"\/", "/");

    TokenRule::new(kind, &body)
}

fn atom_kinds(pair: Pair<Rule>) -> Result<EnumSet<TokenKind>, RulesError> {
    pair.into_inner()
        .map(|kind| parse_kind(kind.as_str()))
        .collect()
}

fn entry_point(pair: Pair<Rule>) -> EntryPoint {
    match pair.into_inner().next().map(|name| name.as_str()) {
        Some("list") => EntryPoint::List,
        Some("quoted") => EntryPoint::QuotedString,
        _ => EntryPoint::Sexpr,
    }
}

fn parse_kind(name: &str) -> Result<TokenKind, RulesError> {
    match name.parse::<TokenKind>() {
        Ok(TokenKind::EndOfInput) | Err(_) => Err(RulesError::UnknownKind(name.to_owned())),
        Ok(kind) => Ok(kind),
    }
}
