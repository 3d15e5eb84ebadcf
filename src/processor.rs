use std::collections::HashMap;
use std::io::{self, BufRead, Read};

use crate::ast::Node;
use crate::error::{DocumentError, ParseError};
use crate::parser::Parser;

/// Identifier that marks a line as a macro definition
pub const DEFINE: &str = "define";

/// Macro names and their values, iterated in first-insertion order.
///
/// Redefining a name replaces its value but keeps its position.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MacroTable {
    entries: Vec<(String, Node)>,
    index: HashMap<String, usize>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro, returning the value it replaced
    pub fn define(&mut self, name: String, value: Node) -> Option<Node> {
        match self.index.get(&name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// A document split into macro definitions and the prose around them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DocumentModel {
    macros: MacroTable,
    residual: Vec<String>,
}

impl DocumentModel {
    /// Classify every line: lines that parse as a list feed the macro
    /// table, every other line is kept verbatim as residual text.
    pub fn build<I>(parser: &Parser, lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut model = Self::default();
        for (i, line) in lines.into_iter().enumerate() {
            model.push_line(parser, i + 1, line.as_ref());
        }
        model
    }

    /// Like [`DocumentModel::build`], splitting `text` after each `\n`.
    pub fn from_text(parser: &Parser, text: &str) -> Self {
        Self::build(parser, text.split_inclusive('\n'))
    }

    /// Like [`DocumentModel::build`], reading lines from `reader` one at a time.
    pub fn from_reader<R: BufRead>(parser: &Parser, mut reader: R) -> Result<Self, DocumentError> {
        let mut model = Self::default();
        let mut line = String::new();
        let mut number = 0;
        while reader.read_line(&mut line)? != 0 {
            number += 1;
            model.push_line(parser, number, &line);
            line.clear();
        }
        Ok(model)
    }

    fn push_line(&mut self, parser: &Parser, number: usize, line: &str) {
        let content = line.trim_end_matches(['\n', '\r']);
        let node = match parser.parse(content) {
            Ok(node) => node,
            Err(
                err @ (ParseError::Lex(_)
                | ParseError::Syntax { .. }
                | ParseError::NumericOverflow { .. }
                | ParseError::EmptyList { .. }
                | ParseError::TooDeep { .. }),
            ) => return self.keep(number, line, &err),
        };

        if let Err(err) = self.record(number, node) {
            self.keep(number, line, &err);
        }
    }

    fn keep(&mut self, number: usize, line: &str, reason: &dyn std::error::Error) {
        log::debug!("line {number}: kept as text: {reason}");
        self.residual.push(line.to_owned());
    }

    fn record(&mut self, number: usize, node: Node) -> Result<(), DocumentError> {
        let malformed = || DocumentError::MalformedDefinition { line: number };

        let Node::List(mut items) = node else {
            return Err(malformed());
        };
        if items.is_empty() {
            return Err(malformed());
        }

        let head = items.remove(0);
        let (name, value) = if head.as_ident() == Some(DEFINE) {
            if items.len() < 2 {
                return Err(malformed());
            }
            let name = items.remove(0);
            (name.to_string(), Node::from_elements(items))
        } else {
            (head.to_string(), Node::from_elements(items))
        };

        log::debug!("line {number}: {name} = {value}");
        if self.macros.define(name, value).is_some() {
            log::debug!("line {number}: previous definition replaced");
        }
        Ok(())
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Lines that are not definitions, terminators included
    pub fn residual(&self) -> &[String] {
        &self.residual
    }

    pub fn residual_text(&self) -> String {
        self.residual.concat()
    }

    /// Residual text with every macro substituted once.
    pub fn render(&self) -> String {
        substitute(&self.macros, &self.residual_text())
    }

    pub fn into_parts(self) -> (MacroTable, Vec<String>) {
        (self.macros, self.residual)
    }
}

/// Replace every occurrence of each macro name in `text` with its value.
///
/// The text is scanned once, left to right. At each position the first
/// name in table order that matches is replaced and scanning resumes after
/// it, so inserted values are never rescanned. Running this again on its
/// own output is not guaranteed to be a no-op.
pub fn substitute(macros: &MacroTable, text: &str) -> String {
    let rendered: Vec<(&str, String)> = macros
        .iter()
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name, value.to_string()))
        .collect();
    if rendered.is_empty() {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        match rendered.iter().find(|(name, _)| rest.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &rest[name.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// A reader that substitutes macros in the lines read from `inner`.
///
/// Input is pulled one line at a time; only the current line is held.
pub struct SubstitutingReader<R> {
    inner: R,
    macros: MacroTable,
    line: String,
    pending: Vec<u8>,
    pos: usize,
}

impl<R: BufRead> SubstitutingReader<R> {
    pub fn new(inner: R, macros: MacroTable) -> Self {
        Self {
            inner,
            macros,
            line: String::new(),
            pending: Vec::new(),
            pos: 0,
        }
    }

    /// Substitute the next input line; `false` at end of input.
    fn next_line(&mut self) -> io::Result<bool> {
        self.line.clear();
        if self.inner.read_line(&mut self.line)? == 0 {
            return Ok(false);
        }
        self.pending = substitute(&self.macros, &self.line).into_bytes();
        self.pos = 0;
        Ok(true)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> Read for SubstitutingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.pending.len() {
            if !self.next_line()? {
                return Ok(0);
            }
        }

        let n = (&self.pending[self.pos..]).read(buf)?;
        self.pos += n;
        Ok(n)
    }
}
