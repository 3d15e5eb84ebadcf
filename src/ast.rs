use std::fmt;

/// Terminal value of a parsed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Identifier(String),
    Number(i64),
    /// Text between quotes, delimiters removed
    QuotedWord(String),
}

/// Parsed tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Atom(Atom),
    List(Vec<Node>),
}

impl Node {
    pub fn ident(name: impl Into<String>) -> Self {
        Node::Atom(Atom::Identifier(name.into()))
    }

    pub fn number(value: i64) -> Self {
        Node::Atom(Atom::Number(value))
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Node::Atom(Atom::QuotedWord(text.into()))
    }

    /// Identifier name, if this node is an identifier atom
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Node::Atom(Atom::Identifier(name)) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            Node::Atom(_) => None,
        }
    }

    /// Collapses a sequence of nodes into one value: a single node stays as
    /// is, anything else becomes a list.
    pub fn from_elements(mut nodes: Vec<Node>) -> Self {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Node::List(nodes)
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Identifier(s) | Atom::QuotedWord(s) => f.write_str(s),
            Atom::Number(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Atom(atom) => write!(f, "{atom}"),
            Node::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}
