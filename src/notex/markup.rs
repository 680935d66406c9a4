//! Markup reader and writer
//!
//!     Reads a markup fragment into a [`Fragment`] and writes fragments back out. The reader
//!     is a stack machine over the token stream from [`tokens`]: a start tag pushes a new
//!     element, an end tag pops it (and must match), text and entities accumulate into a
//!     single text node until the next tag.
//!
//!     The writer walks the tree with `ego_tree`'s open/close traversal. Attributes come out
//!     in key order, presence-only attributes are written bare.

pub mod tokens;

use crate::notex::dom::{DomError, Element, Fragment, Node, NodeId};
use ego_tree::iter::Edge;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tokens::{tokenize_with_spans, MarkupToken};

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][A-Za-z0-9_:.-]*)(?:\s*=\s*"([^"]*)")?"#).unwrap()
});

/// Error type for reading markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// An end tag with no open element
    UnexpectedCloseTag { name: String, offset: usize },
    /// An end tag that does not match the innermost open element
    MismatchedCloseTag {
        expected: String,
        found: String,
        offset: usize,
    },
    /// Input ended with elements still open
    UnclosedTag(String),
    Dom(DomError),
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupError::UnexpectedCloseTag { name, offset } => {
                write!(f, "Unexpected </{}> at byte {}", name, offset)
            }
            MarkupError::MismatchedCloseTag {
                expected,
                found,
                offset,
            } => write!(
                f,
                "Mismatched end tag at byte {}: expected </{}>, found </{}>",
                offset, expected, found
            ),
            MarkupError::UnclosedTag(name) => write!(f, "Unclosed <{}>", name),
            MarkupError::Dom(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for MarkupError {}

impl From<DomError> for MarkupError {
    fn from(error: DomError) -> Self {
        MarkupError::Dom(error)
    }
}

/// Parse a markup fragment.
pub fn parse_fragment(source: &str) -> Result<Fragment, MarkupError> {
    let mut fragment = Fragment::new();
    let mut open = vec![fragment.root()];
    let mut pending = String::new();

    for (token, span) in tokenize_with_spans(source) {
        let slice = &source[span.clone()];
        let parent = current(&open, &fragment);
        match token {
            Some(MarkupToken::Text) | None => pending.push_str(slice),
            Some(MarkupToken::Entity) => pending.push_str(&decode_entities(slice)),
            Some(MarkupToken::StartTag) => {
                flush_text(&mut fragment, parent, &mut pending)?;
                let (element, self_closing) = parse_start_tag(slice);
                let id = fragment.append(parent, element)?;
                if !self_closing {
                    open.push(id);
                }
            }
            Some(MarkupToken::EndTag) => {
                flush_text(&mut fragment, parent, &mut pending)?;
                let found = slice[2..slice.len() - 1].trim().to_string();
                if open.len() == 1 {
                    return Err(MarkupError::UnexpectedCloseTag {
                        name: found,
                        offset: span.start,
                    });
                }
                let expected = fragment.element(parent)?.name.clone();
                if expected != found {
                    return Err(MarkupError::MismatchedCloseTag {
                        expected,
                        found,
                        offset: span.start,
                    });
                }
                open.pop();
            }
        }
    }

    let parent = current(&open, &fragment);
    flush_text(&mut fragment, parent, &mut pending)?;
    if open.len() > 1 {
        let name = fragment.element(parent)?.name.clone();
        return Err(MarkupError::UnclosedTag(name));
    }

    Ok(fragment)
}

fn current(open: &[NodeId], fragment: &Fragment) -> NodeId {
    open.last().copied().unwrap_or_else(|| fragment.root())
}

fn flush_text(
    fragment: &mut Fragment,
    parent: NodeId,
    pending: &mut String,
) -> Result<(), DomError> {
    if !pending.is_empty() {
        fragment.append(parent, Node::Text(std::mem::take(pending)))?;
    }
    Ok(())
}

fn parse_start_tag(slice: &str) -> (Element, bool) {
    let self_closing = slice.ends_with("/>");
    let inner = slice[1..slice.len() - if self_closing { 2 } else { 1 }].trim();
    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let mut element = Element::new(&inner[..name_end]);

    for captures in ATTRIBUTE.captures_iter(&inner[name_end..]) {
        let value = captures
            .get(2)
            .map(|value| decode_entities(value.as_str()))
            .unwrap_or_default();
        element.attributes.insert(captures[1].to_string(), value);
    }

    (element, self_closing)
}

fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';').and_then(|end| Some((decode_entity(&tail[1..end])?, end))) {
            Some((c, end)) => {
                decoded.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name
            .strip_prefix('#')
            .and_then(|code| code.parse::<u32>().ok())
            .and_then(char::from_u32),
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}

fn write_start_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            for c in value.chars() {
                match c {
                    '"' => out.push_str("&quot;"),
                    '&' => out.push_str("&amp;"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }
    }
    out.push('>');
}

impl Fragment {
    /// Markup for a node, the node itself included.
    pub fn to_markup(&self, id: NodeId) -> Result<String, DomError> {
        let mut out = String::new();
        for edge in self.node_ref(id)?.traverse() {
            match edge {
                Edge::Open(node) => match node.value() {
                    Node::Root => {}
                    Node::Element(element) => write_start_tag(element, &mut out),
                    Node::Text(text) => escape_text(text, &mut out),
                },
                Edge::Close(node) => {
                    if let Node::Element(element) = node.value() {
                        out.push_str("</");
                        out.push_str(&element.name);
                        out.push('>');
                    }
                }
            }
        }
        Ok(out)
    }

    /// Markup for a node's children.
    pub fn inner_markup(&self, id: NodeId) -> Result<String, DomError> {
        let mut out = String::new();
        for child in self.children(id) {
            out.push_str(&self.to_markup(child)?);
        }
        Ok(out)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let markup = self.inner_markup(self.root()).map_err(|_| fmt::Error)?;
        f.write_str(&markup)
    }
}
