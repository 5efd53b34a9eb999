//! CSS selector parsing and matching for the document model.
//!
//! Only the subset the lightbox needs is supported, which is also the subset
//! the partition selectors and typical host selectors use:
//!
//! | Syntax | Example |
//! |---|---|
//! | type / universal | `a`, `*` |
//! | class | `.glightbox` |
//! | id | `#content` |
//! | attribute presence | `[data-gallery]` |
//! | attribute equality | `[data-andw-animation="fade"]` |
//! | negation of a compound | `:not([data-andw-animation])` |
//! | descendant / child combinators | `main .glightbox`, `figure > a` |
//! | selector lists | `.a, .b` |
//!
//! Anything else is a [`SelectorError`]. Callers in the engine treat a parse
//! failure as "no elements found".

use super::{Document, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    #[error("unsupported pseudo-class ':{0}'")]
    UnsupportedPseudo(String),
}

/// A parsed selector list. Matches a node when any of its alternatives does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// Rightmost compound first; each carries the combinator linking it to
    /// the compound on its left.
    parts: Vec<(Compound, Option<Combinator>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrTest>,
    negations: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser {
            chars: input.char_indices().collect(),
            pos: 0,
        };
        let selector = parser.selector_list()?;
        Ok(selector)
    }

    /// True if `node` matches any alternative in the list.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match_from(doc, node, &self.parts)
    }
}

fn match_from(doc: &Document, node: NodeId, parts: &[(Compound, Option<Combinator>)]) -> bool {
    let Some(((compound, combinator), rest)) = parts.split_first() else {
        return true;
    };
    if !compound.matches(doc, node) {
        return false;
    }
    match combinator {
        None => true,
        Some(Combinator::Child) => doc
            .parent(node)
            .is_some_and(|parent| match_from(doc, parent, rest)),
        Some(Combinator::Descendant) => {
            let mut cursor = doc.parent(node);
            while let Some(ancestor) = cursor {
                if match_from(doc, ancestor, rest) {
                    return true;
                }
                cursor = doc.parent(ancestor);
            }
            false
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.negations.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if !doc.tag(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        let attrs_ok = self.attributes.iter().all(|test| {
            match (doc.attribute(node, &test.name), &test.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        });
        attrs_ok && !self.negations.iter().any(|n| n.matches(doc, node))
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(o, _)| o)
            .unwrap_or_else(|| self.chars.last().map(|&(o, c)| o + c.len_utf8()).unwrap_or(0))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar {
                ch,
                offset: self.offset(),
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, want: char) -> Result<(), SelectorError> {
        if self.peek() == Some(want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn selector_list(&mut self) -> Result<Selector, SelectorError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut alternatives = vec![self.complex()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            self.skip_ws();
            alternatives.push(self.complex()?);
        }
        if self.peek().is_some() {
            return Err(self.unexpected());
        }
        Ok(Selector { alternatives })
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        // Parsed left to right, stored right to left.
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                    compounds.push(self.compound()?);
                }
                Some(',') | None => break,
                Some(_) if had_ws => {
                    combinators.push(Combinator::Descendant);
                    compounds.push(self.compound()?);
                }
                Some(_) => return Err(self.unexpected()),
            }
        }

        let mut parts = Vec::with_capacity(compounds.len());
        let mut links = combinators.into_iter().rev();
        for compound in compounds.into_iter().rev() {
            parts.push((compound, links.next()));
        }
        Ok(Complex { parts })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let universal = self.peek() == Some('*');
        if universal {
            self.pos += 1;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.ident()?);
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let name = self.ident()?;
                    if name != "not" {
                        return Err(SelectorError::UnsupportedPseudo(name));
                    }
                    self.expect('(')?;
                    self.skip_ws();
                    let inner = self.compound()?;
                    self.skip_ws();
                    self.expect(')')?;
                    compound.negations.push(inner);
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrTest, SelectorError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let value = match self.peek() {
            Some(']') => None,
            Some('=') => {
                self.pos += 1;
                self.skip_ws();
                let v = match self.peek() {
                    Some(q @ ('"' | '\'')) => {
                        self.pos += 1;
                        self.quoted(q)?
                    }
                    Some(c) if is_ident_start(c) || c.is_ascii_digit() => self.ident()?,
                    _ => return Err(self.unexpected()),
                };
                self.skip_ws();
                Some(v)
            }
            _ => return Err(self.unexpected()),
        };
        self.expect(']')?;
        Ok(AttrTest { name, value })
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SelectorError::UnexpectedEnd),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(SelectorError::UnexpectedEnd),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.unexpected());
        }
        Ok(out)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_link(attrs: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let figure = doc.create_element("figure");
        doc.append_child(body, figure);
        let a = doc.create_element("a");
        for (k, v) in attrs {
            doc.set_attribute(a, k, v);
        }
        doc.append_child(figure, a);
        (doc, a)
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parses_partition_selectors() {
        for s in [
            ".glightbox",
            ".glightbox[data-andw-animation=\"fade\"]",
            ".glightbox:not([data-andw-animation])",
            "a.glightbox, figure > a",
            "main .glightbox",
            "*",
        ] {
            assert!(Selector::parse(s).is_ok(), "failed to parse {s}");
        }
    }

    #[test]
    fn empty_selector_is_error() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    }

    #[test]
    fn malformed_selectors_are_errors() {
        assert!(Selector::parse(".glightbox[").is_err());
        assert!(Selector::parse("[data-x=\"open").is_err());
        assert!(Selector::parse("a,,b").is_err());
        assert!(Selector::parse(">>").is_err());
        assert!(Selector::parse(".").is_err());
    }

    #[test]
    fn unknown_pseudo_is_rejected() {
        assert_eq!(
            Selector::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudo("hover".into()))
        );
    }

    // =========================================================================
    // Matching
    // =========================================================================

    #[test]
    fn class_and_attribute_equality() {
        let (doc, a) = doc_with_link(&[("class", "glightbox x"), ("data-andw-animation", "fade")]);
        let fade = Selector::parse(".glightbox[data-andw-animation=\"fade\"]").unwrap();
        let zoom = Selector::parse(".glightbox[data-andw-animation='zoom']").unwrap();
        assert!(fade.matches(&doc, a));
        assert!(!zoom.matches(&doc, a));
    }

    #[test]
    fn negation_excludes_tagged_anchors() {
        let (doc, tagged) = doc_with_link(&[("class", "glightbox"), ("data-andw-animation", "none")]);
        let default = Selector::parse(".glightbox:not([data-andw-animation])").unwrap();
        assert!(!default.matches(&doc, tagged));

        let (doc, plain) = doc_with_link(&[("class", "glightbox")]);
        assert!(default.matches(&doc, plain));
    }

    #[test]
    fn negated_universal_matches_nothing() {
        let (doc, a) = doc_with_link(&[("class", "glightbox")]);
        let none = Selector::parse(".glightbox:not(*)").unwrap();
        assert!(!none.matches(&doc, a));
        assert!(Selector::parse("a:not()").is_err());
    }

    #[test]
    fn combinators_walk_ancestors() {
        let (doc, a) = doc_with_link(&[("class", "glightbox")]);
        assert!(Selector::parse("figure > .glightbox").unwrap().matches(&doc, a));
        assert!(Selector::parse("body .glightbox").unwrap().matches(&doc, a));
        assert!(!Selector::parse("body > .glightbox").unwrap().matches(&doc, a));
        assert!(!Selector::parse("section .glightbox").unwrap().matches(&doc, a));
    }

    #[test]
    fn selector_list_matches_any() {
        let (doc, a) = doc_with_link(&[("id", "hero")]);
        assert!(Selector::parse(".nope, #hero").unwrap().matches(&doc, a));
    }
}
