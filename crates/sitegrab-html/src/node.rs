//! HTML nodes.

use std::fmt;
use std::ops::Deref;

use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, QualName};

/// An HTML node.
#[derive(Clone, PartialEq, Eq)]
pub enum Node {
    /// The document root.
    Document,

    /// The fragment root.
    Fragment,

    /// A doctype.
    Doctype(Doctype),

    /// A comment.
    Comment(Comment),

    /// Text.
    Text(Text),

    /// An element.
    Element(Element),

    /// A processing instruction.
    ProcessingInstruction(ProcessingInstruction),
}

impl Node {
    pub fn is_document(&self) -> bool {
        matches!(*self, Node::Document)
    }

    pub fn is_fragment(&self) -> bool {
        matches!(*self, Node::Fragment)
    }

    pub fn is_doctype(&self) -> bool {
        matches!(*self, Node::Doctype(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(*self, Node::Comment(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(*self, Node::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(*self, Node::Element(_))
    }

    pub fn as_text(&self) -> Option<&Text> {
        match *self {
            Node::Text(ref t) => Some(t),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match *self {
            Node::Comment(ref c) => Some(c),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match *self {
            Node::Element(ref e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match *self {
            Node::Element(ref mut e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Node::Document => write!(f, "Document"),
            Node::Fragment => write!(f, "Fragment"),
            Node::Doctype(ref d) => write!(f, "Doctype({:?})", d),
            Node::Comment(ref c) => write!(f, "Comment({:?})", c),
            Node::Text(ref t) => write!(f, "Text({:?})", t),
            Node::Element(ref e) => write!(f, "Element({:?})", e),
            Node::ProcessingInstruction(ref pi) => write!(f, "ProcessingInstruction({:?})", pi),
        }
    }
}

/// A doctype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub name: StrTendril,
    pub public_id: StrTendril,
    pub system_id: StrTendril,
}

impl Doctype {
    /// `<!DOCTYPE html>`.
    pub fn html() -> Self {
        Doctype {
            name: StrTendril::from_slice("html"),
            public_id: StrTendril::new(),
            system_id: StrTendril::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An HTML comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub comment: StrTendril,
}

impl Deref for Comment {
    type Target = str;

    fn deref(&self) -> &str {
        &self.comment
    }
}

/// HTML text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub text: StrTendril,
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text {
            text: StrTendril::from_slice(text),
        }
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

/// An HTML element.
///
/// Attributes keep their source order.
#[derive(Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualName,
    pub attrs: Vec<(QualName, StrTendril)>,
}

impl Element {
    pub fn new(name: QualName, attrs: Vec<Attribute>) -> Self {
        Element {
            name,
            attrs: attrs.into_iter().map(|a| (a.name, a.value)).collect(),
        }
    }

    /// Creates an attribute-less element in the HTML namespace.
    pub fn html(local: LocalName) -> Self {
        Element {
            name: QualName::new(None, ns!(html), local),
            attrs: Vec::new(),
        }
    }

    /// Returns the element's local name.
    pub fn name(&self) -> &str {
        &self.name.local
    }

    /// Returns the value of an attribute.
    pub fn attr(&self, attr: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name.ns == ns!() && &*name.local == attr)
            .map(|(_, value)| &**value)
    }

    /// Sets an attribute, replacing a previous value.
    pub fn set_attr(&mut self, attr: &str, value: &str) {
        let value = StrTendril::from_slice(value);
        match self
            .attrs
            .iter_mut()
            .find(|(name, _)| name.ns == ns!() && &*name.local == attr)
        {
            Some((_, old)) => *old = value,
            None => self
                .attrs
                .push((QualName::new(None, ns!(), LocalName::from(attr)), value)),
        }
    }

    /// Returns an iterator over the whitespace separated `class` tokens.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Renames the element, keeping it in the HTML namespace.
    pub fn rename(&mut self, local: LocalName) {
        self.name = QualName::new(None, ns!(html), local);
    }

    pub fn clear_attrs(&mut self) {
        self.attrs.clear();
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}", self.name())?;
        for (key, value) in &self.attrs {
            write!(f, " {}={:?}", key.local, value)?;
        }
        write!(f, ">")
    }
}

/// HTML Processing Instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub target: StrTendril,
    pub data: StrTendril,
}

#[cfg(test)]
mod tests {
    use super::Element;

    #[test]
    fn attr_set_and_replace() {
        let mut element = Element::html(local_name!("div"));
        element.set_attr("itemprop", "name");
        element.set_attr("itemprop", "articleBody");

        assert_eq!(Some("articleBody"), element.attr("itemprop"));
        assert_eq!(1, element.attrs.len());
    }

    #[test]
    fn class_tokens() {
        let mut element = Element::html(local_name!("div"));
        element.set_attr("class", "  main content\tarticle ");

        assert!(element.has_class("content"));
        assert!(!element.has_class("cont"));
        assert_eq!(3, element.classes().count());
    }

    #[test]
    fn rename_and_clear() {
        let mut element = Element::html(local_name!("h1"));
        element.set_attr("class", "headline");
        element.rename(local_name!("title"));
        element.clear_attrs();

        assert_eq!("title", element.name());
        assert!(element.attrs.is_empty());
    }
}
