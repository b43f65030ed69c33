//! HTML documents.

mod serializable;
mod tree_sink;

use std::borrow::Cow;
use std::io;

use html5ever::driver;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tree_builder::QuirksMode;
use sitegrab_tree::{NodeId, Tree};
use tendril::TendrilSink;

use self::serializable::Subtree;
use crate::node::{Element, Node};

/// An HTML tree.
///
/// Parsing does not fail hard. Instead, the `quirks_mode` is set and errors are added to the
/// `errors` field. The `tree` will still be populated as best as possible.
///
/// Implements the `TreeSink` trait from the `html5ever` crate, which allows HTML to be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Html {
    /// Parse errors.
    pub errors: Vec<Cow<'static, str>>,

    /// The quirks mode.
    pub quirks_mode: QuirksMode,

    /// The node tree.
    pub tree: Tree<Node>,
}

impl Html {
    /// Creates an empty HTML document.
    pub fn new_document() -> Self {
        Html {
            errors: Vec::new(),
            quirks_mode: QuirksMode::NoQuirks,
            tree: Tree::new(Node::Document),
        }
    }

    /// Parses a string of HTML as a document.
    pub fn parse_document(document: &str) -> Self {
        let parser = driver::parse_document(Self::new_document(), Default::default());
        parser.one(document)
    }

    /// Parses raw bytes as a UTF-8 document. Invalid sequences are replaced, never rejected.
    pub fn from_bytes(mut bytes: &[u8]) -> io::Result<Self> {
        driver::parse_document(Self::new_document(), Default::default())
            .from_utf8()
            .read_from(&mut bytes)
    }

    /// Returns the root `<html>` element, if any.
    pub fn root_element(&self) -> Option<NodeId> {
        let root = self.tree.root();
        self.tree
            .children(root)
            .find(|&child| self.tree.value(child).map_or(false, Node::is_element))
    }

    /// Returns the element at `id`.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.tree.value(id).and_then(Node::as_element)
    }

    /// Returns the concatenated text of `id` and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        self.tree
            .descendants(id)
            .filter_map(|d| self.tree.value(d).and_then(Node::as_text))
            .fold(String::new(), |mut acc, t| {
                acc.push_str(t);
                acc
            })
    }

    /// Serializes `id` and its subtree.
    pub fn html(&self, id: NodeId) -> io::Result<String> {
        self.serialize_scoped(id, TraversalScope::IncludeNode)
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> io::Result<String> {
        self.serialize_children(id)
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
    }

    /// Serializes the children of `id` to UTF-8 bytes.
    ///
    /// Serializing the children of a `Document` node yields the whole document.
    pub fn serialize_children(&self, id: NodeId) -> io::Result<Vec<u8>> {
        self.serialize_scoped(id, TraversalScope::ChildrenOnly(None))
    }

    fn serialize_scoped(&self, id: NodeId, traversal_scope: TraversalScope) -> io::Result<Vec<u8>> {
        let opts = SerializeOpts {
            scripting_enabled: false,
            traversal_scope,
            create_missing_parent: false,
        };
        let mut buf = Vec::new();
        serialize(
            &mut buf,
            &Subtree {
                tree: &self.tree,
                id,
            },
            opts,
        )?;
        Ok(buf)
    }
}
