use std::io::Error;

use html5ever::serialize::{Serialize, Serializer, TraversalScope};
use sitegrab_tree::iter::Edge;
use sitegrab_tree::{NodeId, Tree};

use crate::node::Node;

/// A subtree of an HTML tree, rooted at `id`.
pub(crate) struct Subtree<'a> {
    pub(crate) tree: &'a Tree<Node>,
    pub(crate) id: NodeId,
}

impl<'a> Serialize for Subtree<'a> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> Result<(), Error>
    where
        S: Serializer,
    {
        let children_only = traversal_scope == TraversalScope::ChildrenOnly(None);

        for edge in self.tree.traverse(self.id) {
            match edge {
                Edge::Open(node) => {
                    if node == self.id && children_only {
                        continue;
                    }

                    match self.tree.value(node) {
                        Some(Node::Doctype(doctype)) => serializer.write_doctype(doctype.name())?,
                        Some(Node::Comment(comment)) => serializer.write_comment(comment)?,
                        Some(Node::Text(text)) => serializer.write_text(text)?,
                        Some(Node::Element(elem)) => {
                            let attrs = elem.attrs.iter().map(|(k, v)| (k, &v[..]));
                            serializer.start_elem(elem.name.clone(), attrs)?
                        }
                        Some(Node::ProcessingInstruction(pi)) => {
                            serializer.write_processing_instruction(&pi.target, &pi.data)?
                        }
                        _ => {}
                    }
                }

                Edge::Close(node) => {
                    if node == self.id && children_only {
                        continue;
                    }

                    if let Some(elem) = self.tree.value(node).and_then(Node::as_element) {
                        serializer.end_elem(elem.name.clone())?;
                    }
                }
            }
        }

        Ok(())
    }
}
