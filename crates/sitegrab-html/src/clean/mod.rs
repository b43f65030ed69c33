//! Reduces an article page to a minimal `title + body` document.
//!
//! Cleaning runs in four steps over a single arena tree:
//!
//! 1. [`prune`] drops boilerplate subtrees (scripts, styles, forms, comments...).
//! 2. A [`Locate`] rule finds the title and body elements of the page.
//! 3. [`rebuild`] moves them under a fresh `html > head + body` skeleton, substituting
//!    placeholders for whatever was not found.
//! 4. The skeleton is serialized back to bytes.

mod rules;

use std::io;

use html5ever::LocalName;
use log::debug;
use sitegrab_tree::{NodeId, Tree};
use thiserror::Error;

pub use self::rules::{ContentClass, Itemprop};
use crate::html::Html;
use crate::node::{Element, Node, Text};

/// Tags whose whole subtree is dropped by [`prune`].
pub const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "meta", "head", "form", "noscript", "img", "noindex", "span",
];

pub const EMPTY_TITLE: &str = "Empty title";
pub const EMPTY_BODY: &str = "Empty body";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot parse page: {0}")]
    Parse(#[source] io::Error),

    #[error("cannot serialize cleaned page: {0}")]
    Serialize(#[source] io::Error),
}

/// Title and body elements found by a [`Locate`] rule.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub title: Option<NodeId>,
    pub body: Option<NodeId>,
}

impl Located {
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.body.is_some()
    }
}

/// A site-specific way of finding the article title and body in a pruned page.
pub trait Locate: Send + Sync {
    fn locate(&self, html: &Html) -> Located;
}

/// Output of [`rebuild`]. `adopted` holds the located elements that made it into the
/// document, placeholders are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rebuilt {
    pub document: NodeId,
    pub adopted: Located,
}

/// Output of [`clean`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub bytes: Vec<u8>,
    pub has_title: bool,
    pub has_body: bool,
}

fn is_boilerplate(node: &Node) -> bool {
    match node {
        Node::Comment(_) => true,
        Node::Element(e) => BOILERPLATE_TAGS.contains(&e.name()),
        _ => false,
    }
}

/// Removes every boilerplate subtree below `from`. Returns the number of removed subtrees.
pub fn prune(tree: &mut Tree<Node>, from: NodeId) -> usize {
    let mut removed = 0;
    let mut worklist = vec![from];

    while let Some(id) = worklist.pop() {
        let children = tree.children(id).collect::<Vec<_>>();
        for child in children {
            if tree.value(child).map_or(false, is_boilerplate) {
                tree.remove(child);
                removed += 1;
            } else {
                worklist.push(child);
            }
        }
    }

    removed
}

/// Builds `<html><head><meta charset="utf-8"><title/></head><body/></html>` out of the located
/// elements, as a new orphan document in the same tree.
///
/// Found elements lose their attributes and are renamed `title` and `body`. Missing ones are
/// replaced by placeholders.
pub fn rebuild(html: &mut Html, located: Located) -> Rebuilt {
    let tree = &mut html.tree;

    // An element cannot be both.
    let title = located.title.filter(|&t| Some(t) != located.body);

    let (title, title_adopted) = adopt(tree, title, local_name!("title"), EMPTY_TITLE);
    let (body, body_adopted) = adopt(tree, located.body, local_name!("body"), EMPTY_BODY);

    let document = tree.orphan(Node::Document);
    let root = tree.append(document, Node::Element(Element::html(local_name!("html"))));
    let head = tree.append(root, Node::Element(Element::html(local_name!("head"))));

    let mut charset = Element::html(local_name!("meta"));
    charset.set_attr("charset", "utf-8");
    tree.append(head, Node::Element(charset));

    tree.append_id(head, title);
    tree.append_id(root, body);

    Rebuilt {
        document,
        adopted: Located {
            title: title_adopted.then_some(title),
            body: body_adopted.then_some(body),
        },
    }
}

/// Detaches `found` and turns it into a bare `name` element, or creates a placeholder. The flag
/// is false for a placeholder.
fn adopt(
    tree: &mut Tree<Node>,
    found: Option<NodeId>,
    name: LocalName,
    placeholder: &str,
) -> (NodeId, bool) {
    if let Some(id) = found {
        if let Some(element) = tree.value_mut(id).and_then(Node::as_element_mut) {
            element.clear_attrs();
            element.rename(name);
            tree.detach(id);
            return (id, true);
        }
    }

    let id = tree.orphan(Node::Element(Element::html(name)));
    tree.append(id, Node::Text(Text::from(placeholder)));
    (id, false)
}

/// Parses `page`, prunes it, locates the article with `rule` and serializes the rebuilt
/// document.
pub fn clean(page: &[u8], rule: &dyn Locate) -> Result<Cleaned, ExtractError> {
    let mut html = Html::from_bytes(page).map_err(ExtractError::Parse)?;

    let root = html.tree.root();
    let pruned = prune(&mut html.tree, root);

    let located = rule.locate(&html);
    debug!(
        "Pruned {} subtrees, title found: {}, body found: {}",
        pruned,
        located.title.is_some(),
        located.body.is_some()
    );

    let Rebuilt { document, adopted } = rebuild(&mut html, located);
    let bytes = html
        .serialize_children(document)
        .map_err(ExtractError::Serialize)?;

    Ok(Cleaned {
        bytes,
        has_title: adopted.title.is_some(),
        has_body: adopted.body.is_some(),
    })
}
