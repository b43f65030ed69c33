//! [SlotMap](https://crates.io/crates/slotmap)-backed ID-tree.
//!
//! Every node lives in one arena and is addressed by a [`NodeId`]. Links between nodes are
//! plain ids, so moving a subtree is detaching its id and appending it under another parent.
//! A node always has at most one parent: attaching a node first unlinks it from wherever it
//! was, and attaching a node below itself is refused.

pub mod iter;

use slotmap::{new_key_type, Key, SlotMap};

new_key_type! {
    pub struct NodeId;
}

/// Slotmap-backed ID-tree.
///
/// Always contains at least a root node.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    root: NodeId,
    sm: SlotMap<NodeId, Node<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
    parent: NodeId,
    prev_sibling: NodeId,
    next_sibling: NodeId,
    children: (NodeId, NodeId),
    value: T,
}

fn non_null(id: NodeId) -> Option<NodeId> {
    if id.is_null() {
        None
    } else {
        Some(id)
    }
}

impl<T> Node<T> {
    fn new(value: T) -> Self {
        Node {
            parent: NodeId::null(),
            prev_sibling: NodeId::null(),
            next_sibling: NodeId::null(),
            children: (NodeId::null(), NodeId::null()),
            value,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        non_null(self.parent)
    }

    pub fn prev_sibling(&self) -> Option<NodeId> {
        non_null(self.prev_sibling)
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        non_null(self.next_sibling)
    }

    pub fn first_child(&self) -> Option<NodeId> {
        non_null(self.children.0)
    }

    pub fn last_child(&self) -> Option<NodeId> {
        non_null(self.children.1)
    }
}

impl<T> PartialEq for Tree<T>
where
    T: PartialEq,
{
    /// Two trees are equal when they have the same shape and values, orphans excluded.
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.traverse(self.root);
        let mut right = other.traverse(other.root);
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    let same_edge = matches!(
                        (a, b),
                        (iter::Edge::Open(_), iter::Edge::Open(_))
                            | (iter::Edge::Close(_), iter::Edge::Close(_))
                    );
                    if !same_edge || self.value(a.id()) != other.value(b.id()) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl<T> Tree<T> {
    /// Creates a tree with a root node.
    pub fn new(root: T) -> Self {
        let mut sm = SlotMap::with_key();
        let root = sm.insert(Node::new(root));
        Tree { root, sm }
    }

    /// Creates a tree with a root node and the specified capacity.
    pub fn with_capacity(root: T, capacity: usize) -> Self {
        let mut sm = SlotMap::with_capacity_and_key(capacity);
        let root = sm.insert(Node::new(root));
        Tree { root, sm }
    }

    /// Returns the ID of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes held by the arena, orphans included.
    pub fn node_count(&self) -> usize {
        self.sm.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.sm.contains_key(id)
    }

    /// Returns a reference to the specified node.
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.sm.get(id)
    }

    /// Returns a mutable reference to the specified node.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.sm.get_mut(id)
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.sm.get(id).map(Node::value)
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.sm.get_mut(id).map(Node::value_mut)
    }

    /// Creates an orphan node.
    pub fn orphan(&mut self, value: T) -> NodeId {
        self.sm.insert(Node::new(value))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::prev_sibling)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::next_sibling)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::last_child)
    }

    /// Returns true if this node has siblings.
    pub fn has_siblings(&self, id: NodeId) -> bool {
        self.get(id)
            .map(|node| !node.prev_sibling.is_null() || !node.next_sibling.is_null())
            .unwrap_or(false)
    }

    /// Returns true if this node has children.
    pub fn has_children(&self, id: NodeId) -> bool {
        self.get(id)
            .map(|node| !node.children.0.is_null())
            .unwrap_or(false)
    }

    /// Returns true if `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Detaches a node (and its subtree) from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let (parent_id, prev_id, next_id) = match self.sm.get_mut(id) {
            Some(node) if !node.parent.is_null() => {
                let links = (node.parent, node.prev_sibling, node.next_sibling);
                node.parent = NodeId::null();
                node.prev_sibling = NodeId::null();
                node.next_sibling = NodeId::null();
                links
            }
            _ => return,
        };

        if let Some(prev) = self.sm.get_mut(prev_id) {
            prev.next_sibling = next_id;
        }
        if let Some(next) = self.sm.get_mut(next_id) {
            next.prev_sibling = prev_id;
        }
        if let Some(parent) = self.sm.get_mut(parent_id) {
            if parent.children.0 == id {
                parent.children.0 = next_id;
            }
            if parent.children.1 == id {
                parent.children.1 = prev_id;
            }
        }
    }

    /// Detaches a node and drops it together with its whole subtree.
    ///
    /// Returns the value of the removed node. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        if id == self.root || !self.sm.contains_key(id) {
            return None;
        }
        self.detach(id);

        let mut removed = None;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            if let Some(node) = self.sm.remove(current) {
                if current == id {
                    removed = Some(node.value);
                }
            }
        }
        removed
    }

    /// Appends a new child to `parent`.
    ///
    /// If `parent` does not exist the new node stays an orphan.
    pub fn append(&mut self, parent: NodeId, value: T) -> NodeId {
        let child = self.orphan(value);
        self.append_id(parent, child);
        child
    }

    /// Moves `child` (with its subtree) to the end of `parent`'s children.
    ///
    /// Returns `None` when either node is missing or when `child` is `parent` or one of its
    /// ancestors.
    pub fn append_id(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        if !self.sm.contains_key(parent)
            || !self.sm.contains_key(child)
            || self.is_ancestor_or_self(child, parent)
        {
            return None;
        }
        self.detach(child);

        let last_id = self.sm[parent].children.1;
        {
            let node = &mut self.sm[child];
            node.parent = parent;
            node.prev_sibling = last_id;
        }
        if let Some(last) = self.sm.get_mut(last_id) {
            last.next_sibling = child;
        }
        let parent = &mut self.sm[parent];
        if parent.children.0.is_null() {
            parent.children.0 = child;
        }
        parent.children.1 = child;

        Some(child)
    }

    /// Prepends a new child to `parent`.
    pub fn prepend(&mut self, parent: NodeId, value: T) -> NodeId {
        let child = self.orphan(value);
        self.prepend_id(parent, child);
        child
    }

    /// Moves `child` (with its subtree) to the front of `parent`'s children.
    pub fn prepend_id(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        if !self.sm.contains_key(parent)
            || !self.sm.contains_key(child)
            || self.is_ancestor_or_self(child, parent)
        {
            return None;
        }
        self.detach(child);

        let first_id = self.sm[parent].children.0;
        {
            let node = &mut self.sm[child];
            node.parent = parent;
            node.next_sibling = first_id;
        }
        if let Some(first) = self.sm.get_mut(first_id) {
            first.prev_sibling = child;
        }
        let parent = &mut self.sm[parent];
        if parent.children.1.is_null() {
            parent.children.1 = child;
        }
        parent.children.0 = child;

        Some(child)
    }

    /// Inserts a new sibling before `sibling`. Returns `None` if `sibling` has no parent.
    pub fn insert_before(&mut self, sibling: NodeId, value: T) -> Option<NodeId> {
        self.parent(sibling)?;
        let new_sibling = self.orphan(value);
        self.insert_id_before(sibling, new_sibling)
    }

    /// Moves `new_sibling` right before `sibling`.
    pub fn insert_id_before(&mut self, sibling: NodeId, new_sibling: NodeId) -> Option<NodeId> {
        if !self.sm.contains_key(new_sibling) || self.is_ancestor_or_self(new_sibling, sibling) {
            return None;
        }
        let parent_id = self.parent(sibling)?;
        self.detach(new_sibling);

        let prev_id = self.sm[sibling].prev_sibling;
        {
            let node = &mut self.sm[new_sibling];
            node.parent = parent_id;
            node.prev_sibling = prev_id;
            node.next_sibling = sibling;
        }
        if let Some(prev) = self.sm.get_mut(prev_id) {
            prev.next_sibling = new_sibling;
        }
        self.sm[sibling].prev_sibling = new_sibling;
        let parent = &mut self.sm[parent_id];
        if parent.children.0 == sibling {
            parent.children.0 = new_sibling;
        }

        Some(new_sibling)
    }

    /// Inserts a new sibling after `sibling`. Returns `None` if `sibling` has no parent.
    pub fn insert_after(&mut self, sibling: NodeId, value: T) -> Option<NodeId> {
        self.parent(sibling)?;
        let new_sibling = self.orphan(value);
        self.insert_id_after(sibling, new_sibling)
    }

    /// Moves `new_sibling` right after `sibling`.
    pub fn insert_id_after(&mut self, sibling: NodeId, new_sibling: NodeId) -> Option<NodeId> {
        if !self.sm.contains_key(new_sibling) || self.is_ancestor_or_self(new_sibling, sibling) {
            return None;
        }
        let parent_id = self.parent(sibling)?;
        self.detach(new_sibling);

        let next_id = self.sm[sibling].next_sibling;
        {
            let node = &mut self.sm[new_sibling];
            node.parent = parent_id;
            node.prev_sibling = sibling;
            node.next_sibling = next_id;
        }
        if let Some(next) = self.sm.get_mut(next_id) {
            next.prev_sibling = new_sibling;
        }
        self.sm[sibling].next_sibling = new_sibling;
        let parent = &mut self.sm[parent_id];
        if parent.children.1 == sibling {
            parent.children.1 = new_sibling;
        }

        Some(new_sibling)
    }

    /// Moves every child of `from` to the end of `parent`'s children, keeping their order.
    pub fn reparent_from_id_append(&mut self, parent: NodeId, from: NodeId) {
        let moved = self.children(from).collect::<Vec<_>>();
        for child in moved {
            self.append_id(parent, child);
        }
    }
}

/// Creates a tree from expressions.
///
/// # Examples
///
/// ```
/// # use sitegrab_tree::tree;
/// # fn main() {
/// let tree = tree!("root");
/// # }
/// ```
///
/// ```
/// # use sitegrab_tree::tree;
/// # fn main() {
/// let tree = tree! {
///     "root" => {
///         "child a",
///         "child b" => {
///             "grandchild a",
///             "grandchild b",
///         },
///         "child c",
///     }
/// };
/// # }
/// ```
#[macro_export]
macro_rules! tree {
    (@ $t:ident, $n:expr, { }) => { };

    // Last leaf.
    (@ $t:ident, $n:expr, { $value:expr }) => {
        { $t.append($n, $value); }
    };

    // Leaf.
    (@ $t:ident, $n:expr, { $value:expr, $($tail:tt)* }) => {
        {
            $t.append($n, $value);
            $crate::tree!(@ $t, $n, { $($tail)* });
        }
    };

    // Last node with children.
    (@ $t:ident, $n:expr, { $value:expr => $children:tt }) => {
        {
            let node = $t.append($n, $value);
            $crate::tree!(@ $t, node, $children);
        }
    };

    // Node with children.
    (@ $t:ident, $n:expr, { $value:expr => $children:tt, $($tail:tt)* }) => {
        {
            {
                let node = $t.append($n, $value);
                $crate::tree!(@ $t, node, $children);
            }
            $crate::tree!(@ $t, $n, { $($tail)* });
        }
    };

    ($root:expr) => { $crate::Tree::new($root) };

    ($root:expr => $children:tt) => {
        {
            let mut tree = $crate::Tree::new($root);
            {
                let root = tree.root();
                $crate::tree!(@ tree, root, $children);
            }
            tree
        }
    };
}
