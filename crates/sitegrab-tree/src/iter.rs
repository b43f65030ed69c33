use crate::{Node, NodeId, Tree};

/// Iterator that moves out of a tree in insert order.
#[derive(Debug)]
pub struct IntoIter<T>(slotmap::basic::IntoIter<NodeId, Node<T>>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_node_id, node)| node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for Tree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.sm.into_iter())
    }
}

/// Iterator over nodes in insert order, orphans included.
pub type Nodes<'a, T> = slotmap::basic::Iter<'a, NodeId, Node<T>>;

impl<T> Tree<T> {
    pub fn nodes(&self) -> Nodes<'_, T> {
        self.sm.iter()
    }
}

macro_rules! axis_iterators {
    ($(#[$m:meta] $i:ident($f:path);)*) => {
        $(
            #[$m]
            #[derive(Debug)]
            pub struct $i<'a, T> {
                tree: &'a Tree<T>,
                next: Option<NodeId>,
            }

            impl<'a, T> Clone for $i<'a, T> {
                fn clone(&self) -> Self {
                    Self { tree: self.tree, next: self.next }
                }
            }

            impl<'a, T> Iterator for $i<'a, T> {
                type Item = NodeId;

                fn next(&mut self) -> Option<Self::Item> {
                    let id = self.next.take()?;
                    self.next = $f(self.tree, id);
                    Some(id)
                }
            }
        )*
    };
}

axis_iterators! {
    /// Iterator over ancestors.
    Ancestors(Tree::parent);

    /// Iterator over previous siblings.
    PrevSiblings(Tree::prev_sibling);

    /// Iterator over next siblings.
    NextSiblings(Tree::next_sibling);

    /// Iterator over first children.
    FirstChildren(Tree::first_child);

    /// Iterator over last children.
    LastChildren(Tree::last_child);
}

/// Iterator over children.
#[derive(Debug)]
pub struct Children<'a, T> {
    tree: &'a Tree<T>,
    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl<'a, T> Clone for Children<'a, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T> Iterator for Children<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            let node = self.front.take();
            self.back = None;
            node
        } else {
            let node = self.front.take();
            self.front = node.and_then(|id| self.tree.next_sibling(id));
            node
        }
    }
}

impl<'a, T> DoubleEndedIterator for Children<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back == self.front {
            let node = self.back.take();
            self.front = None;
            node
        } else {
            let node = self.back.take();
            self.back = node.and_then(|id| self.tree.prev_sibling(id));
            node
        }
    }
}

/// Open or close edge of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Open.
    Open(NodeId),
    /// Close.
    Close(NodeId),
}

impl Edge {
    pub fn id(&self) -> NodeId {
        match *self {
            Edge::Open(id) | Edge::Close(id) => id,
        }
    }
}

/// Iterator which traverses a subtree.
#[derive(Debug)]
pub struct Traverse<'a, T> {
    tree: &'a Tree<T>,
    root: NodeId,
    edge: Option<Edge>,
    done: bool,
}

impl<'a, T> Clone for Traverse<'a, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            root: self.root,
            edge: self.edge,
            done: self.done,
        }
    }
}

impl<'a, T> Iterator for Traverse<'a, T> {
    type Item = Edge;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.edge = match self.edge {
            None if self.tree.contains(self.root) => Some(Edge::Open(self.root)),
            None => None,
            Some(Edge::Open(id)) => match self.tree.first_child(id) {
                Some(first_child) => Some(Edge::Open(first_child)),
                None => Some(Edge::Close(id)),
            },
            Some(Edge::Close(id)) => {
                if id == self.root {
                    None
                } else if let Some(next_sibling) = self.tree.next_sibling(id) {
                    Some(Edge::Open(next_sibling))
                } else {
                    self.tree.parent(id).map(Edge::Close)
                }
            }
        };

        if self.edge.is_none() {
            self.done = true;
        }
        self.edge
    }
}

/// Iterator over a node and its descendants.
#[derive(Debug)]
pub struct Descendants<'a, T>(Traverse<'a, T>);

impl<'a, T> Clone for Descendants<'a, T> {
    fn clone(&self) -> Self {
        Descendants(self.0.clone())
    }
}

impl<'a, T> Iterator for Descendants<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        for edge in &mut self.0 {
            if let Edge::Open(id) = edge {
                return Some(id);
            }
        }
        None
    }
}

impl<T> Tree<T> {
    /// Returns an iterator over ancestors.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Returns an iterator over previous siblings.
    pub fn prev_siblings(&self, id: NodeId) -> PrevSiblings<'_, T> {
        PrevSiblings {
            tree: self,
            next: self.prev_sibling(id),
        }
    }

    /// Returns an iterator over next siblings.
    pub fn next_siblings(&self, id: NodeId) -> NextSiblings<'_, T> {
        NextSiblings {
            tree: self,
            next: self.next_sibling(id),
        }
    }

    /// Returns an iterator over first children.
    pub fn first_children(&self, id: NodeId) -> FirstChildren<'_, T> {
        FirstChildren {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Returns an iterator over last children.
    pub fn last_children(&self, id: NodeId) -> LastChildren<'_, T> {
        LastChildren {
            tree: self,
            next: self.last_child(id),
        }
    }

    /// Returns an iterator over children.
    pub fn children(&self, id: NodeId) -> Children<'_, T> {
        Children {
            tree: self,
            front: self.first_child(id),
            back: self.last_child(id),
        }
    }

    /// Returns an iterator which traverses the subtree starting at `id`.
    pub fn traverse(&self, id: NodeId) -> Traverse<'_, T> {
        Traverse {
            tree: self,
            root: id,
            edge: None,
            done: false,
        }
    }

    /// Returns an iterator over `id` and its descendants, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_, T> {
        Descendants(self.traverse(id))
    }
}
