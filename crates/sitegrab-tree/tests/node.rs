use sitegrab_tree::{tree, Tree};

fn children(tree: &Tree<char>, id: sitegrab_tree::NodeId) -> Vec<char> {
    tree.children(id)
        .filter_map(|c| tree.value(c).copied())
        .collect()
}

#[test]
fn node_value() {
    let tree = tree!('a');
    assert_eq!(Some(&'a'), tree.value(tree.root()));
}

#[test]
fn node_parent() {
    let tree = tree!('a' => { 'b' });
    let b = tree.first_child(tree.root()).unwrap();
    assert_eq!(Some(tree.root()), tree.parent(b));
}

#[test]
fn node_siblings() {
    let tree = tree!('a' => { 'b', 'c' });
    let b = tree.first_child(tree.root()).unwrap();
    let c = tree.last_child(tree.root()).unwrap();

    assert_eq!(Some(b), tree.prev_sibling(c));
    assert_eq!(Some(c), tree.next_sibling(b));
}

#[test]
fn node_has_siblings() {
    let tree = tree!('a' => { 'b', 'c' });
    assert!(!tree.has_siblings(tree.root()));
    assert!(tree.has_siblings(tree.first_child(tree.root()).unwrap()));
}

#[test]
fn node_has_children() {
    let tree = tree!('a' => { 'b', 'c' });
    assert!(tree.has_children(tree.root()));
    assert!(!tree.has_children(tree.first_child(tree.root()).unwrap()));
}

////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn append_3() {
    let mut tree = tree!('a');
    let root = tree.root();
    let b = tree.append(root, 'b');
    let c = tree.append(root, 'c');
    let d = tree.append(root, 'd');

    assert_eq!(Some(b), tree.first_child(root));
    assert_eq!(Some(d), tree.last_child(root));
    assert_eq!(None, tree.prev_sibling(b));
    assert_eq!(Some(c), tree.next_sibling(b));
    assert_eq!(Some(b), tree.prev_sibling(c));
    assert_eq!(Some(d), tree.next_sibling(c));
    assert_eq!(Some(c), tree.prev_sibling(d));
    assert_eq!(None, tree.next_sibling(d));
    assert_eq!(vec!['b', 'c', 'd'], children(&tree, root));
}

#[test]
fn prepend_3() {
    let mut tree = tree!('a');
    let root = tree.root();
    tree.prepend(root, 'd');
    tree.prepend(root, 'c');
    tree.prepend(root, 'b');

    assert_eq!(vec!['b', 'c', 'd'], children(&tree, root));
    let d = tree.last_child(root).unwrap();
    assert_eq!(Some(&'c'), tree.prev_sibling(d).and_then(|c| tree.value(c)));
}

#[test]
fn insert_before_first() {
    let mut tree = tree!('a' => { 'c' });
    let root = tree.root();
    let c = tree.first_child(root).unwrap();
    let b = tree.insert_before(c, 'b').unwrap();

    assert_eq!(Some(b), tree.first_child(root));
    assert_eq!(Some(root), tree.parent(b));
    assert_eq!(vec!['b', 'c'], children(&tree, root));
}

#[test]
fn insert_after_last() {
    let mut tree = tree!('a' => { 'b' });
    let root = tree.root();
    let b = tree.first_child(root).unwrap();
    let c = tree.insert_after(b, 'c').unwrap();

    assert_eq!(Some(c), tree.last_child(root));
    assert_eq!(vec!['b', 'c'], children(&tree, root));
}

#[test]
fn insert_next_to_root_is_refused() {
    let mut tree = tree!('a');
    let root = tree.root();

    assert_eq!(None, tree.insert_before(root, 'z'));
    assert_eq!(None, tree.insert_after(root, 'z'));
}

#[test]
fn detach_middle() {
    let mut tree = tree!('a' => { 'b', 'c', 'd' });
    let root = tree.root();
    let c = tree.children(root).nth(1).unwrap();
    tree.detach(c);

    assert!(tree.parent(c).is_none());
    assert!(tree.prev_sibling(c).is_none());
    assert!(tree.next_sibling(c).is_none());
    assert!(tree.contains(c));
    assert_eq!(vec!['b', 'd'], children(&tree, root));
}

#[test]
fn detach_only_child() {
    let mut tree = tree!('a' => { 'b' });
    let root = tree.root();
    let b = tree.first_child(root).unwrap();
    tree.detach(b);

    assert!(!tree.has_children(root));
    assert_eq!(None, tree.last_child(root));
}

#[test]
fn append_id_moves_subtree() {
    let mut tree = tree! {
        'a' => {
            'b' => { 'c' },
            'd',
        }
    };
    let root = tree.root();
    let b = tree.first_child(root).unwrap();
    let d = tree.last_child(root).unwrap();

    assert_eq!(Some(b), tree.append_id(d, b));
    assert_eq!(vec!['d'], children(&tree, root));
    assert_eq!(vec!['b'], children(&tree, d));
    assert_eq!(vec!['c'], children(&tree, b));
    assert_eq!(Some(d), tree.parent(b));
}

#[test]
fn append_id_refuses_cycles() {
    let mut tree = tree!('a' => { 'b' => { 'c' } });
    let root = tree.root();
    let b = tree.first_child(root).unwrap();
    let c = tree.first_child(b).unwrap();

    assert_eq!(None, tree.append_id(c, b));
    assert_eq!(None, tree.append_id(b, b));
    assert_eq!(Some(b), tree.parent(c));
    assert_eq!(Some(root), tree.parent(b));
}

#[test]
fn remove_drops_subtree() {
    let mut tree = tree!('a' => { 'b' => { 'c', 'd' }, 'e' });
    let root = tree.root();
    let b = tree.first_child(root).unwrap();
    let c = tree.first_child(b).unwrap();

    assert_eq!(Some('b'), tree.remove(b));
    assert!(!tree.contains(b));
    assert!(!tree.contains(c));
    assert_eq!(2, tree.node_count());
    assert_eq!(vec!['e'], children(&tree, root));
}

#[test]
fn remove_root_is_refused() {
    let mut tree = tree!('a' => { 'b' });
    let root = tree.root();

    assert_eq!(None, tree.remove(root));
    assert_eq!(2, tree.node_count());
}

#[test]
fn reparent_from_id_append() {
    let mut tree = tree! {
        'a' => {
            'b' => { 'c', 'd' },
            'e' => { 'f', 'g' },
        }
    };
    let root = tree.root();
    let b = tree.first_child(root).unwrap();
    let e = tree.last_child(root).unwrap();
    tree.reparent_from_id_append(b, e);

    assert!(!tree.has_children(e));
    assert_eq!(vec!['c', 'd', 'f', 'g'], children(&tree, b));
}
