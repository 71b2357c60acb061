//! RedBlackTree - color-balanced binary search tree with parent links
//!
//! A shared sentinel stands in for every absent child and for the parent of
//! the root. It is always black and is addressed by the reserved handle
//! `NodeId::NIL`. Delete-fixup may write the sentinel's parent link, so it is
//! kept as a real link record rather than an `Option`.
//!
//! Inserting a key that is already present fails with
//! [`LexmapError::AlreadyExists`].

use super::arena::{Arena, NodeId};
use super::comparator::{Comparator, NaturalOrder};
use super::{draw_sideways, Direction};
use crate::error::{LexmapError, Result};
use crate::statistics::{OpCounters, OpStats};
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

const NIL: NodeId = NodeId::NIL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy)]
struct Links {
    parent: NodeId,
    left: NodeId,
    right: NodeId,
    color: Color,
}

impl Links {
    const SENTINEL: Links = Links {
        parent: NIL,
        left: NIL,
        right: NIL,
        color: Color::Black,
    };
}

struct Node<K, V> {
    key: K,
    value: V,
    links: Links,
}

/// Red-Black ordered map
pub struct RedBlackTree<K, V, C = NaturalOrder> {
    nodes: Arena<Node<K, V>>,
    nil: Links,
    root: NodeId,
    comparator: C,
    counters: OpCounters,
}

impl<K: Ord, V> RedBlackTree<K, V, NaturalOrder> {
    /// Create an empty tree ordered by `K: Ord`
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Ord, V> Default for RedBlackTree<K, V, NaturalOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> RedBlackTree<K, V, C>
where
    C: Comparator<K>,
{
    /// Create an empty tree ordered by `comparator`
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            nodes: Arena::new(),
            nil: Links::SENTINEL,
            root: NIL,
            comparator,
            counters: OpCounters::new(),
        }
    }

    /// Insert `key -> value`; `AlreadyExists` if `key` is present
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let mut parent = NIL;
        let mut current = self.root;
        let mut side = Ordering::Equal;
        while current != NIL {
            parent = current;
            self.counters.compare();
            side = self.comparator.compare(&key, &self.nodes[current].key);
            current = match side {
                Ordering::Less => self.left(current),
                Ordering::Greater => self.right(current),
                Ordering::Equal => return Err(LexmapError::already_exists()),
            };
        }

        let id = self.nodes.alloc(Node {
            key,
            value,
            links: Links {
                parent,
                left: NIL,
                right: NIL,
                color: Color::Red,
            },
        });
        if parent == NIL {
            self.root = id;
        } else if side == Ordering::Less {
            self.links_mut(parent).left = id;
        } else {
            self.links_mut(parent).right = id;
        }
        self.insert_fixup(id);
        Ok(())
    }

    /// Remove `key`, returning its value; `None` if absent
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let target = self.find(key)?;

        // Node actually unlinked: the target itself, or its successor
        let spliced = if self.left(target) == NIL || self.right(target) == NIL {
            target
        } else {
            self.minimum(self.right(target))
        };
        let child = if self.left(spliced) != NIL {
            self.left(spliced)
        } else {
            self.right(spliced)
        };

        let parent = self.parent(spliced);
        self.links_mut(child).parent = parent;
        if parent == NIL {
            self.root = child;
        } else if spliced == self.left(parent) {
            self.links_mut(parent).left = child;
        } else {
            self.links_mut(parent).right = child;
        }

        let spliced_color = self.color(spliced);
        let node = self.nodes.release(spliced)?;
        let value = if spliced != target {
            let kept = &mut self.nodes[target];
            kept.key = node.key;
            std::mem::replace(&mut kept.value, node.value)
        } else {
            node.value
        };

        if spliced_color == Color::Black {
            self.delete_fixup(child);
        }
        Some(value)
    }

    /// Check whether `key` is stored
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Value stored under `key`
    pub fn search(&self, key: &K) -> Result<&V> {
        self.find(key)
            .map(|id| &self.nodes[id].value)
            .ok_or(LexmapError::KeyNotFound)
    }

    /// Alias of [`search`](Self::search)
    pub fn get(&self, key: &K) -> Result<&V> {
        self.search(key)
    }

    /// Mutable value stored under `key`
    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let id = self.find(key).ok_or(LexmapError::KeyNotFound)?;
        Ok(&mut self.nodes[id].value)
    }

    /// Check the color rules, black heights, parent links and key order.
    ///
    /// Returns the black height (black nodes on any root-to-leaf path).
    pub fn verify_invariants(&self) -> Result<usize> {
        if self.nil.color != Color::Black {
            return Err(LexmapError::corrupted("sentinel is not black"));
        }
        if self.root != NIL {
            if self.color(self.root) != Color::Black {
                return Err(LexmapError::corrupted("root is not black"));
            }
            if self.parent(self.root) != NIL {
                return Err(LexmapError::corrupted("root has a parent"));
            }
        }
        let mut checked = 0;
        let black_height = self.verify_subtree(self.root, NIL, NIL, &mut checked)?;
        if checked != self.nodes.len() {
            return Err(LexmapError::corrupted(format!(
                "{} nodes reachable from the root, {} allocated",
                checked,
                self.nodes.len()
            )));
        }
        Ok(black_height)
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root;
        while current != NIL {
            self.counters.compare();
            current = match self.comparator.compare(key, &self.nodes[current].key) {
                Ordering::Less => self.left(current),
                Ordering::Greater => self.right(current),
                Ordering::Equal => return Some(current),
            };
        }
        None
    }

    fn insert_fixup(&mut self, mut node: NodeId) {
        while self.color(self.parent(node)) == Color::Red {
            let parent = self.parent(node);
            let grandparent = self.parent(parent);
            if parent == self.left(grandparent) {
                let uncle = self.right(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.right(parent) {
                        node = parent;
                        self.rotate_left(node);
                    }
                    let parent = self.parent(node);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.left(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.left(parent) {
                        node = parent;
                        self.rotate_right(node);
                    }
                    let parent = self.parent(node);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    fn delete_fixup(&mut self, mut node: NodeId) {
        while node != self.root && self.color(node) == Color::Black {
            let parent = self.parent(node);
            if node == self.left(parent) {
                let mut sibling = self.right(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.right(self.parent(node));
                }
                if self.color(self.left(sibling)) == Color::Black
                    && self.color(self.right(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    node = self.parent(node);
                } else {
                    if self.color(self.right(sibling)) == Color::Black {
                        let near = self.left(sibling);
                        self.set_color(near, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.right(self.parent(node));
                    }
                    let parent = self.parent(node);
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    let far = self.right(sibling);
                    self.set_color(far, Color::Black);
                    self.rotate_left(parent);
                    node = self.root;
                }
            } else {
                let mut sibling = self.left(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.left(self.parent(node));
                }
                if self.color(self.right(sibling)) == Color::Black
                    && self.color(self.left(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    node = self.parent(node);
                } else {
                    if self.color(self.left(sibling)) == Color::Black {
                        let near = self.right(sibling);
                        self.set_color(near, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.left(self.parent(node));
                    }
                    let parent = self.parent(node);
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    let far = self.left(sibling);
                    self.set_color(far, Color::Black);
                    self.rotate_right(parent);
                    node = self.root;
                }
            }
        }
        self.set_color(node, Color::Black);
    }

    fn verify_subtree(
        &self,
        id: NodeId,
        lower: NodeId,
        upper: NodeId,
        checked: &mut usize,
    ) -> Result<usize> {
        if id == NIL {
            return Ok(0);
        }
        *checked += 1;
        let key = &self.nodes[id].key;
        if (lower != NIL && self.comparator.compare(&self.nodes[lower].key, key) != Ordering::Less)
            || (upper != NIL
                && self.comparator.compare(key, &self.nodes[upper].key) != Ordering::Less)
        {
            return Err(LexmapError::corrupted(format!("node {} out of key order", id)));
        }

        let (left, right) = (self.left(id), self.right(id));
        for child in [left, right] {
            if child == NIL {
                continue;
            }
            if self.parent(child) != id {
                return Err(LexmapError::corrupted(format!(
                    "node {} does not point back to parent {}",
                    child, id
                )));
            }
            if self.color(id) == Color::Red && self.color(child) == Color::Red {
                return Err(LexmapError::corrupted(format!(
                    "red node {} has red child {}",
                    id, child
                )));
            }
        }

        let left_height = self.verify_subtree(left, lower, id, checked)?;
        let right_height = self.verify_subtree(right, id, upper, checked)?;
        if left_height != right_height {
            return Err(LexmapError::corrupted(format!(
                "node {} has black heights {} and {}",
                id, left_height, right_height
            )));
        }
        Ok(left_height + usize::from(self.color(id) == Color::Black))
    }
}

impl<K, V, C> RedBlackTree<K, V, C> {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Nodes on the longest root-to-leaf path; 0 when empty
    pub fn height(&self) -> usize {
        self.depth(self.root)
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nil = Links::SENTINEL;
        self.root = NIL;
        log::trace!("Red-black tree cleared");
    }

    /// Entries in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter::new(self, Direction::Ascending)
    }

    /// Entries in descending key order
    pub fn iter_desc(&self) -> Iter<'_, K, V, C> {
        Iter::new(self, Direction::Descending)
    }

    /// Smallest entry
    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Largest entry
    pub fn last(&self) -> Option<(&K, &V)> {
        self.iter_desc().next()
    }

    /// Key comparisons performed so far
    pub fn comparisons(&self) -> u64 {
        self.counters.comparisons()
    }

    /// Rotations performed so far
    pub fn rotations(&self) -> u64 {
        self.counters.rotations()
    }

    /// Snapshot of all counters
    pub fn stats(&self) -> OpStats {
        self.counters.snapshot()
    }

    fn links(&self, id: NodeId) -> &Links {
        if id == NIL {
            &self.nil
        } else {
            &self.nodes[id].links
        }
    }

    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        if id == NIL {
            &mut self.nil
        } else {
            &mut self.nodes[id].links
        }
    }

    #[inline]
    fn left(&self, id: NodeId) -> NodeId {
        self.links(id).left
    }

    #[inline]
    fn right(&self, id: NodeId) -> NodeId {
        self.links(id).right
    }

    #[inline]
    fn parent(&self, id: NodeId) -> NodeId {
        self.links(id).parent
    }

    #[inline]
    fn color(&self, id: NodeId) -> Color {
        self.links(id).color
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        // The sentinel stays black
        if id != NIL {
            self.links_mut(id).color = color;
        }
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while self.left(id) != NIL {
            id = self.left(id);
        }
        id
    }

    fn maximum(&self, mut id: NodeId) -> NodeId {
        while self.right(id) != NIL {
            id = self.right(id);
        }
        id
    }

    fn successor(&self, mut id: NodeId) -> NodeId {
        if self.right(id) != NIL {
            return self.minimum(self.right(id));
        }
        let mut parent = self.parent(id);
        while parent != NIL && id == self.right(parent) {
            id = parent;
            parent = self.parent(parent);
        }
        parent
    }

    fn predecessor(&self, mut id: NodeId) -> NodeId {
        if self.left(id) != NIL {
            return self.maximum(self.left(id));
        }
        let mut parent = self.parent(id);
        while parent != NIL && id == self.left(parent) {
            id = parent;
            parent = self.parent(parent);
        }
        parent
    }

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        let inner = self.left(y);
        self.links_mut(x).right = inner;
        if inner != NIL {
            self.links_mut(inner).parent = x;
        }
        let parent = self.parent(x);
        self.links_mut(y).parent = parent;
        if parent == NIL {
            self.root = y;
        } else if x == self.left(parent) {
            self.links_mut(parent).left = y;
        } else {
            self.links_mut(parent).right = y;
        }
        self.links_mut(y).left = x;
        self.links_mut(x).parent = y;
        self.counters.rotate();
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left(x);
        let inner = self.right(y);
        self.links_mut(x).left = inner;
        if inner != NIL {
            self.links_mut(inner).parent = x;
        }
        let parent = self.parent(x);
        self.links_mut(y).parent = parent;
        if parent == NIL {
            self.root = y;
        } else if x == self.right(parent) {
            self.links_mut(parent).right = y;
        } else {
            self.links_mut(parent).left = y;
        }
        self.links_mut(y).right = x;
        self.links_mut(x).parent = y;
        self.counters.rotate();
    }

    fn depth(&self, id: NodeId) -> usize {
        if id == NIL {
            0
        } else {
            1 + self.depth(self.left(id)).max(self.depth(self.right(id)))
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for RedBlackTree<K, V, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::with_comparator(C::default());
        tree.extend(iter);
        tree
    }
}

/// Later duplicates are skipped; the first value for a key is kept
impl<K, V, C> Extend<(K, V)> for RedBlackTree<K, V, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = self.insert(key, value);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a RedBlackTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for RedBlackTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Sideways drawing; red nodes are marked with a trailing `*`
impl<K: fmt::Display, V: fmt::Display, C> fmt::Display for RedBlackTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = |id: NodeId| (id != NIL).then_some(id);
        draw_sideways(
            f,
            present(self.root),
            |id| (present(self.left(id)), present(self.right(id))),
            |f, id| {
                let node = &self.nodes[id];
                write!(f, "[{}, {}]", node.key, node.value)?;
                if node.links.color == Color::Red {
                    f.write_str("*")?;
                }
                Ok(())
            },
        )
    }
}

/// In-order iterator over a [`RedBlackTree`], stepping through parent links
pub struct Iter<'a, K, V, C> {
    tree: &'a RedBlackTree<K, V, C>,
    front: NodeId,
    back: NodeId,
    remaining: usize,
    direction: Direction,
}

impl<'a, K, V, C> Iter<'a, K, V, C> {
    fn new(tree: &'a RedBlackTree<K, V, C>, direction: Direction) -> Self {
        let (front, back) = if tree.root == NIL {
            (NIL, NIL)
        } else {
            (tree.minimum(tree.root), tree.maximum(tree.root))
        };
        Self {
            tree,
            front,
            back,
            remaining: tree.len(),
            direction,
        }
    }

    /// Order in which `next` yields entries
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn step_ascending(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 || self.front == NIL {
            return None;
        }
        let id = self.front;
        self.front = self.tree.successor(id);
        self.remaining -= 1;
        let node = &self.tree.nodes[id];
        Some((&node.key, &node.value))
    }

    fn step_descending(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 || self.back == NIL {
            return None;
        }
        let id = self.back;
        self.back = self.tree.predecessor(id);
        self.remaining -= 1;
        let node = &self.tree.nodes[id];
        Some((&node.key, &node.value))
    }
}

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.direction {
            Direction::Ascending => self.step_ascending(),
            Direction::Descending => self.step_descending(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, C> DoubleEndedIterator for Iter<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.direction {
            Direction::Ascending => self.step_descending(),
            Direction::Descending => self.step_ascending(),
        }
    }
}

impl<K, V, C> ExactSizeIterator for Iter<'_, K, V, C> {}

impl<K, V, C> FusedIterator for Iter<'_, K, V, C> {}
