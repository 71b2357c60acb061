//! AvlTree - height-balanced binary search tree
//!
//! Every node stores the height of its subtree (1 for a leaf). After each
//! insert or remove the heights on the path back to the root are recomputed
//! and any node whose children differ in height by more than one is fixed with
//! a single or double rotation.
//!
//! Inserting a key that is already present leaves the tree untouched.

use super::arena::{Arena, NodeId};
use super::comparator::{Comparator, NaturalOrder};
use super::{draw_sideways, Direction};
use crate::error::{LexmapError, Result};
use crate::statistics::{OpCounters, OpStats};
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

struct Node<K, V> {
    key: K,
    value: V,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: i32,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
            height: 1,
        }
    }
}

/// AVL-balanced ordered map
pub struct AvlTree<K, V, C = NaturalOrder> {
    nodes: Arena<Node<K, V>>,
    root: Option<NodeId>,
    comparator: C,
    counters: OpCounters,
}

impl<K: Ord, V> AvlTree<K, V, NaturalOrder> {
    /// Create an empty tree ordered by `K: Ord`
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Ord, V> Default for AvlTree<K, V, NaturalOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> AvlTree<K, V, C>
where
    C: Comparator<K>,
{
    /// Create an empty tree ordered by `comparator`
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            comparator,
            counters: OpCounters::new(),
        }
    }

    /// Insert `key -> value`.
    ///
    /// Returns `false` and keeps the stored value when `key` is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let (root, inserted) = self.insert_at(self.root, key, value);
        self.root = Some(root);
        inserted.is_some()
    }

    /// Remove `key`, returning its value; `None` if absent
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (root, removed) = self.remove_at(self.root, key);
        self.root = root;
        removed
    }

    /// Check whether `key` is stored
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Value stored under `key`
    pub fn get(&self, key: &K) -> Result<&V> {
        self.find(key)
            .map(|id| &self.nodes[id].value)
            .ok_or(LexmapError::KeyNotFound)
    }

    /// Mutable value stored under `key`
    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let id = self.find(key).ok_or(LexmapError::KeyNotFound)?;
        Ok(&mut self.nodes[id].value)
    }

    /// Check heights, balance factors and key order of every node
    pub fn verify_invariants(&self) -> Result<()> {
        let mut checked = 0;
        self.verify_subtree(self.root, None, None, &mut checked)?;
        if checked != self.nodes.len() {
            return Err(LexmapError::corrupted(format!(
                "{} nodes reachable from the root, {} allocated",
                checked,
                self.nodes.len()
            )));
        }
        Ok(())
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            self.counters.compare();
            current = match self.comparator.compare(key, &node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    // Returns the new subtree root and the id of the created node, if any
    fn insert_at(&mut self, node: Option<NodeId>, key: K, value: V) -> (NodeId, Option<NodeId>) {
        let Some(id) = node else {
            let leaf = self.nodes.alloc(Node::leaf(key, value));
            return (leaf, Some(leaf));
        };

        self.counters.compare();
        let (subtree, inserted) = match self.comparator.compare(&key, &self.nodes[id].key) {
            Ordering::Less => {
                let left = self.nodes[id].left;
                let (child, inserted) = self.insert_at(left, key, value);
                self.nodes[id].left = Some(child);
                (id, inserted)
            }
            Ordering::Greater => {
                let right = self.nodes[id].right;
                let (child, inserted) = self.insert_at(right, key, value);
                self.nodes[id].right = Some(child);
                (id, inserted)
            }
            Ordering::Equal => return (id, None),
        };

        match inserted {
            Some(new_node) => (self.rebalance_after_insert(subtree, new_node), inserted),
            None => (subtree, None),
        }
    }

    // Picks the rotation case by where the new key went relative to the child
    fn rebalance_after_insert(&mut self, id: NodeId, new_node: NodeId) -> NodeId {
        self.update_height(id);
        let balance = self.balance(Some(id));

        if balance < -1 {
            if let Some(left) = self.nodes[id].left {
                if self.key_order(new_node, left) == Ordering::Less {
                    return self.rotate_right(id);
                }
                let pivot = self.rotate_left(left);
                self.nodes[id].left = Some(pivot);
                return self.rotate_right(id);
            }
        } else if balance > 1 {
            if let Some(right) = self.nodes[id].right {
                if self.key_order(new_node, right) == Ordering::Greater {
                    return self.rotate_left(id);
                }
                let pivot = self.rotate_right(right);
                self.nodes[id].right = Some(pivot);
                return self.rotate_left(id);
            }
        }
        id
    }

    // Returns the new subtree root and the removed value
    fn remove_at(&mut self, node: Option<NodeId>, key: &K) -> (Option<NodeId>, Option<V>) {
        let Some(id) = node else {
            return (None, None);
        };

        self.counters.compare();
        match self.comparator.compare(key, &self.nodes[id].key) {
            Ordering::Less => {
                let left = self.nodes[id].left;
                let (child, removed) = self.remove_at(left, key);
                self.nodes[id].left = child;
                if removed.is_none() {
                    return (Some(id), None);
                }
                (Some(self.rebalance(id)), removed)
            }
            Ordering::Greater => {
                let right = self.nodes[id].right;
                let (child, removed) = self.remove_at(right, key);
                self.nodes[id].right = child;
                if removed.is_none() {
                    return (Some(id), None);
                }
                (Some(self.rebalance(id)), removed)
            }
            Ordering::Equal => match self.nodes[id].right {
                None => {
                    let left = self.nodes[id].left;
                    let removed = self.nodes.release(id).map(|node| node.value);
                    (left, removed)
                }
                Some(right) => {
                    let (child, successor) = self.remove_min(right);
                    self.nodes[id].right = child;
                    let removed = successor.map(|successor| {
                        let node = &mut self.nodes[id];
                        node.key = successor.key;
                        std::mem::replace(&mut node.value, successor.value)
                    });
                    (Some(self.rebalance(id)), removed)
                }
            },
        }
    }

    // Detaches the minimum node of the subtree rooted at `id`
    fn remove_min(&mut self, id: NodeId) -> (Option<NodeId>, Option<Node<K, V>>) {
        match self.nodes[id].left {
            None => {
                let right = self.nodes[id].right;
                (right, self.nodes.release(id))
            }
            Some(left) => {
                let (child, min) = self.remove_min(left);
                self.nodes[id].left = child;
                (Some(self.rebalance(id)), min)
            }
        }
    }

    // Post-removal fixup driven by the child's balance factor
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update_height(id);
        let balance = self.balance(Some(id));

        if balance < -1 {
            let left = self.nodes[id].left;
            if let Some(left) = left {
                if self.balance(Some(left)) > 0 {
                    let pivot = self.rotate_left(left);
                    self.nodes[id].left = Some(pivot);
                }
            }
            return self.rotate_right(id);
        }
        if balance > 1 {
            let right = self.nodes[id].right;
            if let Some(right) = right {
                if self.balance(Some(right)) < 0 {
                    let pivot = self.rotate_right(right);
                    self.nodes[id].right = Some(pivot);
                }
            }
            return self.rotate_left(id);
        }
        id
    }

    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.nodes[id].left else {
            return id;
        };
        self.nodes[id].left = self.nodes[pivot].right;
        self.nodes[pivot].right = Some(id);
        self.update_height(id);
        self.update_height(pivot);
        self.counters.rotate();
        pivot
    }

    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.nodes[id].right else {
            return id;
        };
        self.nodes[id].right = self.nodes[pivot].left;
        self.nodes[pivot].left = Some(id);
        self.update_height(id);
        self.update_height(pivot);
        self.counters.rotate();
        pivot
    }

    fn key_order(&self, a: NodeId, b: NodeId) -> Ordering {
        self.comparator.compare(&self.nodes[a].key, &self.nodes[b].key)
    }

    fn verify_subtree(
        &self,
        node: Option<NodeId>,
        lower: Option<NodeId>,
        upper: Option<NodeId>,
        checked: &mut usize,
    ) -> Result<i32> {
        let Some(id) = node else {
            return Ok(0);
        };
        *checked += 1;
        if lower.map_or(false, |lo| self.key_order(lo, id) != Ordering::Less)
            || upper.map_or(false, |hi| self.key_order(id, hi) != Ordering::Less)
        {
            return Err(LexmapError::corrupted(format!("node {} out of key order", id)));
        }

        let n = &self.nodes[id];
        let left = self.verify_subtree(n.left, lower, Some(id), checked)?;
        let right = self.verify_subtree(n.right, Some(id), upper, checked)?;
        let height = 1 + left.max(right);
        if n.height != height {
            return Err(LexmapError::corrupted(format!(
                "node {} stores height {}, actual {}",
                id, n.height, height
            )));
        }
        if (right - left).abs() > 1 {
            return Err(LexmapError::corrupted(format!(
                "node {} has balance factor {}",
                id,
                right - left
            )));
        }
        Ok(height)
    }
}

impl<K, V, C> AvlTree<K, V, C> {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree; 0 when empty, 1 for a single node
    pub fn height(&self) -> usize {
        self.height_of(self.root) as usize
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        log::trace!("AVL tree cleared");
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

    /// Rotations performed so far; a double rotation counts as two
    pub fn rotations(&self) -> u64 {
        self.counters.rotations()
    }

    /// Snapshot of all counters
    pub fn stats(&self) -> OpStats {
        self.counters.snapshot()
    }

    fn height_of(&self, node: Option<NodeId>) -> i32 {
        node.map_or(0, |id| self.nodes[id].height)
    }

    fn balance(&self, node: Option<NodeId>) -> i32 {
        node.map_or(0, |id| {
            let n = &self.nodes[id];
            self.height_of(n.right) - self.height_of(n.left)
        })
    }

    fn update_height(&mut self, id: NodeId) {
        let n = &self.nodes[id];
        let height = 1 + self.height_of(n.left).max(self.height_of(n.right));
        self.nodes[id].height = height;
    }
}

impl<K, V, C> FromIterator<(K, V)> for AvlTree<K, V, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::with_comparator(C::default());
        tree.extend(iter);
        tree
    }
}

impl<K, V, C> Extend<(K, V)> for AvlTree<K, V, C>
where
    C: Comparator<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a AvlTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AvlTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Sideways drawing, one `[key, value]` per line, right subtree on top
impl<K: fmt::Display, V: fmt::Display, C> fmt::Display for AvlTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        draw_sideways(
            f,
            self.root,
            |id| (self.nodes[id].left, self.nodes[id].right),
            |f, id| write!(f, "[{}, {}]", self.nodes[id].key, self.nodes[id].value),
        )
    }
}

/// In-order iterator over an [`AvlTree`]
///
/// Keeps one ancestor stack per end, so it can be consumed from both sides.
pub struct Iter<'a, K, V, C> {
    tree: &'a AvlTree<K, V, C>,
    front: Vec<NodeId>,
    back: Vec<NodeId>,
    remaining: usize,
    direction: Direction,
}

impl<'a, K, V, C> Iter<'a, K, V, C> {
    fn new(tree: &'a AvlTree<K, V, C>, direction: Direction) -> Self {
        let mut iter = Self {
            tree,
            front: Vec::with_capacity(tree.height()),
            back: Vec::with_capacity(tree.height()),
            remaining: tree.len(),
            direction,
        };
        iter.push_left_spine(tree.root);
        iter.push_right_spine(tree.root);
        iter
    }

    /// Order in which `next` yields entries
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn push_left_spine(&mut self, mut node: Option<NodeId>) {
        while let Some(id) = node {
            self.front.push(id);
            node = self.tree.nodes[id].left;
        }
    }

    fn push_right_spine(&mut self, mut node: Option<NodeId>) {
        while let Some(id) = node {
            self.back.push(id);
            node = self.tree.nodes[id].right;
        }
    }

    fn step_ascending(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front.pop()?;
        let tree = self.tree;
        self.push_left_spine(tree.nodes[id].right);
        self.remaining -= 1;
        let node = &tree.nodes[id];
        Some((&node.key, &node.value))
    }

    fn step_descending(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back.pop()?;
        let tree = self.tree;
        self.push_right_spine(tree.nodes[id].left);
        self.remaining -= 1;
        let node = &tree.nodes[id];
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ReverseOrder;

    fn root_key<K: Copy, V, C>(tree: &AvlTree<K, V, C>) -> Option<K> {
        tree.root.map(|id| tree.nodes[id].key)
    }

    fn child_keys<K: Copy, V, C>(tree: &AvlTree<K, V, C>, key_id: NodeId) -> (Option<K>, Option<K>) {
        let node = &tree.nodes[key_id];
        (
            node.left.map(|id| tree.nodes[id].key),
            node.right.map(|id| tree.nodes[id].key),
        )
    }

    #[test]
    fn test_insert_and_get() {
        let mut tree = AvlTree::new();
        assert!(tree.insert("hello", 1));
        assert!(tree.insert("world", 2));
        assert_eq!(tree.get(&"hello").unwrap(), &1);
        assert_eq!(tree.len(), 2);
        assert!(matches!(tree.get(&"missing"), Err(LexmapError::KeyNotFound)));
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut tree = AvlTree::new();
        assert!(tree.insert(7, "first"));
        assert!(!tree.insert(7, "second"));
        assert_eq!(tree.get(&7).unwrap(), &"first");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_rotation_scenario_shape() {
        let mut tree = AvlTree::new();
        for key in [10, 20, 30, 40, 50, 25] {
            tree.insert(key, ());
        }
        assert_eq!(root_key(&tree), Some(30));
        let root = tree.root.unwrap();
        assert_eq!(child_keys(&tree, root), (Some(20), Some(40)));

        let left = tree.nodes[root].left.unwrap();
        assert_eq!(child_keys(&tree, left), (Some(10), Some(25)));
        let right = tree.nodes[root].right.unwrap();
        assert_eq!(child_keys(&tree, right), (None, Some(50)));

        assert_eq!(tree.height(), 3);
        assert!(tree.verify_invariants().is_ok());
        // RR at 10, RR at 30, then RL at the root
        assert_eq!(tree.rotations(), 4);
    }

    #[test]
    fn test_double_rotations() {
        let mut lr = AvlTree::new();
        for key in [30, 10, 20] {
            lr.insert(key, ());
        }
        assert_eq!(root_key(&lr), Some(20));
        assert_eq!(lr.rotations(), 2);

        let mut rl = AvlTree::new();
        for key in [10, 30, 20] {
            rl.insert(key, ());
        }
        assert_eq!(root_key(&rl), Some(20));
        assert_eq!(rl.rotations(), 2);
    }

    #[test]
    fn test_remove_leaf_inner_and_root() {
        let mut tree: AvlTree<i32, i32> = (1..=15).map(|k| (k, k * 10)).collect();
        assert_eq!(tree.remove(&1), Some(10));
        assert_eq!(tree.remove(&8), Some(80));
        let root = root_key(&tree).unwrap();
        assert_eq!(tree.remove(&root), Some(root * 10));
        assert_eq!(tree.remove(&8), None);

        assert_eq!(tree.len(), 12);
        assert!(!tree.contains(&8));
        assert!(tree.verify_invariants().is_ok());
        let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        let expected: Vec<i32> = (2..=15).filter(|&k| k != 8 && k != root).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_remove_rebalances() {
        let mut tree: AvlTree<i32, ()> = (0..64).map(|k| (k, ())).collect();
        for k in (0..64).filter(|k| k % 4 != 0) {
            assert_eq!(tree.remove(&k), Some(()));
            assert!(tree.verify_invariants().is_ok());
        }
        assert_eq!(tree.len(), 16);
        assert!(tree.height() <= 6);
    }

    #[test]
    fn test_insert_remove_all() {
        let mut tree = AvlTree::new();
        for k in 0..200 {
            tree.insert(k, k);
        }
        for k in 0..200 {
            assert_eq!(tree.remove(&k), Some(k));
        }
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert!(!tree.contains(&0));
    }

    #[test]
    fn test_double_ended_iteration() {
        let tree: AvlTree<i32, i32> = (1..=7).map(|k| (k, k)).collect();
        let asc: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        let desc: Vec<i32> = tree.iter_desc().map(|(k, _)| *k).collect();
        assert_eq!(asc, (1..=7).collect::<Vec<_>>());
        assert_eq!(desc, (1..=7).rev().collect::<Vec<_>>());

        let mut iter = tree.iter();
        assert_eq!(iter.next().map(|(k, _)| *k), Some(1));
        assert_eq!(iter.next_back().map(|(k, _)| *k), Some(7));
        assert_eq!(iter.len(), 5);
        let middle: Vec<i32> = iter.map(|(k, _)| *k).collect();
        assert_eq!(middle, vec![2, 3, 4, 5, 6]);

        assert_eq!(tree.first(), Some((&1, &1)));
        assert_eq!(tree.last(), Some((&7, &7)));
    }

    #[test]
    fn test_custom_comparator() {
        let mut tree = AvlTree::with_comparator(ReverseOrder);
        for k in [3, 1, 2] {
            tree.insert(k, ());
        }
        let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![3, 2, 1]);

        let mut by_len = AvlTree::with_comparator(|a: &&str, b: &&str| a.len().cmp(&b.len()));
        assert!(by_len.insert("abc", 1));
        assert!(!by_len.insert("xyz", 2));
        assert!(by_len.insert("a", 3));
        assert_eq!(by_len.get(&"qqq").unwrap(), &1);
    }

    #[test]
    fn test_counters() {
        let mut tree = AvlTree::new();
        tree.insert(2, ());
        assert_eq!(tree.comparisons(), 0);
        tree.insert(1, ());
        assert_eq!(tree.comparisons(), 1);
        assert!(tree.contains(&1));
        assert_eq!(tree.comparisons(), 3);
        assert_eq!(tree.stats().rotations, 0);
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut tree = AvlTree::new();
        tree.insert("k", 1);
        *tree.get_mut(&"k").unwrap() += 41;
        assert_eq!(tree.get(&"k").unwrap(), &42);
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.get_mut(&"k").is_err());
        assert!(tree.insert("k", 0));
    }

    #[test]
    fn test_display() {
        let mut tree = AvlTree::new();
        assert_eq!(tree.to_string(), "Empty tree\n");
        for (k, v) in [(2, "b"), (1, "a"), (3, "c")] {
            tree.insert(k, v);
        }
        assert_eq!(tree.to_string(), "┌───[3, c]\n[2, b]\n└───[1, a]\n");

        let mut lopsided = AvlTree::new();
        lopsided.insert(1, "a");
        lopsided.insert(2, "b");
        assert_eq!(lopsided.to_string(), "┌───[2, b]\n[1, a]\n└───#\n");
    }

    #[test]
    fn test_verify_detects_bad_height() {
        let mut tree: AvlTree<i32, ()> = (0..5).map(|k| (k, ())).collect();
        let root = tree.root.unwrap();
        tree.nodes[root].height += 1;
        assert!(matches!(
            tree.verify_invariants(),
            Err(LexmapError::Corrupted { .. })
        ));
    }
}
