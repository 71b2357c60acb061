//! Ordered maps: AVL and Red-Black search trees
//!
//! Both trees keep their nodes in an arena addressed by handles, take an
//! injected [`Comparator`] (natural `Ord` order by default), count key
//! comparisons and rotations, and iterate in key order in either direction.
//!
//! # Examples
//!
//! ```rust
//! use lexmap::tree::{AvlTree, RedBlackTree};
//!
//! let mut avl = AvlTree::new();
//! for (i, word) in ["pear", "apple", "fig"].into_iter().enumerate() {
//!     avl.insert(word, i);
//! }
//! let keys: Vec<_> = avl.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, vec!["apple", "fig", "pear"]);
//!
//! let mut rb = RedBlackTree::new();
//! rb.insert("pear", 0).unwrap();
//! assert!(rb.insert("pear", 1).is_err());
//! ```

mod arena;
mod avl;
pub mod comparator;
mod red_black;

pub use avl::{AvlTree, Iter as AvlIter};
pub use comparator::{Comparator, NaturalOrder, ReverseOrder};
pub use red_black::{Iter as RedBlackIter, RedBlackTree};

use std::fmt;

/// Traversal direction of a tree iterator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest key first
    Ascending,
    /// Largest key first
    Descending,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Branch {
    Left,
    Right,
}

/// Sideways drawing shared by both trees: right subtree above, left below,
/// `#` for an absent child of an inner node.
pub(crate) fn draw_sideways<N, C, L>(
    f: &mut fmt::Formatter<'_>,
    root: Option<N>,
    children: C,
    label: L,
) -> fmt::Result
where
    N: Copy,
    C: Fn(N) -> (Option<N>, Option<N>),
    L: Fn(&mut fmt::Formatter<'_>, N) -> fmt::Result,
{
    if root.is_none() {
        return writeln!(f, "Empty tree");
    }
    let mut lineage = Vec::new();
    draw_subtree(f, root, &mut lineage, &children, &label)
}

fn draw_subtree<N, C, L>(
    f: &mut fmt::Formatter<'_>,
    node: Option<N>,
    lineage: &mut Vec<Branch>,
    children: &C,
    label: &L,
) -> fmt::Result
where
    N: Copy,
    C: Fn(N) -> (Option<N>, Option<N>),
    L: Fn(&mut fmt::Formatter<'_>, N) -> fmt::Result,
{
    let kids = node
        .map(children)
        .filter(|(left, right)| left.is_some() || right.is_some());

    if let Some((_, right)) = kids {
        lineage.push(Branch::Right);
        draw_subtree(f, right, lineage, children, label)?;
        lineage.pop();
    }

    for pair in lineage.windows(2) {
        f.write_str(if pair[0] != pair[1] { "│   " } else { "    " })?;
    }
    match lineage.last() {
        Some(Branch::Right) => f.write_str("┌───")?,
        Some(Branch::Left) => f.write_str("└───")?,
        None => {}
    }
    match node {
        Some(id) => {
            label(f, id)?;
            writeln!(f)?;
        }
        None => writeln!(f, "#")?,
    }

    if let Some((left, _)) = kids {
        lineage.push(Branch::Left);
        draw_subtree(f, left, lineage, children, label)?;
        lineage.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trees_agree() {
        let keys = [50, 20, 80, 10, 30, 70, 90, 25, 35, 5];
        let avl: AvlTree<i32, i32> = keys.iter().map(|&k| (k, k * 2)).collect();
        let rb: RedBlackTree<i32, i32> = keys.iter().map(|&k| (k, k * 2)).collect();

        let from_avl: Vec<_> = avl.iter().collect();
        let from_rb: Vec<_> = rb.iter().collect();
        assert_eq!(from_avl, from_rb);
        assert!(avl.verify_invariants().is_ok());
        assert!(rb.verify_invariants().is_ok());
    }

    #[test]
    fn test_iterators_report_direction() {
        let avl: AvlTree<i32, ()> = (0..3).map(|k| (k, ())).collect();
        assert_eq!(avl.iter().direction(), Direction::Ascending);
        assert_eq!(avl.iter_desc().direction(), Direction::Descending);

        let rb: RedBlackTree<i32, ()> = (0..3).map(|k| (k, ())).collect();
        assert_eq!(rb.iter().direction(), Direction::Ascending);
        assert_eq!(rb.iter_desc().direction(), Direction::Descending);
    }
}
