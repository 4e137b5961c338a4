//! #   The OrderedSet.
//!
//! An ordered set of unique keys, stored in a red-black tree.
//!
//! ##  Under the covers.
//!
//! Nodes live in an arena, a `Vec`, and refer to each other by index: each
//! node knows its parent and its two children. The parent link is only ever
//! used to walk back up the tree, when rebalancing or iterating.
//!
//! Removing a node swaps the last node of the arena into the freed index and
//! re-points the links of its neighbours, so the arena never holds holes.
//!
//! The usual red-black invariants hold between any two calls:
//!
//! 1.  The root is black.
//! 2.  A red node has no red child.
//! 3.  Every path from a node down to a missing child crosses the same number
//!     of black nodes.
//! 4.  An in-order walk yields strictly increasing keys.
//!
//! #   Example
//!
//! ```
//! use shelving::OrderedSet;
//!
//! let mut set: OrderedSet<i32> = [5, 2, 8, 1, 9, 3].into_iter().collect();
//!
//! assert_eq!(vec![1, 2, 3, 5, 8, 9], set.iter().copied().collect::<Vec<_>>());
//! assert!(!set.insert(8));
//!
//! assert!(set.erase(&5));
//! assert_eq!(vec![1, 2, 3, 8, 9], set.iter().copied().collect::<Vec<_>>());
//! assert_eq!(vec![9, 8, 3, 2, 1], set.iter().rev().copied().collect::<Vec<_>>());
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::{fmt, mem};

type Link = Option<usize>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Clone, Debug)]
struct Node<K> {
    key: K,
    color: Color,
    parent: Link,
    left: Link,
    right: Link,
}

impl<K> Node<K> {
    fn new_red(key: K, parent: Link) -> Self {
        Self {
            key,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        }
    }
}

/// `OrderedSet`
///
/// A set of unique keys, iterated in increasing order.
#[derive(Clone)]
pub struct OrderedSet<K> {
    nodes: Vec<Node<K>>,
    root: Link,
}

impl<K> OrderedSet<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Returns the smallest key.
    pub fn first(&self) -> Option<&K> {
        let index = self.leftmost(self.root?);
        Some(&self.nodes[index].key)
    }

    /// Returns the largest key.
    pub fn last(&self) -> Option<&K> {
        let index = self.rightmost(self.root?);
        Some(&self.nodes[index].key)
    }

    /// Iterates over the keys in increasing order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            set: self,
            front: self.root.map(|root| self.leftmost(root)),
            back: self.root.map(|root| self.rightmost(root)),
            remaining: self.len(),
        }
    }

    //
    //  Navigation
    //

    fn child(&self, index: usize, side: Side) -> Link {
        match side {
            Side::Left => self.nodes[index].left,
            Side::Right => self.nodes[index].right,
        }
    }

    fn set_child(&mut self, index: usize, side: Side, child: Link) {
        match side {
            Side::Left => self.nodes[index].left = child,
            Side::Right => self.nodes[index].right = child,
        }
    }

    fn parent(&self, index: usize) -> Link {
        self.nodes[index].parent
    }

    //  Side of `parent` on which `child` hangs; `child` may be a missing leaf.
    fn side_of(&self, parent: usize, child: Link) -> Side {
        if self.nodes[parent].left == child {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn leftmost(&self, mut index: usize) -> usize {
        while let Some(left) = self.nodes[index].left {
            index = left;
        }
        index
    }

    fn rightmost(&self, mut index: usize) -> usize {
        while let Some(right) = self.nodes[index].right {
            index = right;
        }
        index
    }

    //  In-order neighbour of `index` on `side`: its successor for `Right`.
    fn step(&self, index: usize, side: Side) -> Link {
        if let Some(child) = self.child(index, side) {
            return Some(match side {
                Side::Left => self.rightmost(child),
                Side::Right => self.leftmost(child),
            });
        }

        let mut current = index;
        while let Some(parent) = self.parent(current) {
            if self.child(parent, side.opposite()) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    //
    //  Colors
    //

    //  Missing leaves are black.
    fn color(&self, link: Link) -> Color {
        link.map_or(Color::Black, |index| self.nodes[index].color)
    }

    fn is_red(&self, link: Link) -> bool {
        self.color(link) == Color::Red
    }

    fn is_black(&self, link: Link) -> bool {
        self.color(link) == Color::Black
    }

    fn paint(&mut self, link: Link, color: Color) {
        if let Some(index) = link {
            self.nodes[index].color = color;
        }
    }

    //
    //  Restructuring
    //

    //  Makes `new` take the place of `old` under `parent`, or at the root.
    fn replace_child(&mut self, parent: Link, old: usize, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let side = self.side_of(parent, Some(old));
                self.set_child(parent, side, new);
            }
        }
    }

    //  Rotates the subtree rooted at `index` towards `side`: the child on the
    //  opposite side is lifted into its place.
    fn rotate(&mut self, index: usize, side: Side) {
        let Some(pivot) = self.child(index, side.opposite()) else { return };

        let inner = self.child(pivot, side);
        self.set_child(index, side.opposite(), inner);
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(index);
        }

        let parent = self.parent(index);
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, index, Some(pivot));

        self.set_child(pivot, side, Some(index));
        self.nodes[index].parent = Some(pivot);
    }

    //  Resolves a red node `index` possibly hanging under a red parent.
    fn fix_insert(&mut self, mut index: usize) {
        while let Some(parent) = self.parent(index) {
            if self.is_black(Some(parent)) || self.is_black(Some(index)) {
                break;
            }

            //  A red parent is never the root, so the grandparent exists.
            let Some(grandparent) = self.parent(parent) else { break };
            let side = self.side_of(grandparent, Some(parent));
            let uncle = self.child(grandparent, side.opposite());

            if self.is_red(uncle) {
                self.paint(Some(parent), Color::Black);
                self.paint(uncle, Color::Black);
                self.paint(Some(grandparent), Color::Red);
                index = grandparent;
                continue;
            }

            let mut parent = parent;
            if self.child(parent, side.opposite()) == Some(index) {
                //  Inner grandchild: straighten the zig-zag first.
                self.rotate(parent, side);
                index = parent;
                parent = match self.parent(index) {
                    Some(parent) => parent,
                    None => break,
                };
            }

            self.paint(Some(parent), Color::Black);
            self.paint(Some(grandparent), Color::Red);
            self.rotate(grandparent, side.opposite());
        }

        self.paint(self.root, Color::Black);
    }

    //  Resolves the black deficit of `node` (possibly a missing leaf) hanging
    //  under `parent`.
    fn fix_erase(&mut self, mut node: Link, mut parent: Link) {
        while node != self.root && self.is_black(node) {
            let Some(above) = parent else { break };

            let side = self.side_of(above, node);
            let far = side.opposite();

            //  A doubly black node always has a sibling.
            let Some(mut sibling) = self.child(above, far) else { break };

            if self.is_red(Some(sibling)) {
                self.paint(Some(sibling), Color::Black);
                self.paint(Some(above), Color::Red);
                self.rotate(above, side);

                sibling = match self.child(above, far) {
                    Some(sibling) => sibling,
                    None => break,
                };
            }

            let near_nephew = self.child(sibling, side);
            let far_nephew = self.child(sibling, far);

            if self.is_black(near_nephew) && self.is_black(far_nephew) {
                self.paint(Some(sibling), Color::Red);
                node = Some(above);
                parent = self.parent(above);
                continue;
            }

            if self.is_black(far_nephew) {
                self.paint(near_nephew, Color::Black);
                self.paint(Some(sibling), Color::Red);
                self.rotate(sibling, far);

                sibling = match self.child(above, far) {
                    Some(sibling) => sibling,
                    None => break,
                };
            }

            let color = self.nodes[above].color;
            self.paint(Some(sibling), color);
            self.paint(Some(above), Color::Black);
            self.paint(self.child(sibling, far), Color::Black);
            self.rotate(above, side);

            node = self.root;
            break;
        }

        self.paint(node, Color::Black);
    }

    //  Swaps the keys held by two distinct nodes.
    fn swap_keys(&mut self, a: usize, b: usize) {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(high);
        mem::swap(&mut head[low].key, &mut tail[0].key);
    }

    //  Frees the arena entry of an unlinked node, moving the last node into
    //  its index.
    fn release(&mut self, index: usize) -> Node<K> {
        let last = self.nodes.len() - 1;
        let node = self.nodes.swap_remove(index);

        if index != last {
            let parent = self.parent(index);
            self.replace_child(parent, last, Some(index));

            let (left, right) = (self.nodes[index].left, self.nodes[index].right);
            for child in [left, right].into_iter().flatten() {
                self.nodes[child].parent = Some(index);
            }
        }

        node
    }
}

impl<K: Ord> OrderedSet<K> {
    /// Inserts `key`, returning whether it was absent.
    ///
    /// A key already present is left untouched.
    pub fn insert(&mut self, key: K) -> bool {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;

        while let Some(index) = current {
            side = match key.cmp(&self.nodes[index].key) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return false,
            };
            parent = Some(index);
            current = self.child(index, side);
        }

        let index = self.nodes.len();
        self.nodes.push(Node::new_red(key, parent));

        match parent {
            None => self.root = Some(index),
            Some(parent) => self.set_child(parent, side, Some(index)),
        }

        self.fix_insert(index);
        true
    }

    /// Returns whether `key` is present.
    pub fn search<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns whether `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key)
    }

    /// Removes `key`, returning whether it was present.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(found) = self.find(key) else { return false };

        //  With two children, the successor's key moves up and the successor,
        //  which has no left child, is unlinked instead.
        let mut target = found;
        if let (Some(_), Some(right)) = (self.nodes[found].left, self.nodes[found].right) {
            target = self.leftmost(right);
            self.swap_keys(found, target);
        }

        let child = self.nodes[target].left.or(self.nodes[target].right);
        let parent = self.parent(target);

        self.replace_child(parent, target, child);
        if let Some(child) = child {
            self.nodes[child].parent = parent;
        }

        if self.is_red(Some(target)) {
            //  Removing a red node never changes a black height.
        } else if self.is_red(child) {
            self.paint(child, Color::Black);
        } else {
            self.fix_erase(child, parent);
        }

        self.release(target);
        true
    }

    fn find<Q>(&self, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;

        while let Some(index) = current {
            current = match key.cmp(self.nodes[index].key.borrow()) {
                Ordering::Less => self.nodes[index].left,
                Ordering::Greater => self.nodes[index].right,
                Ordering::Equal => return Some(index),
            };
        }

        None
    }
}

impl<K> Default for OrderedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for OrderedSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq> PartialEq for OrderedSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq> Eq for OrderedSet<K> {}

impl<K: Ord> Extend<K> for OrderedSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        for key in keys {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for OrderedSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut set = Self::new();
        set.extend(keys);
        set
    }
}

impl<'a, K> IntoIterator for &'a OrderedSet<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over the keys of an [`OrderedSet`].
///
/// Steps from node to node through parent links, without an auxiliary stack.
pub struct Iter<'a, K> {
    set: &'a OrderedSet<K>,
    front: Link,
    back: Link,
    remaining: usize,
}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let index = self.front?;
        self.front = self.set.step(index, Side::Right);
        self.remaining -= 1;

        Some(&self.set.nodes[index].key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let index = self.back?;
        self.back = self.set.step(index, Side::Left);
        self.remaining -= 1;

        Some(&self.set.nodes[index].key)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
