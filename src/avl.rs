//! Order-statistics AVL tree.
//!
//! Rust port of `original_source/avl-tree/AVLTree.hpp` / `AVLTree.cpp` and
//! `components/AVLNode.hpp` / `AVLNode.cpp`. Every node additionally tracks
//! its subtree size, which is what makes [`AvlTree::rank`] and
//! [`AvlTree::offset`] (C++'s `find_offset`) run in O(log n) instead of a
//! linear walk. As with the other containers, nodes live in an arena
//! (`Vec<Option<Node<T>>>`) and are linked by index rather than by the C++
//! source's `AVLNode*` parent/left/right pointers.
//!
//! | Rust method           | C++ equivalent        |
//! |-------------------------|--------------------------|
//! | [`AvlTree::insert`]    | `AVLTree::insert`        |
//! | [`AvlTree::remove`]    | `AVLTree::remove`        |
//! | [`AvlTree::find_first_ge`] | `AVLTree::find_first_ge` |
//! | [`AvlTree::offset`]    | `AVLTree::find_offset`   |
//! | [`AvlTree::rank`]      | `AVLNode::get_rank`      |

type Link = Option<usize>;

struct Node<T> {
    value: T,
    parent: Link,
    left: Link,
    right: Link,
    height: i32,
    size: usize,
}

fn height<T>(arena: &[Option<Node<T>>], link: Link) -> i32 {
    link.map_or(0, |i| arena[i].as_ref().unwrap().height)
}

fn size<T>(arena: &[Option<Node<T>>], link: Link) -> usize {
    link.map_or(0, |i| arena[i].as_ref().unwrap().size)
}

/// A self-balancing binary search tree ordered by `Ord::cmp`, augmented with
/// subtree sizes for O(log n) rank and offset queries.
pub struct AvlTree<T> {
    arena: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    root: Link,
}

impl<T: Ord> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> AvlTree<T> {
    pub fn new() -> Self {
        AvlTree {
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        size(&self.arena, self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn alloc(&mut self, node: Node<T>) -> usize {
        if let Some(idx) = self.free.pop() {
            self.arena[idx] = Some(node);
            idx
        } else {
            self.arena.push(Some(node));
            self.arena.len() - 1
        }
    }

    fn node(&self, idx: usize) -> &Node<T> {
        self.arena[idx].as_ref().unwrap()
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        self.arena[idx].as_mut().unwrap()
    }

    /// Recomputes `height` and `size` for `idx` from its two children.
    fn update(&mut self, idx: usize) {
        let (l, r) = (self.node(idx).left, self.node(idx).right);
        let h = 1 + height(&self.arena, l).max(height(&self.arena, r));
        let s = 1 + size(&self.arena, l) + size(&self.arena, r);
        let n = self.node_mut(idx);
        n.height = h;
        n.size = s;
    }

    fn balance_factor(&self, idx: usize) -> i32 {
        let n = self.node(idx);
        height(&self.arena, n.left) - height(&self.arena, n.right)
    }

    /// Inserts `value`. An equal value already present does not block the
    /// insert: the new node descends to the right of it, same as any other
    /// non-less comparison, so the tree may hold several equal values.
    pub fn insert(&mut self, value: T) {
        let mut cur = self.root;
        let mut parent: Link = None;
        let mut go_left = false;
        while let Some(idx) = cur {
            parent = Some(idx);
            if value < self.node(idx).value {
                go_left = true;
                cur = self.node(idx).left;
            } else {
                go_left = false;
                cur = self.node(idx).right;
            }
        }

        let new_idx = self.alloc(Node {
            value,
            parent,
            left: None,
            right: None,
            height: 1,
            size: 1,
        });

        match parent {
            None => self.root = Some(new_idx),
            Some(p) if go_left => self.node_mut(p).left = Some(new_idx),
            Some(p) => self.node_mut(p).right = Some(new_idx),
        }

        self.fix_imbalances(parent);
    }

    /// Removes the node equal to `value`, if present, returning `true` if a
    /// node was removed.
    pub fn remove(&mut self, value: &T) -> bool {
        let Some(idx) = self.find_index(value) else {
            return false;
        };
        self.remove_at(idx);
        true
    }

    fn find_index(&self, value: &T) -> Link {
        let mut cur = self.root;
        while let Some(idx) = cur {
            match value.cmp(&self.node(idx).value) {
                std::cmp::Ordering::Less => cur = self.node(idx).left,
                std::cmp::Ordering::Greater => cur = self.node(idx).right,
                std::cmp::Ordering::Equal => return Some(idx),
            }
        }
        None
    }

    /// Detaches the node at `idx`, rebalancing from its former parent upward.
    /// Mirrors `AVLTree::remove`'s three cases: no children, one child, two
    /// children (swap with the in-order successor, then remove that node).
    fn remove_at(&mut self, idx: usize) {
        let (left, right) = (self.node(idx).left, self.node(idx).right);

        if left.is_some() && right.is_some() {
            // Find the in-order successor: leftmost node of the right subtree.
            let mut succ = right.unwrap();
            while let Some(l) = self.node(succ).left {
                succ = l;
            }
            self.swap_values(idx, succ);
            self.remove_at(succ);
            return;
        }

        let child = left.or(right);
        let parent = self.node(idx).parent;

        if let Some(c) = child {
            self.node_mut(c).parent = parent;
        }
        match parent {
            None => self.root = child,
            Some(p) => {
                if self.node(p).left == Some(idx) {
                    self.node_mut(p).left = child;
                } else {
                    self.node_mut(p).right = child;
                }
            }
        }

        self.arena[idx] = None;
        self.free.push(idx);
        self.fix_imbalances(parent);
    }

    /// Swaps the `value` fields of two distinct arena slots, leaving every
    /// link (parent/left/right/height/size) untouched.
    fn swap_values(&mut self, a: usize, b: usize) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.arena.split_at_mut(hi);
        let a_node = left[lo].as_mut().unwrap();
        let b_node = right[0].as_mut().unwrap();
        std::mem::swap(&mut a_node.value, &mut b_node.value);
    }

    /// Walks from `from` up to the root, updating height/size and rotating
    /// any node whose balance factor has drifted outside `[-1, 1]`.
    fn fix_imbalances(&mut self, from: Link) {
        let mut cur = from;
        while let Some(idx) = cur {
            self.update(idx);
            let bf = self.balance_factor(idx);
            let mut new_subtree_root = idx;

            if bf > 1 {
                let left = self.node(idx).left.unwrap();
                if self.balance_factor(left) < 0 {
                    self.rotate_left(left);
                }
                new_subtree_root = self.rotate_right(idx);
            } else if bf < -1 {
                let right = self.node(idx).right.unwrap();
                if self.balance_factor(right) > 0 {
                    self.rotate_right(right);
                }
                new_subtree_root = self.rotate_left(idx);
            }

            cur = self.node(new_subtree_root).parent;
        }
    }

    /// Left-rotates the subtree rooted at `idx`, returning the new subtree
    /// root (`idx`'s former right child).
    fn rotate_left(&mut self, idx: usize) -> usize {
        let parent = self.node(idx).parent;
        let pivot = self.node(idx).right.unwrap();
        let pivot_left = self.node(pivot).left;

        self.node_mut(idx).right = pivot_left;
        if let Some(pl) = pivot_left {
            self.node_mut(pl).parent = Some(idx);
        }

        self.node_mut(pivot).left = Some(idx);
        self.node_mut(idx).parent = Some(pivot);
        self.node_mut(pivot).parent = parent;

        self.reattach(parent, idx, pivot);
        self.update(idx);
        self.update(pivot);
        pivot
    }

    /// Right-rotates the subtree rooted at `idx`, returning the new subtree
    /// root (`idx`'s former left child).
    fn rotate_right(&mut self, idx: usize) -> usize {
        let parent = self.node(idx).parent;
        let pivot = self.node(idx).left.unwrap();
        let pivot_right = self.node(pivot).right;

        self.node_mut(idx).left = pivot_right;
        if let Some(pr) = pivot_right {
            self.node_mut(pr).parent = Some(idx);
        }

        self.node_mut(pivot).right = Some(idx);
        self.node_mut(idx).parent = Some(pivot);
        self.node_mut(pivot).parent = parent;

        self.reattach(parent, idx, pivot);
        self.update(idx);
        self.update(pivot);
        pivot
    }

    /// Points `parent`'s child link that used to hold `old` at `new` instead
    /// (or updates `self.root` when `parent` is `None`).
    fn reattach(&mut self, parent: Link, old: usize, new: usize) {
        match parent {
            None => self.root = Some(new),
            Some(p) => {
                if self.node(p).left == Some(old) {
                    self.node_mut(p).left = Some(new);
                } else {
                    self.node_mut(p).right = Some(new);
                }
            }
        }
    }

    /// The one-based in-order position of `value` among all stored values,
    /// or `None` if absent: the least stored value has rank 1. Equivalent to
    /// one plus the count of stored values that compare less.
    pub fn rank(&self, value: &T) -> Option<usize> {
        let mut cur = self.root;
        let mut rank = 1;
        while let Some(idx) = cur {
            match value.cmp(&self.node(idx).value) {
                std::cmp::Ordering::Less => cur = self.node(idx).left,
                std::cmp::Ordering::Greater => {
                    rank += size(&self.arena, self.node(idx).left) + 1;
                    cur = self.node(idx).right;
                }
                std::cmp::Ordering::Equal => {
                    return Some(rank + size(&self.arena, self.node(idx).left));
                }
            }
        }
        None
    }

    /// The value at 0-based in-order position `offset`, or `None` if out of
    /// range. Equivalent to `AVLTree::find_offset`.
    pub fn offset(&self, mut offset: usize) -> Option<&T> {
        if offset >= self.len() {
            return None;
        }
        let mut cur = self.root;
        while let Some(idx) = cur {
            let left_size = size(&self.arena, self.node(idx).left);
            if offset < left_size {
                cur = self.node(idx).left;
            } else if offset == left_size {
                return Some(&self.node(idx).value);
            } else {
                offset -= left_size + 1;
                cur = self.node(idx).right;
            }
        }
        None
    }

    /// The smallest stored value greater than or equal to `value`.
    pub fn find_first_ge(&self, value: &T) -> Option<&T> {
        let mut cur = self.root;
        let mut best: Link = None;
        while let Some(idx) = cur {
            if &self.node(idx).value >= value {
                best = Some(idx);
                cur = self.node(idx).left;
            } else {
                cur = self.node(idx).right;
            }
        }
        best.map(|idx| &self.node(idx).value)
    }

    /// Visits every stored value in ascending order.
    pub fn for_each_in_order(&self, mut visit: impl FnMut(&T)) {
        self.in_order(self.root, &mut visit);
    }

    fn in_order(&self, cur: Link, visit: &mut impl FnMut(&T)) {
        let Some(idx) = cur else { return };
        self.in_order(self.node(idx).left, visit);
        visit(&self.node(idx).value);
        self.in_order(self.node(idx).right, visit);
    }

    /// Checks the AVL height-balance invariant at every node, for use in
    /// tests only.
    #[cfg(test)]
    fn check_balanced(&self) {
        fn walk<T>(tree: &AvlTree<T>, idx: Link) -> i32 {
            let Some(i) = idx else { return 0 };
            let n = tree.node(i);
            let lh = walk(tree, n.left);
            let rh = walk(tree, n.right);
            assert!((lh - rh).abs() <= 1, "node unbalanced: {lh} vs {rh}");
            assert_eq!(n.height, 1 + lh.max(rh));
            1 + lh.max(rh)
        }
        walk(self, self.root);
    }
}
