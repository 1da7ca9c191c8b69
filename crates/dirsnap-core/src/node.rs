//! Snapshot tree nodes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::info::FileInfo;
use crate::tree::TreeStats;

/// A single entry in the snapshot tree together with its ordered children.
///
/// The node's `FileInfo` is fixed at construction. Only the children are
/// ever replaced, and the tree is navigated top-down only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    info: FileInfo,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a childless node.
    pub fn new(info: FileInfo) -> Self {
        Self {
            info,
            children: Vec::new(),
        }
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Children in sibling order.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Drop every descendant of this node.
    pub fn clear_children(&mut self) {
        self.children = Vec::new();
    }

    /// Append a child after the existing ones and return it.
    pub fn append_child(&mut self, info: FileInfo) -> &mut TreeNode {
        self.children.push(TreeNode::new(info));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Swap in a new set of children, returning the previous ones.
    pub fn replace_children(&mut self, children: Vec<TreeNode>) -> Vec<TreeNode> {
        std::mem::replace(&mut self.children, children)
    }

    /// Detach and return all children.
    pub fn take_children(&mut self) -> Vec<TreeNode> {
        std::mem::take(&mut self.children)
    }

    /// Find a node by absolute path, searching from this node downwards.
    pub fn find(&self, path: &Path) -> Option<&TreeNode> {
        if self.info.path() == path {
            return Some(self);
        }
        if !path.starts_with(self.info.path()) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Mutable variant of [`TreeNode::find`].
    pub fn find_mut(&mut self, path: &Path) -> Option<&mut TreeNode> {
        if self.info.path() == path {
            return Some(self);
        }
        if !path.starts_with(self.info.path()) {
            return None;
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(path))
    }

    /// Pre-order depth-first iterator over this node and its descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.iter().count() - 1
    }

    /// Compute summary statistics for the subtree rooted here.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::new();
        self.collect_stats(&mut stats, 0);
        stats
    }

    fn collect_stats(&self, stats: &mut TreeStats, depth: u32) {
        for child in &self.children {
            stats.record(child.info(), depth + 1);
            child.collect_stats(stats, depth + 1);
        }
    }
}

/// Iterator returned by [`TreeNode::iter`].
pub struct Iter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
