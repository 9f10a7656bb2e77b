//! In-memory view of one task's subtask forest.
//!
//! Cycle guards and cascading completion both need reachability answers over
//! the parent links of a single task's subtasks. Callers load the task's
//! subtasks once per request and build a [`SubtaskForest`] instead of issuing
//! one query per hop. The persisted structure is expected to be acyclic; the
//! walks below still carry a visited set so a corrupted parent chain
//! terminates instead of spinning.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Snapshot of a task's subtasks: parent pointers keyed by id, plus the
/// derived child adjacency.
#[derive(Debug, Default)]
pub struct SubtaskForest {
    parents: HashMap<i64, Option<i64>>,
    children: HashMap<i64, Vec<i64>>,
}

impl SubtaskForest {
    /// Build a forest from `(id, parent_subtask_id)` pairs.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (i64, Option<i64>)>,
    {
        let mut forest = Self::default();
        for (id, parent) in nodes {
            forest.parents.insert(id, parent);
            if let Some(parent_id) = parent {
                forest.children.entry(parent_id).or_default().push(id);
            }
        }
        forest
    }

    /// Whether the forest contains a node with this id.
    pub fn contains(&self, id: i64) -> bool {
        self.parents.contains_key(&id)
    }

    /// Number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the forest has no nodes.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Whether `node` lies strictly below `ancestor`, i.e. walking `node`'s
    /// parent chain upward reaches `ancestor`.
    pub fn is_descendant_of(&self, node: i64, ancestor: i64) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.parents.get(&node).copied().flatten();
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !visited.insert(id) {
                // Corrupted parent chain; nothing further up is reachable.
                return false;
            }
            current = self.parents.get(&id).copied().flatten();
        }
        false
    }

    /// Ids of the subtree rooted at `root`, including `root` itself.
    ///
    /// Order is unspecified beyond `root` coming first; callers treat the
    /// result as a set.
    pub fn subtree_ids(&self, root: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }
        out
    }

    /// Validate re-parenting `subtask_id` under `new_parent_id`.
    ///
    /// Rejects self-parenting and moves that would place a node under its own
    /// descendant. Existence of both nodes is the caller's concern; a parent
    /// unknown to the forest is simply not an ancestor of anything.
    pub fn ensure_can_reparent(&self, subtask_id: i64, new_parent_id: i64) -> Result<()> {
        if new_parent_id == subtask_id {
            return Err(Error::SelfParent);
        }
        if self.is_descendant_of(new_parent_id, subtask_id) {
            return Err(Error::DescendantCycle);
        }
        Ok(())
    }
}
