//! Indented tree projection with per-node collapse state.
//!
//! Collapse state lives here, keyed by [`NodeKey`], not on the nodes. A
//! rebuild discards it unless the caller asks to preserve it, in which case
//! the same keys are replayed against the new nodes.

use std::collections::HashSet;

use crate::cursor::Cursor;
use crate::tree::{NodeKey, NodePath, OperationNode, node_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub path: NodePath,
    pub key: NodeKey,
    pub expandable: bool,
    pub expanded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TreeState {
    collapsed: HashSet<NodeKey>,
    rows: Vec<TreeRow>,
    cursor: Cursor,
}

impl TreeState {
    /// Visible rows for `roots` under the given collapse set.
    pub fn rows_for(roots: &[OperationNode], collapsed: &HashSet<NodeKey>) -> Vec<TreeRow> {
        let mut rows = Vec::with_capacity(roots.len());
        for (ri, root) in roots.iter().enumerate() {
            let expandable = root.has_children();
            let expanded = expandable && !collapsed.contains(&root.key);
            rows.push(TreeRow {
                depth: 0,
                path: NodePath::root(ri),
                key: root.key,
                expandable,
                expanded,
            });
            if expanded {
                rows.extend(root.children.iter().enumerate().map(|(ci, child)| TreeRow {
                    depth: 1,
                    path: NodePath::child(ri, ci),
                    key: child.key,
                    expandable: false,
                    expanded: false,
                }));
            }
        }
        rows
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn is_collapsed(&self, key: NodeKey) -> bool {
        self.collapsed.contains(&key)
    }

    /// Swaps in freshly built nodes. With `preserve` false every node starts
    /// expanded again; with `preserve` true collapse state carries over for
    /// keys that still exist. The selected operation is kept when possible.
    pub fn replace_nodes(&mut self, roots: &[OperationNode], preserve: bool) {
        let selected = self.selected_row().map(|row| row.key);
        if preserve {
            let keys: HashSet<NodeKey> = roots.iter().map(|r| r.key).collect();
            self.collapsed.retain(|key| keys.contains(key));
        } else {
            self.collapsed.clear();
        }
        self.relayout(roots);
        match selected.and_then(|key| self.rows.iter().position(|r| r.key == key)) {
            Some(index) => self.cursor.select(index),
            None => self.cursor.reset(),
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        self.cursor.move_by(delta);
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.cursor.set_viewport(rows);
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.cursor.current().and_then(|i| self.rows.get(i))
    }

    pub fn selected_path(&self) -> Option<NodePath> {
        self.selected_row().map(|row| row.path)
    }

    pub fn selected_node<'a>(&self, roots: &'a [OperationNode]) -> Option<&'a OperationNode> {
        self.selected_path().and_then(|path| node_at(roots, path))
    }

    /// Flips the selected row. Returns false when the row has no children.
    pub fn toggle_selected(&mut self, roots: &[OperationNode]) -> bool {
        let Some(row) = self.selected_row().copied() else {
            return false;
        };
        if !row.expandable {
            return false;
        }
        if !self.collapsed.remove(&row.key) {
            self.collapsed.insert(row.key);
        }
        self.relayout(roots);
        true
    }

    pub fn expand_all(&mut self, roots: &[OperationNode]) {
        let selected = self.selected_row().map(|row| row.key);
        self.collapsed.clear();
        self.relayout(roots);
        if let Some(index) = selected.and_then(|key| self.rows.iter().position(|r| r.key == key)) {
            self.cursor.select(index);
        }
    }

    /// Collapses every expandable root; a selected attempt moves to its root.
    pub fn collapse_all(&mut self, roots: &[OperationNode]) {
        let selected_root = self.selected_path().map(|path| path.root);
        self.collapsed = roots
            .iter()
            .filter(|r| r.has_children())
            .map(|r| r.key)
            .collect();
        self.relayout(roots);
        if let Some(root) = selected_root {
            self.select_path(roots, NodePath::root(root));
        }
    }

    /// Moves the cursor to `path`, expanding its root if needed.
    pub fn select_path(&mut self, roots: &[OperationNode], path: NodePath) -> bool {
        if path.child.is_some() {
            if let Some(root) = roots.get(path.root) {
                if self.collapsed.remove(&root.key) {
                    self.relayout(roots);
                }
            }
        }
        match self.rows.iter().position(|r| r.path == path) {
            Some(index) => {
                self.cursor.select(index);
                true
            }
            None => false,
        }
    }

    fn relayout(&mut self, roots: &[OperationNode]) {
        self.rows = Self::rows_for(roots, &self.collapsed);
        self.cursor.set_len(self.rows.len());
    }
}
