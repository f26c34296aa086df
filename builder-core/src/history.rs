//! Snapshot-based linear undo/redo.
//!
//! `present` always mirrors the live document: every structural mutation
//! commits the post-mutation snapshot, which moves the previous `present`
//! (the pre-mutation state) onto `past`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::node::{ComponentNode, NodeId};

/// Full node array of a document at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Root id at the time of capture.
    pub root_id: NodeId,
    /// Nodes in document order.
    pub nodes: Vec<ComponentNode>,
}

/// History configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo steps kept (0 = unlimited).
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 0 }
    }
}

/// Undo/redo stacks around the present snapshot.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    present: Snapshot,
    future: VecDeque<Snapshot>,
    config: HistoryConfig,
}

impl History {
    /// Start a history whose present is `initial`.
    #[must_use]
    pub fn new(initial: Snapshot, config: HistoryConfig) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            config,
        }
    }

    /// Record a new present state. Clears the redo stack.
    pub fn commit(&mut self, state: Snapshot) {
        let previous = std::mem::replace(&mut self.present, state);
        self.past.push_back(previous);
        self.future.clear();
        if self.config.max_depth > 0 {
            while self.past.len() > self.config.max_depth {
                self.past.pop_front();
            }
        }
    }

    /// Step back. Returns the new present, or `None` when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let previous = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        Some(&self.present)
    }

    /// Step forward. Returns the new present, or `None` when there is nothing
    /// to redo.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.future.pop_front()?;
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        Some(&self.present)
    }

    /// Current snapshot.
    #[must_use]
    pub fn present(&self) -> &Snapshot {
        &self.present
    }

    /// Whether [`History::undo`] would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether [`History::redo`] would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps available.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Number of redo steps available.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}
