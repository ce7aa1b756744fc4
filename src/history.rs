//! Bounded snapshot undo/redo.

use crate::error::ProjectError;
use crate::project::{Document, Snapshot};
use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Undo/redo stacks of document snapshots.
///
/// The top of the undo stack always mirrors the current document; the bottom
/// entry is the oldest state still reachable by undo.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    capacity: usize,
}

impl History {
    /// Starts a history whose initial entry is `doc`'s current state.
    pub fn new(doc: &Document) -> Result<Self, ProjectError> {
        Self::with_capacity(doc, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(doc: &Document, capacity: usize) -> Result<Self, ProjectError> {
        let mut history = Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: capacity.max(1),
        };
        history.undo.push_back(Snapshot::capture(doc)?);
        Ok(history)
    }

    /// Records `doc` after a mutation. Clears the redo stack.
    pub fn save(&mut self, doc: &Document) -> Result<(), ProjectError> {
        self.push(Snapshot::capture(doc)?);
        Ok(())
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.undo.push_back(snapshot);
        self.redo.clear();
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
            debug!(capacity = self.capacity, "evicted oldest snapshot");
        }
    }

    /// Steps back one entry. Returns `Ok(false)` when only the initial entry remains.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, ProjectError> {
        if !self.can_undo() {
            return Ok(false);
        }
        let previous = self.undo.len() - 2;
        self.undo[previous].restore(doc)?;
        if let Some(top) = self.undo.pop_back() {
            self.redo.push(top);
        }
        Ok(true)
    }

    /// Re-applies the most recently undone entry. Returns `Ok(false)` when there is none.
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, ProjectError> {
        let Some(next) = self.redo.last() else {
            return Ok(false);
        };
        next.restore(doc)?;
        if let Some(top) = self.redo.pop() {
            self.undo.push_back(top);
        }
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo entries, including the current state.
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The entry mirroring the current document.
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo.back()
    }

    /// Drops every entry and restarts from `doc`.
    pub fn clear(&mut self, doc: &Document) -> Result<(), ProjectError> {
        let snapshot = Snapshot::capture(doc)?;
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(snapshot);
        Ok(())
    }
}
