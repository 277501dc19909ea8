//! Undo/redo over immutable snapshots.

use std::collections::VecDeque;

/// Past and future snapshots around the present one.
///
/// Snapshots share unchanged tables, so keeping many of them is cheap.
#[derive(Debug, Clone)]
pub struct History<S> {
    past: VecDeque<S>,
    present: S,
    future: Vec<S>,
    limit: Option<usize>,
}

impl<S> History<S> {
    /// `limit` caps the number of undo steps; `None` keeps everything.
    pub fn new(present: S, limit: Option<usize>) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: Vec::new(),
            limit,
        }
    }

    pub fn present(&self) -> &S {
        &self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Record a new present. The redo stack is dropped.
    pub fn push(&mut self, next: S) {
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        if let Some(limit) = self.limit {
            while self.past.len() > limit {
                self.past.pop_front();
            }
        }
        self.future.clear();
    }

    /// Step back. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        true
    }

    /// Step forward. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        true
    }

    /// Forget past and future, keeping the present.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Replace the present without recording it, dropping all history.
    pub fn reset(&mut self, present: S) {
        self.present = present;
        self.clear();
    }
}
