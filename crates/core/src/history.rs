//! Linear undo/redo history over annotation snapshots
//!
//! The history does not own the live state. Callers pass the live map in and the
//! history swaps snapshots in and out of it, so every transition is a single
//! move of whole values.

use crate::annotation::PageAnnotationMap;
use std::collections::VecDeque;
use std::mem;

/// Past and future snapshot stacks
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Older states, most recent last
    past: Vec<PageAnnotationMap>,
    /// Undone states, next redo first
    future: VecDeque<PageAnnotationMap>,
    /// Maximum number of past entries kept (None = unbounded)
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` past entries. `Some(0)` is treated as unbounded.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self { limit: limit.filter(|&n| n > 0), ..Self::default() }
    }

    /// Install `next` as the live state, recording the previous one.
    ///
    /// Clears the redo stack.
    pub fn commit(&mut self, current: &mut PageAnnotationMap, next: PageAnnotationMap) {
        let previous = mem::replace(current, next);
        self.past.push(previous);
        self.future.clear();

        if let Some(limit) = self.limit {
            let excess = self.past.len().saturating_sub(limit);
            if excess > 0 {
                self.past.drain(..excess);
            }
        }
    }

    /// Step back one snapshot. Returns false if there was nothing to undo.
    pub fn undo(&mut self, current: &mut PageAnnotationMap) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        let undone = mem::replace(current, previous);
        self.future.push_front(undone);
        true
    }

    /// Step forward one snapshot. Returns false if there was nothing to redo.
    pub fn redo(&mut self, current: &mut PageAnnotationMap) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let redone = mem::replace(current, next);
        self.past.push(redone);
        true
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}
