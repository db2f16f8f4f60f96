use std::collections::VecDeque;
use std::sync::Arc;

use crate::model::Document;

/// Snapshots kept for undo (and, separately, for redo).
pub const HISTORY_CAPACITY: usize = 5;

/// Frozen copy of the document taken just before a mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot(Arc<Document>);

impl Snapshot {
    pub fn capture(doc: &Document) -> Self {
        Self(Arc::new(doc.clone()))
    }

    pub fn document(&self) -> &Document {
        &self.0
    }

    fn into_document(self) -> Document {
        Arc::unwrap_or_clone(self.0)
    }
}

/// Bounded undo/redo stacks. Oldest snapshots fall off first.
///
/// [`History::undo`] and [`History::redo`] swap the live document while
/// holding `&mut self`, so no [`History::record`] can run mid-restore and a
/// restored state is never captured as a new snapshot.
#[derive(Debug, Default)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: VecDeque<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Captures `doc` ahead of a mutation. A fresh edit invalidates redo.
    pub fn record(&mut self, doc: &Document) {
        push_bounded(&mut self.past, Snapshot::capture(doc));
        self.future.clear();
    }

    pub fn undo(&mut self, live: &mut Document) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        push_bounded(&mut self.future, swap_in(live, previous));
        tracing::debug!(remaining = self.past.len(), "undo");
        true
    }

    pub fn redo(&mut self, live: &mut Document) -> bool {
        let Some(next) = self.future.pop_back() else {
            return false;
        };
        push_bounded(&mut self.past, swap_in(live, next));
        tracing::debug!(remaining = self.future.len(), "redo");
        true
    }

}

/// Replaces `live` with `snapshot`, returning the displaced state.
fn swap_in(live: &mut Document, snapshot: Snapshot) -> Snapshot {
    Snapshot(Arc::new(std::mem::replace(live, snapshot.into_document())))
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot) {
    stack.push_back(snapshot);
    while stack.len() > HISTORY_CAPACITY {
        stack.pop_front();
    }
}
