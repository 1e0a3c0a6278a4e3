//! Annotation store
//!
//! Sole owner of the live [`PageAnnotationMap`], the undo history and the
//! selection. Every mutation builds the next map from a copy-on-write clone of
//! the current one and commits it through [`History`], so each change is one
//! history entry and never partially applied.

use crate::annotation::{Annotation, AnnotationId, PageAnnotationMap, PageNumber, PendingAnnotation};
use crate::geometry::PageCoordinate;
use crate::history::History;
use crate::manipulation::{self, HandleAction};
use log::{debug, warn};

/// Error types for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("annotation {id} not found on page {page}")]
    UnknownAnnotation { id: AnnotationId, page: PageNumber },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Receives the full state after every change (persistence, renderers)
pub trait SnapshotSink {
    fn state_changed(&mut self, state: &PageAnnotationMap);
}

/// Per-page annotation collections with undo/redo
#[derive(Default)]
pub struct AnnotationStore {
    current: PageAnnotationMap,
    history: History,
    selection: Option<AnnotationId>,
    sink: Option<Box<dyn SnapshotSink>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a bounded history depth
    pub fn with_history_limit(limit: Option<usize>) -> Self {
        Self { history: History::with_limit(limit), ..Self::default() }
    }

    /// Attach the sink notified after every state change
    pub fn set_sink(&mut self, sink: Box<dyn SnapshotSink>) {
        self.sink = Some(sink);
    }

    /// Install a previously persisted state. Not undoable.
    pub fn restore(&mut self, state: PageAnnotationMap) {
        debug!("restoring {} annotations", state.len());
        self.current = state;
        self.history.clear();
        self.selection = None;
    }

    pub fn state(&self) -> &PageAnnotationMap {
        &self.current
    }

    pub fn get_for_page(&self, page: PageNumber) -> &[Annotation] {
        self.current.page(page)
    }

    pub fn find(&self, id: AnnotationId) -> Option<(PageNumber, &Annotation)> {
        self.current.find(id)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Append a new annotation to `page` under a freshly assigned id.
    ///
    /// Geometry is stored as given; callers normalize first.
    pub fn create(&mut self, pending: PendingAnnotation, page: PageNumber) -> Annotation {
        let annotation = Annotation::from_pending(AnnotationId::new_v4(), pending);

        let mut next = self.current.clone();
        next.page_mut(page).push(annotation.clone());
        self.commit(next);

        debug!("created annotation {} on page {}", annotation.id, page);
        annotation
    }

    /// Replace the annotation on `page` that has the same id
    pub fn update(&mut self, annotation: Annotation, page: PageNumber) -> StoreResult<()> {
        let Some(index) = self.current.page(page).iter().position(|a| a.id == annotation.id)
        else {
            warn!("update of unknown annotation {} on page {}", annotation.id, page);
            return Err(StoreError::UnknownAnnotation { id: annotation.id, page });
        };

        let mut next = self.current.clone();
        next.page_mut(page)[index] = annotation;
        self.commit(next);

        debug!("updated annotation at index {} on page {}", index, page);
        Ok(())
    }

    /// Remove every annotation on `page` whose id is in `ids`.
    ///
    /// Returns the number removed. Fails without touching history when none match.
    pub fn delete(&mut self, ids: &[AnnotationId], page: PageNumber) -> StoreResult<usize> {
        let Some(&first) = ids.first() else {
            return Ok(0);
        };

        let removed = self.current.page(page).iter().filter(|a| ids.contains(&a.id)).count();
        if removed == 0 {
            warn!("delete of unknown annotation {} on page {}", first, page);
            return Err(StoreError::UnknownAnnotation { id: first, page });
        }

        let mut next = self.current.clone();
        next.page_mut(page).retain(|a| !ids.contains(&a.id));
        if self.selection.is_some_and(|id| ids.contains(&id)) {
            self.selection = None;
        }
        self.commit(next);

        debug!("deleted {} annotation(s) on page {}", removed, page);
        Ok(removed)
    }

    /// Install `state` wholesale as one undoable step
    pub fn replace_all(&mut self, state: PageAnnotationMap) {
        debug!("replacing state with {} annotations", state.len());
        self.commit(state);
    }

    /// Empty the map and forget all history
    pub fn clear(&mut self) {
        self.current = PageAnnotationMap::new();
        self.history.clear();
        self.selection = None;
        self.notify();
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.current);
        if changed {
            self.after_change();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.current);
        if changed {
            self.after_change();
        }
        changed
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> Option<AnnotationId> {
        self.selection
    }

    /// Select an annotation. Ids not present in the store are ignored.
    pub fn select(&mut self, id: AnnotationId) {
        if self.current.contains(id) {
            self.selection = Some(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Topmost annotation under `point` on `page`, skipping ones `is_visible` rejects
    pub fn hit_test(
        &self,
        page: PageNumber,
        point: &PageCoordinate,
        handle_size: f64,
        is_visible: impl Fn(&Annotation) -> bool,
    ) -> Option<(&Annotation, HandleAction)> {
        manipulation::hit_test(self.current.page(page), point, handle_size, is_visible)
    }

    fn commit(&mut self, next: PageAnnotationMap) {
        self.history.commit(&mut self.current, next);
        self.after_change();
    }

    fn after_change(&mut self) {
        if let Some(id) = self.selection {
            if !self.current.contains(id) {
                self.selection = None;
            }
        }
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.state_changed(&self.current);
        }
    }
}
