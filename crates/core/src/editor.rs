//! Editing session
//!
//! Wires the gesture machine, label state and zoom to one [`AnnotationStore`].
//! Pointer input enters in client coordinates; keyboard input enters as
//! [`KeyCommand`]s already decoded by the shortcut layer.

use crate::annotation::{Annotation, AnnotationId, PageAnnotationMap, PageNumber};
use crate::config::EditorConfig;
use crate::geometry::{to_document_space, PageCoordinate};
use crate::interaction::{
    GestureContext, GestureEffect, GestureEvent, GestureState, InteractionMode, PointerTarget,
    TempAnnotation,
};
use crate::label::LabelState;
use crate::manipulation::HandleAction;
use crate::scale::Scale;
use crate::store::{AnnotationStore, SnapshotSink};
use crate::transfer::{export_as, import_json, ExportArtifact, ExportFormat, ExportResult, ImportResult};
use log::{debug, info, warn};

/// Keyboard commands understood by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Delete,
    Undo,
    Redo,
    NextLabel,
    PreviousLabel,
    /// Select the label bound to this key
    Shortcut(char),
}

pub struct AnnotationEditor {
    config: EditorConfig,
    store: AnnotationStore,
    gesture: GestureState,
    labels: LabelState,
    scale: Scale,
    container_origin: PageCoordinate,
    page: PageNumber,
    /// Page the active gesture started on; commits land here
    gesture_page: PageNumber,
}

impl AnnotationEditor {
    pub fn new(config: EditorConfig, labels: LabelState) -> Self {
        let store = AnnotationStore::with_history_limit(config.history_limit);
        Self {
            config,
            store,
            gesture: GestureState::Idle,
            labels,
            scale: Scale::default(),
            container_origin: PageCoordinate::default(),
            page: 1,
            gesture_page: 1,
        }
    }

    /// Install the persisted state without a history entry
    pub fn restore(&mut self, state: PageAnnotationMap) {
        self.store.restore(state);
    }

    pub fn set_sink(&mut self, sink: Box<dyn SnapshotSink>) {
        self.store.set_sink(sink);
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn labels(&self) -> &LabelState {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut LabelState {
        &mut self.labels
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn scale_mut(&mut self) -> &mut Scale {
        &mut self.scale
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }

    /// Page that subsequent gestures target. Page 0 is clamped to 1.
    ///
    /// A gesture already in progress still commits to the page it started on.
    pub fn set_page(&mut self, page: PageNumber) {
        self.page = page.max(1);
    }

    /// Client-space position of the page's top-left corner
    pub fn set_container_origin(&mut self, origin: PageCoordinate) {
        self.container_origin = origin;
    }

    pub fn mode(&self) -> InteractionMode {
        self.gesture.mode()
    }

    pub fn temp_annotation(&self) -> Option<TempAnnotation> {
        self.gesture.temp_annotation()
    }

    pub fn selection(&self) -> Option<AnnotationId> {
        self.store.selection()
    }

    /// Annotations on the current page whose label is visible, in render order
    pub fn visible_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.store
            .get_for_page(self.page)
            .iter()
            .filter(|a| self.labels.is_visible(&a.label.id))
    }

    fn to_document(&self, client: PageCoordinate) -> PageCoordinate {
        to_document_space(client, self.container_origin, self.scale.value())
    }

    /// Pointer-down with the target resolved by hit testing the current page
    pub fn pointer_down_at(&mut self, client: PageCoordinate) -> Option<Annotation> {
        let position = self.to_document(client);
        let handle_size = self.config.handle_size / self.scale.value();
        let target = self
            .store
            .hit_test(self.page, &position, handle_size, |a| self.labels.is_visible(&a.label.id))
            .map(|(annotation, action)| PointerTarget { annotation: annotation.clone(), action });
        self.dispatch(GestureEvent::Down { position, target })
    }

    /// Pointer-down with an explicit target from the rendering layer
    pub fn pointer_down(
        &mut self,
        client: PageCoordinate,
        target: Option<(AnnotationId, HandleAction)>,
    ) -> Option<Annotation> {
        let position = self.to_document(client);
        let target = match target {
            Some((id, action)) => {
                let Some(annotation) = self.store.get_for_page(self.page).iter().find(|a| a.id == id)
                else {
                    warn!("pointer-down on unknown annotation {} on page {}", id, self.page);
                    return None;
                };
                Some(PointerTarget { annotation: annotation.clone(), action })
            }
            None => None,
        };
        self.dispatch(GestureEvent::Down { position, target })
    }

    pub fn pointer_move(&mut self, client: PageCoordinate) -> Option<Annotation> {
        let position = self.to_document(client);
        self.dispatch(GestureEvent::Move { position })
    }

    /// Finish the gesture; returns the committed annotation, if any
    pub fn pointer_up(&mut self) -> Option<Annotation> {
        self.dispatch(GestureEvent::Up)
    }

    pub fn pointer_leave(&mut self) -> Option<Annotation> {
        self.dispatch(GestureEvent::Leave)
    }

    fn dispatch(&mut self, event: GestureEvent) -> Option<Annotation> {
        let ctx = GestureContext::new(self.labels.selected_label())
            .with_min_resize_extent(self.config.min_resize_extent);
        let before = self.gesture.mode();
        let (next, effect) = std::mem::take(&mut self.gesture).step(event, &ctx);
        self.gesture = next;

        if before == InteractionMode::Idle && self.gesture.is_active() {
            self.gesture_page = self.page;
        }
        if before != self.gesture.mode() {
            debug!("gesture {:?} -> {:?}", before, self.gesture.mode());
        }

        effect.and_then(|effect| self.apply(effect))
    }

    fn apply(&mut self, effect: GestureEffect) -> Option<Annotation> {
        match effect {
            GestureEffect::Select(id) => {
                self.store.select(id);
                None
            }
            GestureEffect::Create(pending) => Some(self.store.create(pending, self.gesture_page)),
            GestureEffect::Update(annotation) => {
                match self.store.update(annotation.clone(), self.gesture_page) {
                    Ok(()) => Some(annotation),
                    Err(_) => None,
                }
            }
        }
    }

    /// Handle a decoded key press. Returns true if anything changed.
    pub fn handle_key(&mut self, command: KeyCommand) -> bool {
        match command {
            KeyCommand::Delete => self.delete_selection(),
            KeyCommand::Undo => self.store.undo(),
            KeyCommand::Redo => self.store.redo(),
            KeyCommand::NextLabel => {
                self.labels.select_next();
                true
            }
            KeyCommand::PreviousLabel => {
                self.labels.select_previous();
                true
            }
            KeyCommand::Shortcut(key) => {
                let Some(id) = self.labels.catalog().by_shortcut(key).map(|l| l.id.clone()) else {
                    return false;
                };
                self.labels.select(&id)
            }
        }
    }

    /// Delete the selected annotation from whichever page holds it
    pub fn delete_selection(&mut self) -> bool {
        let Some(id) = self.store.selection() else {
            return false;
        };
        let deleted = match self.store.find(id).map(|(page, _)| page) {
            Some(page) => self.store.delete(&[id], page).is_ok(),
            None => false,
        };
        self.store.clear_selection();
        deleted
    }

    /// Parse `raw` and install it as one undoable step
    pub fn import_annotations(&mut self, raw: &str) -> ImportResult<()> {
        let state = import_json(raw)?;
        info!("importing {} annotations", state.len());
        self.store.replace_all(state);
        Ok(())
    }

    pub fn export(&self, format: ExportFormat) -> ExportResult<ExportArtifact> {
        export_as(format, self.store.state(), &self.config.export_base_name)
    }

    /// Drop everything, e.g. when a new document is loaded
    pub fn clear(&mut self) {
        info!("clearing annotations");
        self.gesture = GestureState::Idle;
        self.store.clear();
    }
}
