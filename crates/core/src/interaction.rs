//! Pointer gesture state machine
//!
//! Turns pointer-down/move/up events into at most one store mutation per
//! gesture. The machine is a pure transition over [`GestureState`]: it never
//! touches the store itself, it returns a [`GestureEffect`] for the caller to
//! apply. The in-progress preview is held in the state and is only used for
//! rendering until the gesture ends.

use crate::annotation::{Annotation, AnnotationId, PendingAnnotation};
use crate::geometry::{BoundingBox, PageCoordinate};
use crate::label::Label;
use crate::manipulation::HandleAction;

/// Default floor for resized width and height, in document units
pub const MIN_RESIZE_EXTENT: f64 = 10.0;

/// Coarse interaction mode, for renderers and cursors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Idle,
    Drawing,
    Moving,
    Resizing,
}

/// The annotation a pointer-down landed on, and which zone
#[derive(Debug, Clone, PartialEq)]
pub struct PointerTarget {
    pub annotation: Annotation,
    pub action: HandleAction,
}

/// Pointer input in document space
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Down { position: PageCoordinate, target: Option<PointerTarget> },
    Move { position: PageCoordinate },
    Up,
    /// Pointer left the surface; finishes the gesture like `Up`
    Leave,
}

/// Read-only inputs from collaborators
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub selected_label: Option<&'a Label>,
    pub min_resize_extent: f64,
}

impl<'a> GestureContext<'a> {
    pub fn new(selected_label: Option<&'a Label>) -> Self {
        Self { selected_label, min_resize_extent: MIN_RESIZE_EXTENT }
    }

    pub fn with_min_resize_extent(mut self, extent: f64) -> Self {
        self.min_resize_extent = extent;
        self
    }
}

/// Mutation requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    Select(AnnotationId),
    Create(PendingAnnotation),
    Update(Annotation),
}

/// Uncommitted preview box; extents may be negative while drawing
#[derive(Debug, Clone, PartialEq)]
pub struct TempAnnotation {
    /// Set when editing an existing annotation
    pub id: Option<AnnotationId>,
    pub bounds: BoundingBox,
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing {
        anchor: PageCoordinate,
        label: Label,
        preview: Option<BoundingBox>,
    },
    Moving {
        target: Annotation,
        /// Pointer position relative to the target's top-left at pointer-down
        offset: PageCoordinate,
        preview: Option<BoundingBox>,
    },
    Resizing {
        target: Annotation,
        preview: Option<BoundingBox>,
    },
}

impl GestureState {
    pub fn mode(&self) -> InteractionMode {
        match self {
            GestureState::Idle => InteractionMode::Idle,
            GestureState::Drawing { .. } => InteractionMode::Drawing,
            GestureState::Moving { .. } => InteractionMode::Moving,
            GestureState::Resizing { .. } => InteractionMode::Resizing,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, GestureState::Idle)
    }

    /// Preview of the gesture in progress, if the pointer has moved
    pub fn temp_annotation(&self) -> Option<TempAnnotation> {
        match self {
            GestureState::Idle => None,
            GestureState::Drawing { label, preview, .. } => preview.map(|bounds| TempAnnotation {
                id: None,
                bounds,
                label: label.clone(),
            }),
            GestureState::Moving { target, preview, .. }
            | GestureState::Resizing { target, preview } => preview.map(|bounds| TempAnnotation {
                id: Some(target.id),
                bounds,
                label: target.label.clone(),
            }),
        }
    }

    /// Apply one event, returning the next state and any requested mutation.
    ///
    /// Events that do not apply to the current state leave it unchanged.
    pub fn step(
        self,
        event: GestureEvent,
        ctx: &GestureContext<'_>,
    ) -> (GestureState, Option<GestureEffect>) {
        match (self, event) {
            (GestureState::Idle, GestureEvent::Down { position, target }) => {
                Self::begin(position, target, ctx)
            }

            (GestureState::Drawing { anchor, label, .. }, GestureEvent::Move { position }) => {
                let preview = Some(BoundingBox::from_corners(anchor, position));
                (GestureState::Drawing { anchor, label, preview }, None)
            }

            (GestureState::Moving { target, offset, .. }, GestureEvent::Move { position }) => {
                let origin = position.offset_from(&offset);
                let preview = Some(target.bounds().translated_to(origin));
                (GestureState::Moving { target, offset, preview }, None)
            }

            (GestureState::Resizing { target, .. }, GestureEvent::Move { position }) => {
                let width = (position.x - target.x).max(ctx.min_resize_extent);
                let height = (position.y - target.y).max(ctx.min_resize_extent);
                let preview = Some(BoundingBox::new(target.x, target.y, width, height));
                (GestureState::Resizing { target, preview }, None)
            }

            (state, GestureEvent::Up | GestureEvent::Leave) => (GestureState::Idle, state.finish()),

            (state, _) => (state, None),
        }
    }

    fn begin(
        position: PageCoordinate,
        target: Option<PointerTarget>,
        ctx: &GestureContext<'_>,
    ) -> (GestureState, Option<GestureEffect>) {
        match target {
            Some(PointerTarget { annotation, action: HandleAction::Move }) => {
                let id = annotation.id;
                let offset = position.offset_from(&annotation.origin());
                (
                    GestureState::Moving { target: annotation, offset, preview: None },
                    Some(GestureEffect::Select(id)),
                )
            }
            Some(PointerTarget { annotation, action: HandleAction::Resize }) => {
                let id = annotation.id;
                (
                    GestureState::Resizing { target: annotation, preview: None },
                    Some(GestureEffect::Select(id)),
                )
            }
            None => match ctx.selected_label {
                Some(label) => (
                    GestureState::Drawing { anchor: position, label: label.clone(), preview: None },
                    None,
                ),
                None => (GestureState::Idle, None),
            },
        }
    }

    /// Commit-or-discard at the end of a gesture
    fn finish(self) -> Option<GestureEffect> {
        match self {
            GestureState::Idle => None,
            GestureState::Drawing { label, preview, .. } => preview
                .map(|bounds| GestureEffect::Create(PendingAnnotation::new(bounds.normalized(), label))),
            GestureState::Moving { target, preview, .. }
            | GestureState::Resizing { target, preview } => {
                preview.map(|bounds| GestureEffect::Update(target.with_bounds(bounds.normalized())))
            }
        }
    }
}
