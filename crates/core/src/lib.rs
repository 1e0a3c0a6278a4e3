//! Pagemark Core Library
//!
//! Annotation model, undoable store and pointer gesture machine for labelling
//! regions of document pages.

pub mod annotation;
pub mod config;
pub mod csv_export;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod label;
pub mod manipulation;
pub mod scale;
pub mod store;
pub mod transfer;

pub use annotation::{Annotation, AnnotationId, PageAnnotationMap, PageNumber, PendingAnnotation};
pub use config::{ConfigError, EditorConfig};
pub use csv_export::{export_annotations_csv, CsvExportConfig, CsvExportError, CsvExportResult};
pub use editor::{AnnotationEditor, KeyCommand};
pub use geometry::{normalize, to_document_space, BoundingBox, PageCoordinate};
pub use history::History;
pub use interaction::{
    GestureContext, GestureEffect, GestureEvent, GestureState, InteractionMode, PointerTarget,
    TempAnnotation, MIN_RESIZE_EXTENT,
};
pub use label::{Color, ColorParseError, Label, LabelCatalog, LabelCategory, LabelState};
pub use manipulation::{hit_test, HandleAction};
pub use scale::Scale;
pub use store::{AnnotationStore, SnapshotSink, StoreError, StoreResult};
pub use transfer::{
    export_as, export_json, import_json, ExportArtifact, ExportError, ExportFormat, ExportResult,
    ImportError, ImportResult, validate as validate_state,
};
