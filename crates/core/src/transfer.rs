//! Import and export of the full annotation state
//!
//! JSON is the structural serialization of [`PageAnnotationMap`]:
//! `{ "<page>": [ { id, x, y, width, height, label: { id, name, color, shortcut? } } ] }`.
//! The same format is used for export, import and the persisted snapshot.

use crate::annotation::{AnnotationId, PageAnnotationMap};
use crate::csv_export::{export_annotations_csv, CsvExportConfig, CsvExportError};
use log::info;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error types for import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("malformed annotation file: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("invalid page number {0}, pages start at 1")]
    InvalidPage(u32),

    #[error("annotation {id} has negative or non-finite geometry")]
    InvalidGeometry { id: AnnotationId },

    #[error("annotation id {id} appears more than once")]
    DuplicateId { id: AnnotationId },
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Error types for export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] CsvExportError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("export format '{0}' is not supported yet")]
    UnsupportedFormat(ExportFormat),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Declared export formats.
///
/// `Xml` and `Coco` are reserved names without a writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Coco,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Coco => "coco",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::Coco => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "coco" => Ok(ExportFormat::Coco),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// A serialized export ready to be saved or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `<base>.<extension>`
    pub file_name: String,
    pub media_type: &'static str,
    pub contents: Vec<u8>,
}

impl ExportArtifact {
    /// Write into `dir` atomically (temp file + rename), returning the final path
    pub fn write_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &self.contents)?;
        fs::rename(&temp_path, &path)?;
        info!("exported {} bytes to {}", self.contents.len(), path.display());
        Ok(path)
    }
}

/// Pretty-printed JSON of the full state
pub fn export_json(state: &PageAnnotationMap) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Serialize the full state in `format` under `<base_name>.<ext>`
pub fn export_as(
    format: ExportFormat,
    state: &PageAnnotationMap,
    base_name: &str,
) -> ExportResult<ExportArtifact> {
    let contents = match format {
        ExportFormat::Json => export_json(state)?.into_bytes(),
        ExportFormat::Csv => {
            let mut out = Vec::new();
            export_annotations_csv(&mut out, state, &CsvExportConfig::default())?;
            out
        }
        ExportFormat::Xml | ExportFormat::Coco => {
            return Err(ExportError::UnsupportedFormat(format));
        }
    };

    Ok(ExportArtifact {
        file_name: format!("{base_name}.{}", format.extension()),
        media_type: format.media_type(),
        contents,
    })
}

/// Parse and validate an exported JSON state
pub fn import_json(raw: &str) -> ImportResult<PageAnnotationMap> {
    let state: PageAnnotationMap = serde_json::from_str(raw)?;
    validate(&state)?;
    Ok(state)
}

/// Check a decoded state before it is installed.
///
/// Pages start at 1, extents are finite and non-negative, and ids are unique
/// across all pages.
pub fn validate(state: &PageAnnotationMap) -> ImportResult<()> {
    if let Some(page) = state.page_numbers().find(|&p| p == 0) {
        return Err(ImportError::InvalidPage(page));
    }

    let mut seen = HashSet::with_capacity(state.len());
    for (_, annotation) in state.iter() {
        if !seen.insert(annotation.id) {
            return Err(ImportError::DuplicateId { id: annotation.id });
        }

        let geometry = [annotation.x, annotation.y, annotation.width, annotation.height];
        if geometry.iter().any(|v| !v.is_finite())
            || annotation.width < 0.0
            || annotation.height < 0.0
        {
            return Err(ImportError::InvalidGeometry { id: annotation.id });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, PendingAnnotation};
    use crate::geometry::BoundingBox;
    use crate::label::{Color, Label};

    fn sample() -> PageAnnotationMap {
        let label = Label::new("bank_name", "Bank Name", Color::from_hex(0x96CEB4));
        let keyed = label.clone().with_shortcut('b');
        let make = |x: f64, label: &Label| {
            Annotation::from_pending(
                AnnotationId::new_v4(),
                PendingAnnotation::new(BoundingBox::new(x, 0.1 + x, 40.25, 1.0 / 3.0), label.clone()),
            )
        };
        let mut map = PageAnnotationMap::new();
        map.page_mut(1).push(make(10.0, &label));
        map.page_mut(1).push(make(11.5, &keyed));
        map.page_mut(3).push(make(0.0, &label));
        map.page_mut(4);
        map
    }

    #[test]
    fn test_json_round_trip() {
        let state = sample();
        let json = export_json(&state).unwrap();
        assert_eq!(import_json(&json).unwrap(), state);
    }

    #[test]
    fn test_json_is_pretty() {
        let json = export_json(&sample()).unwrap();
        assert!(json.contains("\n  \"1\": ["));
    }

    #[test]
    fn test_export_as_names_artifact() {
        let artifact = export_as(ExportFormat::Json, &sample(), "statement").unwrap();
        assert_eq!(artifact.file_name, "statement.json");
        assert_eq!(artifact.media_type, "application/json");

        let csv = export_as(ExportFormat::Csv, &sample(), "statement").unwrap();
        assert_eq!(csv.file_name, "statement.csv");
        assert_eq!(String::from_utf8(csv.contents).unwrap().lines().count(), 4);
    }

    #[test]
    fn test_reserved_formats_are_rejected() {
        for format in [ExportFormat::Xml, ExportFormat::Coco] {
            let err = export_as(format, &sample(), "x").unwrap_err();
            assert!(matches!(err, ExportError::UnsupportedFormat(f) if f == format));
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(matches!(import_json("not json"), Err(ImportError::MalformedInput(_))));
        assert!(matches!(import_json("[1, 2, 3]"), Err(ImportError::MalformedInput(_))));
        assert!(matches!(
            import_json(r#"{"1": [{"id": "nope", "x": 0}]}"#),
            Err(ImportError::MalformedInput(_))
        ));
        assert!(matches!(import_json(r#"{"one": []}"#), Err(ImportError::MalformedInput(_))));
    }

    #[test]
    fn test_import_rejects_bad_color() {
        let raw = r##"{"1": [{"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "x": 0, "y": 0,
            "width": 1, "height": 1,
            "label": {"id": "a", "name": "A", "color": "red"}}]}"##;
        assert!(matches!(import_json(raw), Err(ImportError::MalformedInput(_))));
    }

    #[test]
    fn test_import_rejects_page_zero() {
        assert!(matches!(import_json(r#"{"0": []}"#), Err(ImportError::InvalidPage(0))));
    }

    #[test]
    fn test_import_rejects_negative_extent() {
        let raw = r##"{"2": [{"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "x": 0, "y": 0,
            "width": -5, "height": 1,
            "label": {"id": "a", "name": "A", "color": "#000000"}}]}"##;
        assert!(matches!(import_json(raw), Err(ImportError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_import_rejects_repeated_id() {
        let entry = r##"{"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "x": 0, "y": 0,
            "width": 1, "height": 1, "label": {"id": "a", "name": "A", "color": "#000000"}}"##;
        let raw = format!(r#"{{"1": [{entry}, {entry}], "2": [{entry}]}}"#);
        assert!(matches!(
            import_json(&raw),
            Err(ImportError::DuplicateId { id }) if id.to_string() == "67e55044-10b1-426f-9247-bb680e5fe0c8"
        ));

        let across_pages = format!(r#"{{"1": [{entry}], "2": [{entry}]}}"#);
        assert!(matches!(import_json(&across_pages), Err(ImportError::DuplicateId { .. })));
    }

    #[test]
    fn test_validate_accepts_exported_state() {
        assert!(validate(&sample()).is_ok());
    }

    #[test]
    fn test_import_accepts_integers_and_shortcut() {
        let raw = r##"{"2": [{"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "x": 3, "y": 4,
            "width": 5, "height": 6,
            "label": {"id": "a", "name": "A", "color": "#0000FF", "shortcut": "1"}}]}"##;
        let state = import_json(raw).unwrap();
        let ann = &state.page(2)[0];
        assert_eq!(ann.bounds(), BoundingBox::new(3.0, 4.0, 5.0, 6.0));
        assert_eq!(ann.label.shortcut, Some('1'));
        assert_eq!(ann.label.color, Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_write_to_dir() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let state = sample();
        let artifact = export_as(ExportFormat::Json, &state, "annotations").unwrap();
        let path = artifact.write_to(temp.path()).unwrap();

        assert_eq!(path, temp.path().join("annotations.json"));
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(import_json(&raw).unwrap(), state);
    }
}
