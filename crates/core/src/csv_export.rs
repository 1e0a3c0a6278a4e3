//! CSV export of annotations
//!
//! One row per annotation, pages ascending and insertion order within a page,
//! for spreadsheets and downstream extraction pipelines.

use crate::annotation::{PageAnnotationMap, PageNumber};
use std::io::Write;

/// Error types for CSV export
#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CsvExportResult<T> = Result<T, CsvExportError>;

/// Configuration for CSV export
#[derive(Debug, Clone)]
pub struct CsvExportConfig {
    /// Include column headers in the output
    pub include_headers: bool,

    /// CSV delimiter character
    pub delimiter: u8,

    /// Export only these pages (None = all pages)
    pub page_filter: Option<Vec<PageNumber>>,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self { include_headers: true, delimiter: b',', page_filter: None }
    }
}

/// Export annotations to CSV format
///
/// CSV columns:
/// - Page: 1-based page number
/// - ID: Annotation identifier
/// - Label ID / Label Name: The label the box is tagged with
/// - Color: Label color as `#RRGGBB`
/// - X, Y, Width, Height: Box geometry in document units
pub fn export_annotations_csv<W: Write>(
    writer: W,
    annotations: &PageAnnotationMap,
    config: &CsvExportConfig,
) -> CsvExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.include_headers)
        .from_writer(writer);

    if config.include_headers {
        csv_writer.write_record([
            "Page",
            "ID",
            "Label ID",
            "Label Name",
            "Color",
            "X",
            "Y",
            "Width",
            "Height",
        ])?;
    }

    let rows = annotations.iter().filter(|(page, _)| {
        config.page_filter.as_ref().map_or(true, |pages| pages.contains(page))
    });

    for (page, annotation) in rows {
        csv_writer.write_record(&[
            page.to_string(),
            annotation.id.to_string(),
            annotation.label.id.clone(),
            annotation.label.name.clone(),
            annotation.label.color.to_hex_string(),
            annotation.x.to_string(),
            annotation.y.to_string(),
            annotation.width.to_string(),
            annotation.height.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
