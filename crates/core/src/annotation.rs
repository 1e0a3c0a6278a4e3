//! Annotation data model
//!
//! An annotation is one labeled bounding box on one page. Annotations are stored
//! per page in a [`PageAnnotationMap`], which is the entire persisted state of
//! the editor.

use crate::geometry::{BoundingBox, PageCoordinate};
use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Unique identifier for an annotation
///
/// Assigned by the store at creation, never by the caller.
pub type AnnotationId = uuid::Uuid;

/// 1-based page number
pub type PageNumber = u32;

/// A labeled box that has not been committed yet (no id)
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnnotation {
    pub bounds: BoundingBox,
    pub label: Label,
}

impl PendingAnnotation {
    pub fn new(bounds: BoundingBox, label: Label) -> Self {
        Self { bounds, label }
    }
}

/// A committed annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: Label,
}

impl Annotation {
    /// Attach an id to a pending annotation
    pub fn from_pending(id: AnnotationId, pending: PendingAnnotation) -> Self {
        let PendingAnnotation { bounds, label } = pending;
        Self { id, x: bounds.x, y: bounds.y, width: bounds.width, height: bounds.height, label }
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    /// Copy with new geometry, keeping id and label
    pub fn with_bounds(&self, bounds: BoundingBox) -> Self {
        Self {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            ..self.clone()
        }
    }

    pub fn origin(&self) -> PageCoordinate {
        PageCoordinate::new(self.x, self.y)
    }
}

/// Annotations keyed by page, each page in insertion order.
///
/// Page sequences are shared between clones and copied on write, so a cloned
/// map is an independent snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageAnnotationMap {
    pages: BTreeMap<PageNumber, Arc<Vec<Annotation>>>,
}

impl PageAnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotations on `page`; empty when the page has none
    pub fn page(&self, page: PageNumber) -> &[Annotation] {
        self.pages.get(&page).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// Mutable access to a page's sequence, creating it and unsharing it as needed
    pub fn page_mut(&mut self, page: PageNumber) -> &mut Vec<Annotation> {
        Arc::make_mut(self.pages.entry(page).or_default())
    }

    /// Page numbers with an entry (possibly empty), ascending
    pub fn page_numbers(&self) -> impl Iterator<Item = PageNumber> + '_ {
        self.pages.keys().copied()
    }

    /// All annotations with their page, pages ascending
    pub fn iter(&self) -> impl Iterator<Item = (PageNumber, &Annotation)> {
        self.pages
            .iter()
            .flat_map(|(page, annotations)| annotations.iter().map(move |a| (*page, a)))
    }

    pub fn find(&self, id: AnnotationId) -> Option<(PageNumber, &Annotation)> {
        self.iter().find(|(_, a)| a.id == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.find(id).is_some()
    }

    /// Total annotation count across pages
    pub fn len(&self) -> usize {
        self.pages.values().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `page` shares storage with the same page in `other`
    pub fn shares_page_with(&self, other: &PageAnnotationMap, page: PageNumber) -> bool {
        match (self.pages.get(&page), other.pages.get(&page)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl FromIterator<(PageNumber, Vec<Annotation>)> for PageAnnotationMap {
    fn from_iter<T: IntoIterator<Item = (PageNumber, Vec<Annotation>)>>(iter: T) -> Self {
        Self { pages: iter.into_iter().map(|(page, list)| (page, Arc::new(list))).collect() }
    }
}
