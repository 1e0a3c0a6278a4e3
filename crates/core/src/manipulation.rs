//! Manipulation handles and hit testing
//!
//! Every annotation exposes two interaction zones: a resize handle square at its
//! bottom-right corner and the box body, which moves the annotation.

use crate::annotation::Annotation;
use crate::geometry::{BoundingBox, PageCoordinate};

/// What a pointer-down on an annotation should start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleAction {
    Move,
    Resize,
}

/// Square resize handle inset into the bottom-right corner.
///
/// `handle_size` is in document units.
pub fn resize_handle(annotation: &Annotation, handle_size: f64) -> BoundingBox {
    let corner = annotation.bounds().normalized().far_corner();
    BoundingBox::new(corner.x - handle_size, corner.y - handle_size, handle_size, handle_size)
}

/// Classify a point against a single annotation
pub fn classify(
    annotation: &Annotation,
    point: &PageCoordinate,
    handle_size: f64,
) -> Option<HandleAction> {
    if resize_handle(annotation, handle_size).contains(point, 0.0) {
        Some(HandleAction::Resize)
    } else if annotation.bounds().contains(point, 0.0) {
        Some(HandleAction::Move)
    } else {
        None
    }
}

/// Find the topmost annotation under `point`.
///
/// Later annotations render on top, so the sequence is scanned back to front.
/// `is_hittable` lets the caller skip annotations whose label is hidden.
pub fn hit_test<'a>(
    annotations: &'a [Annotation],
    point: &PageCoordinate,
    handle_size: f64,
    is_hittable: impl Fn(&Annotation) -> bool,
) -> Option<(&'a Annotation, HandleAction)> {
    annotations
        .iter()
        .rev()
        .filter(|a| is_hittable(a))
        .find_map(|a| classify(a, point, handle_size).map(|action| (a, action)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationId, PendingAnnotation};
    use crate::label::{Color, Label};

    fn boxed(x: f64, y: f64, w: f64, h: f64, label_id: &str) -> Annotation {
        Annotation::from_pending(
            AnnotationId::new_v4(),
            PendingAnnotation::new(
                BoundingBox::new(x, y, w, h),
                Label::new(label_id, label_id, Color::rgb(0, 0, 0)),
            ),
        )
    }

    #[test]
    fn test_resize_handle_sits_in_corner() {
        let ann = boxed(10.0, 10.0, 40.0, 30.0, "a");
        assert_eq!(resize_handle(&ann, 6.0), BoundingBox::new(44.0, 34.0, 6.0, 6.0));
    }

    #[test]
    fn test_classify_zones() {
        let ann = boxed(10.0, 10.0, 40.0, 30.0, "a");
        assert_eq!(classify(&ann, &PageCoordinate::new(48.0, 38.0), 6.0), Some(HandleAction::Resize));
        assert_eq!(classify(&ann, &PageCoordinate::new(20.0, 20.0), 6.0), Some(HandleAction::Move));
        assert_eq!(classify(&ann, &PageCoordinate::new(60.0, 20.0), 6.0), None);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let below = boxed(0.0, 0.0, 100.0, 100.0, "a");
        let above = boxed(20.0, 20.0, 30.0, 30.0, "b");
        let page = vec![below.clone(), above.clone()];

        let (hit, _) = hit_test(&page, &PageCoordinate::new(25.0, 25.0), 4.0, |_| true).unwrap();
        assert_eq!(hit.id, above.id);

        let (hit, _) = hit_test(&page, &PageCoordinate::new(5.0, 5.0), 4.0, |_| true).unwrap();
        assert_eq!(hit.id, below.id);
    }

    #[test]
    fn test_hit_test_skips_hidden() {
        let below = boxed(0.0, 0.0, 100.0, 100.0, "a");
        let above = boxed(20.0, 20.0, 30.0, 30.0, "hidden");
        let page = vec![below.clone(), above];

        let (hit, _) =
            hit_test(&page, &PageCoordinate::new(25.0, 25.0), 4.0, |a| a.label.id != "hidden")
                .unwrap();
        assert_eq!(hit.id, below.id);
    }
}
