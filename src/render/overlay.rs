//! On-screen overlay geometry for the crop box and the arrow
//!
//! All positions are relative to the containing surface, so the host can
//! draw them without knowing where the image sits inside it.

use super::geometry::arrow;
use crate::domain::{ArrowPoints, Bounds, CoordinateMapper, CropPhase, EditMode, Point};

/// Arrow overlay: start marker, optional shaft end and head corners
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowOverlay {
    pub start: Point,
    pub end: Option<Point>,
    pub head: Option<[Point; 2]>,
}

/// Everything the host draws over the image
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayGeometry {
    pub crop: Option<Bounds>,
    pub arrow: Option<ArrowOverlay>,
}

impl OverlayGeometry {
    pub fn is_empty(&self) -> bool {
        self.crop.is_none() && self.arrow.is_none()
    }
}

/// Compute the overlay for the active mode
///
/// The crop box is already in display space and only needs the image offset.
/// Arrow points are natural pixels and go through the inverse scale first.
pub fn compute_overlay(
    mapper: &CoordinateMapper,
    image_offset: Point,
    mode: EditMode,
    crop: &CropPhase,
    points: &ArrowPoints,
) -> OverlayGeometry {
    match mode {
        EditMode::Crop => OverlayGeometry {
            crop: crop.selection().map(|sel| {
                let bounds = sel.bounds();
                Bounds {
                    left: bounds.left + image_offset.x,
                    top: bounds.top + image_offset.y,
                    ..bounds
                }
            }),
            arrow: None,
        },
        EditMode::Arrow => OverlayGeometry {
            crop: None,
            arrow: arrow_overlay(mapper, image_offset, points),
        },
    }
}

fn arrow_overlay(
    mapper: &CoordinateMapper,
    image_offset: Point,
    points: &ArrowPoints,
) -> Option<ArrowOverlay> {
    let to_screen = |p| mapper.to_display(p).offset(image_offset);

    let start = to_screen(points.start?);
    let end = points.end.map(to_screen);
    let head = end.and_then(|end| {
        let (x1, y1, x2, y2) =
            arrow::head_points(start.x, start.y, end.x, end.y, arrow::OVERLAY_HEAD_SIZE)?;
        Some([Point::new(x1, y1), Point::new(x2, y2)])
    });

    Some(ArrowOverlay { start, end, head })
}
