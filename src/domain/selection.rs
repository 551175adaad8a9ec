//! Crop selection types and the edit mode switch

use serde::{Deserialize, Serialize};

use super::geometry::{Bounds, Point};

/// Crop rectangle as dragged, in display space
///
/// Start and end may be in either order; use [`SelectionBox::bounds`] for the
/// normalized box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectionBox {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl SelectionBox {
    /// Zero-sized box anchored at a point
    pub fn at(point: Point) -> Self {
        Self {
            start_x: point.x,
            start_y: point.y,
            end_x: point.x,
            end_y: point.y,
        }
    }

    pub fn width(&self) -> f32 {
        (self.end_x - self.start_x).abs()
    }

    pub fn height(&self) -> f32 {
        (self.end_y - self.start_y).abs()
    }

    /// Normalized top-left origin and size
    pub fn bounds(&self) -> Bounds {
        Bounds {
            left: self.start_x.min(self.end_x),
            top: self.start_y.min(self.end_y),
            width: self.width(),
            height: self.height(),
        }
    }

    /// Both sides strictly larger than `min_size`
    pub fn exceeds(&self, min_size: f32) -> bool {
        self.width() > min_size && self.height() > min_size
    }
}

/// Lifecycle of the crop selection
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CropPhase {
    #[default]
    Idle,
    /// Pointer is down and the box follows it
    Drawing(SelectionBox),
    /// Drag finished with a large enough box; waiting for confirm or cancel
    PendingConfirm(SelectionBox),
    /// Confirmed and handed to the store; waiting for the result
    Committing(SelectionBox),
}

impl CropPhase {
    pub fn selection(&self) -> Option<&SelectionBox> {
        match self {
            CropPhase::Idle => None,
            CropPhase::Drawing(sel) | CropPhase::PendingConfirm(sel) | CropPhase::Committing(sel) => {
                Some(sel)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CropPhase::Idle)
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, CropPhase::Drawing(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CropPhase::PendingConfirm(_))
    }

    pub fn is_committing(&self) -> bool {
        matches!(self, CropPhase::Committing(_))
    }
}

/// Which model receives pointer input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Crop,
    Arrow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_normalizes_reversed_drag() {
        let sel = SelectionBox {
            start_x: 300.0,
            start_y: 250.0,
            end_x: 100.0,
            end_y: 100.0,
        };
        assert_eq!(sel.bounds(), Bounds::new(100.0, 100.0, 200.0, 150.0));
    }

    #[test]
    fn test_exceeds_is_strict_on_both_axes() {
        let mut sel = SelectionBox::at(Point::new(0.0, 0.0));
        sel.end_x = 10.0;
        sel.end_y = 50.0;
        assert!(!sel.exceeds(10.0));
        sel.end_x = 10.5;
        assert!(sel.exceeds(10.0));
        sel.end_y = -10.0;
        assert!(!sel.exceeds(10.0));
    }

    #[test]
    fn test_phase_selection_access() {
        let sel = SelectionBox::at(Point::new(1.0, 2.0));
        assert!(CropPhase::Idle.selection().is_none());
        assert_eq!(CropPhase::Drawing(sel).selection(), Some(&sel));
        assert!(CropPhase::PendingConfirm(sel).is_pending());
        assert!(CropPhase::Committing(sel).is_committing());
    }
}
