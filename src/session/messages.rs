//! Message types for the annotation session
//!
//! This module contains:
//! - Pointer input as delivered by the host surface
//! - Per-model actions after coordinate mapping
//! - Feedback describing what a message did

use serde::{Deserialize, Serialize};

use crate::domain::{EditMode, PixelPoint, Point, SelectionBox};

// ============================================================================
// Pointer Input
// ============================================================================

/// Pointer input over the image surface, in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerMsg {
    /// Primary button pressed
    Down(Point),
    /// Pointer moved
    Move(Point),
    /// Primary button released; the box keeps its last moved-to end
    Up,
    /// Pointer left the surface; treated like a release
    Leave,
    /// Primary button clicked
    Click(Point),
}

// ============================================================================
// Model Actions
// ============================================================================

/// Crop selection actions, positions already clamped into display space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropAction {
    /// Begin a new box at position
    Start(Point),
    /// Move the box's end to position
    Update(Point),
    /// Release: keep the box if large enough, otherwise drop it
    Finish,
    /// Drop a box waiting for confirmation
    Cancel,
}

/// Arrow actions, positions already in natural pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowAction {
    /// Place the next point
    Place(PixelPoint),
    /// Remove both points
    Clear,
}

// ============================================================================
// Feedback
// ============================================================================

/// What a message changed, for the caller to reflect in its UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    /// Nothing changed: wrong mode, no image, not measurable, or locked
    Ignored,
    ModeChanged(EditMode),
    CropStarted,
    CropResized,
    /// Drag finished with a box large enough to confirm
    CropPending(SelectionBox),
    /// Drag finished with a box too small; nothing to confirm
    CropDiscarded,
    CropCancelled,
    CropCommitted,
    /// Commit failed; the box waits for confirmation again
    CropRestored,
    ArrowStarted(PixelPoint),
    ArrowCompleted(PixelPoint),
    /// A third click replaced both points with a new start
    ArrowRestarted(PixelPoint),
    ArrowCleared,
}

impl Feedback {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Feedback::Ignored)
    }
}
