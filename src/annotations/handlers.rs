//! Annotation state transitions
//!
//! Applies CropAction and ArrowAction to their models. Coordinate mapping and
//! mode gating happen in the session before these are called.

use crate::domain::{ArrowPoints, CropPhase, SelectionBox};
use crate::session::messages::{ArrowAction, CropAction, Feedback};

// ============================================================================
// Crop handlers
// ============================================================================

/// Apply a crop action
///
/// `min_size` is the display-space side length a finished box must exceed on
/// both axes.
pub fn handle_crop(phase: &mut CropPhase, action: CropAction, min_size: f32) -> Feedback {
    match action {
        CropAction::Start(at) => {
            if phase.is_committing() {
                return Feedback::Ignored;
            }
            *phase = CropPhase::Drawing(SelectionBox::at(at));
            Feedback::CropStarted
        }
        CropAction::Update(to) => match phase {
            CropPhase::Drawing(sel) => {
                sel.end_x = to.x;
                sel.end_y = to.y;
                Feedback::CropResized
            }
            _ => Feedback::Ignored,
        },
        CropAction::Finish => {
            let CropPhase::Drawing(sel) = *phase else {
                return Feedback::Ignored;
            };
            if sel.exceeds(min_size) {
                *phase = CropPhase::PendingConfirm(sel);
                Feedback::CropPending(sel)
            } else {
                log::debug!(
                    "Discarding crop {:.1}x{:.1}, not above {min_size}px",
                    sel.width(),
                    sel.height()
                );
                *phase = CropPhase::Idle;
                Feedback::CropDiscarded
            }
        }
        CropAction::Cancel => {
            if phase.is_pending() {
                *phase = CropPhase::Idle;
                Feedback::CropCancelled
            } else {
                Feedback::Ignored
            }
        }
    }
}

/// Move a pending box into the committing state and return it
pub fn begin_crop_commit(phase: &mut CropPhase) -> Option<SelectionBox> {
    let CropPhase::PendingConfirm(sel) = *phase else {
        return None;
    };
    *phase = CropPhase::Committing(sel);
    Some(sel)
}

/// Resolve a commit: success clears the box, failure puts it back for retry
pub fn settle_crop_commit(phase: &mut CropPhase, succeeded: bool) -> Feedback {
    let CropPhase::Committing(sel) = *phase else {
        return Feedback::Ignored;
    };
    if succeeded {
        *phase = CropPhase::Idle;
        Feedback::CropCommitted
    } else {
        *phase = CropPhase::PendingConfirm(sel);
        Feedback::CropRestored
    }
}

// ============================================================================
// Arrow handlers
// ============================================================================

/// Apply an arrow action
///
/// Clicks fill start, then end; a click with both present starts over from
/// the new point.
pub fn handle_arrow(points: &mut ArrowPoints, action: ArrowAction) -> Feedback {
    match action {
        ArrowAction::Place(at) => match (points.start, points.end) {
            (None, _) => {
                points.start = Some(at);
                points.end = None;
                Feedback::ArrowStarted(at)
            }
            (Some(_), None) => {
                points.end = Some(at);
                Feedback::ArrowCompleted(at)
            }
            (Some(_), Some(_)) => {
                points.start = Some(at);
                points.end = None;
                Feedback::ArrowRestarted(at)
            }
        },
        ArrowAction::Clear => {
            *points = ArrowPoints::default();
            Feedback::ArrowCleared
        }
    }
}
