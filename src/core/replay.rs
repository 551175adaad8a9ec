//! Gesture scripts replayed against a running [`App`]
//!
//! A script is a JSON array of steps, each tagged by `op`:
//!
//! ```json
//! [
//!   { "op": "select", "path": "originals/cat.png",
//!     "layout": { "surface": { "left": 0, "top": 0, "width": 800, "height": 600 },
//!                 "image":   { "left": 0, "top": 0, "width": 800, "height": 600 } } },
//!   { "op": "pointer", "event": { "down": { "x": 100, "y": 100 } } },
//!   { "op": "pointer", "event": { "move": { "x": 300, "y": 250 } } },
//!   { "op": "pointer", "event": "up" },
//!   { "op": "confirm_crop" }
//! ]
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::app::{App, Panel};
use crate::domain::{Collection, EditMode, ImageLayout};
use crate::render::overlay::OverlayGeometry;
use crate::session::messages::PointerMsg;
use crate::store::LocalStore;

/// One scripted user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Display an image from the listing with a measured layout
    Select { path: String, layout: ImageLayout },
    Layout { layout: ImageLayout },
    Panel { panel: Panel },
    Mode { mode: EditMode },
    Pointer { event: PointerMsg },
    ConfirmCrop,
    CancelCrop,
    ClearArrow,
    SaveArrow,
    /// Save a typed tag for the displayed image
    Tag { text: String },
    Refresh,
    /// Print the crop box and arrow as the host would draw them
    Overlay,
    /// Enter or leave delete-select mode
    SelectMode,
    Mark { path: String },
    SelectAll { collection: Collection },
    ClearMarks,
    DeleteSelected,
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<Step>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Run every step in order; one line per step describes what it did
///
/// A failing step is reported and the script continues.
pub async fn replay(app: &mut App<LocalStore>, steps: Vec<Step>) -> Vec<String> {
    // Scripts drive the edit panel unless they pick another one
    app.set_panel(Panel::Edit);
    app.refresh().await;

    let mut report = Vec::with_capacity(steps.len());
    for (index, step) in steps.into_iter().enumerate() {
        let line = match run_step(app, step).await {
            Ok(outcome) => outcome,
            Err(err) => format!("error: {err:#}"),
        };
        log::debug!("step {index}: {line}");
        report.push(format!("{index}: {line}"));
    }
    report
}

async fn run_step(app: &mut App<LocalStore>, step: Step) -> anyhow::Result<String> {
    let outcome = match step {
        Step::Select { path, layout } => {
            let file = app
                .listing()
                .find(&path)
                .cloned()
                .with_context(|| format!("{path} is not in the listing"))?;
            let natural = app.store().natural_size(&path).await?;
            app.select_image(file, natural);
            app.set_layout(Some(layout));
            format!("selected {path} ({}x{})", natural.width, natural.height)
        }
        Step::Layout { layout } => {
            app.set_layout(Some(layout));
            "layout updated".to_string()
        }
        Step::Panel { panel } => {
            app.set_panel(panel);
            format!("{panel:?} panel")
        }
        Step::Mode { mode } => format!("{:?}", app.set_mode(mode)),
        Step::Pointer { event } => format!("{:?}", app.handle_pointer(event)),
        Step::ConfirmCrop => format!("{:?}", app.confirm_crop().await?),
        Step::CancelCrop => format!("{:?}", app.cancel_crop()),
        Step::ClearArrow => format!("{:?}", app.clear_arrow()),
        Step::SaveArrow => format!("{:?}", app.save_arrow().await?),
        Step::Tag { text } => {
            app.tags.manual_text = text;
            app.save_manual_tag().await?;
            "tag saved".to_string()
        }
        Step::Refresh => {
            app.refresh().await;
            format!("{} images", app.listing().len())
        }
        Step::Overlay => describe_overlay(&app.overlay_geometry()),
        Step::SelectMode => {
            app.browser.toggle_select_mode();
            if app.browser.select_mode() {
                "select mode on".to_string()
            } else {
                "select mode off".to_string()
            }
        }
        Step::Mark { path } => {
            anyhow::ensure!(app.browser.select_mode(), "not in select mode");
            anyhow::ensure!(
                app.listing().find(&path).is_some(),
                "{path} is not in the listing"
            );
            if app.browser.toggle(&path) {
                format!("marked {path}")
            } else {
                format!("unmarked {path}")
            }
        }
        Step::SelectAll { collection } => {
            anyhow::ensure!(app.browser.select_mode(), "not in select mode");
            app.select_all(collection);
            format!("{} marked", app.browser.count())
        }
        Step::ClearMarks => {
            app.browser.clear();
            "marks cleared".to_string()
        }
        Step::DeleteSelected => match app.delete_selected().await? {
            Some(report) => format!(
                "deleted {}, failed {}",
                report.deleted.len(),
                report.failed.len()
            ),
            None => "nothing marked".to_string(),
        },
    };
    Ok(outcome)
}

fn describe_overlay(overlay: &OverlayGeometry) -> String {
    if overlay.is_empty() {
        return "no overlay".to_string();
    }
    let mut parts = Vec::new();
    if let Some(crop) = overlay.crop {
        parts.push(format!(
            "crop at ({:.1}, {:.1}) size {:.1}x{:.1}",
            crop.left, crop.top, crop.width, crop.height
        ));
    }
    if let Some(arrow) = overlay.arrow {
        let mut line = format!("arrow from ({:.1}, {:.1})", arrow.start.x, arrow.start.y);
        if let Some(end) = arrow.end {
            line.push_str(&format!(" to ({:.1}, {:.1})", end.x, end.y));
        }
        parts.push(line);
    }
    parts.join("; ")
}
