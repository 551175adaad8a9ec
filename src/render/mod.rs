//! Rendering helpers
//!
//! This module contains:
//! - Shared arrow geometry (overlay and saved images)
//! - Overlay geometry for the host to draw over the image
//! - tiny-skia image operations for saved results

pub mod geometry;
pub mod image;
pub mod overlay;
