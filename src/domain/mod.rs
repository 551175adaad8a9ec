//! Pure domain types with minimal dependencies
//!
//! This module contains core types used throughout the application.
//! Types here should have no dependency on the store, the renderer or the
//! runtime so every other layer can build on them.

pub mod annotation;
pub mod dataset;
pub mod geometry;
pub mod selection;

pub use annotation::*;
pub use dataset::*;
pub use geometry::*;
pub use selection::*;
