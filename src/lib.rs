//! Crop and arrow annotation for curated image datasets
//!
//! This crate contains:
//! - Pure geometry and annotation types (`domain`)
//! - The annotation session and its state transitions (`session`, `annotations`)
//! - Overlay geometry and image rendering (`render`)
//! - Dataset storage and generation collaborators (`store`)
//! - The application controller, forms and gesture replay (`core`)

pub mod annotations;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod session;
pub mod store;
