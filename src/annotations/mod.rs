//! Crop and arrow annotation transitions
//!
//! This module provides:
//! - Crop selection drag/confirm/commit handlers
//! - Arrow point placement handlers

pub mod handlers;
