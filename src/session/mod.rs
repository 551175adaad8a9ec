//! Annotation session management module
//!
//! This module contains:
//! - Session state: displayed image, edit mode, crop and arrow models
//! - Message types for pointer interactions and their feedback

pub mod messages;
pub mod state;
