//! Core application module
//!
//! This module contains:
//! - Application state over a dataset store, with commit recovery
//! - File browser selection and panel forms
//! - Scripted gesture replay for the command line

pub mod app;
pub mod files;
pub mod forms;
pub mod replay;
