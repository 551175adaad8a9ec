//! Dataset storage and generation collaborators
//!
//! This module contains:
//! - `DatasetStore`: listing, cropping, arrow burning, tags and deletion
//! - `Generator`: AI image and tag generation
//! - `LocalStore`: a `DatasetStore` over a directory on disk

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{ArrowRequest, CropRequest, ImageListing, TagRequest};

pub mod local;

pub use local::LocalStore;

/// Path of an image written by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedImage {
    pub path: String,
}

/// Outcome of a batch delete; every requested path lands in one list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Persistent home of the dataset images
#[allow(async_fn_in_trait)]
pub trait DatasetStore {
    async fn list_images(&self) -> anyhow::Result<ImageListing>;

    /// Write the cropped region as a new image in `datasets`
    async fn cut_image(&self, request: CropRequest) -> anyhow::Result<SavedImage>;

    /// Burn an arrow into the image
    ///
    /// Sources in `originals` produce a new file in `datasets`; sources in
    /// `datasets` are overwritten in place.
    async fn save_arrow_image(&self, request: ArrowRequest) -> anyhow::Result<SavedImage>;

    async fn save_tag(&self, request: TagRequest) -> anyhow::Result<()>;

    async fn delete_images(&self, paths: Vec<String>) -> anyhow::Result<DeleteReport>;
}

/// Image generation model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageModel {
    #[default]
    Gemini,
    Flux,
}

impl ImageModel {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageModel::Gemini => "gemini",
            ImageModel::Flux => "flux",
        }
    }
}

/// Text-to-image request with optional reference images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateImageRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: ImageModel,
    pub references: Vec<PathBuf>,
}

/// Caption request for an existing dataset image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateTagRequest {
    pub image_path: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// AI back-end producing new images and tag text
#[allow(async_fn_in_trait)]
pub trait Generator {
    async fn generate_image(&self, request: GenerateImageRequest) -> anyhow::Result<SavedImage>;

    async fn generate_tag(&self, request: GenerateTagRequest) -> anyhow::Result<String>;
}
