//! Form state for the generate and tags panels
//!
//! This module contains:
//! - Prompt pairs shared by image and tag generation
//! - The tag editor (manual text and AI-generated text)
//! - The image generation form and its reference image picker

use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::store::{GenerateImageRequest, GenerateTagRequest, ImageModel};

/// Form input rejected before any collaborator is contacted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("both the system prompt and the user prompt are required")]
    MissingPrompts,
    #[error("tag content is empty")]
    EmptyTag,
    #[error("no image selected")]
    NoImageSelected,
}

// ============================================================================
// Prompts
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

impl Prompts {
    /// Both prompts, or `MissingPrompts` if either is blank
    pub fn require(&self) -> Result<(String, String), FormError> {
        if self.system.trim().is_empty() || self.user.trim().is_empty() {
            return Err(FormError::MissingPrompts);
        }
        Ok((self.system.clone(), self.user.clone()))
    }

    pub fn clear(&mut self) {
        self.system.clear();
        self.user.clear();
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Tags panel state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEditor {
    pub prompts: Prompts,
    /// Typing the tag instead of generating it
    pub manual_mode: bool,
    pub manual_text: String,
    /// Last tag saved or generated for the displayed image
    pub current: String,
}

impl TagEditor {
    /// Editor holding typed tag text, as entered on the command line
    pub fn with_manual_text(text: impl Into<String>) -> Self {
        Self {
            manual_mode: true,
            manual_text: text.into(),
            ..Default::default()
        }
    }

    pub fn toggle_manual_mode(&mut self) {
        self.manual_mode = !self.manual_mode;
    }

    /// Manual text ready to save
    pub fn manual_tag(&self) -> Result<String, FormError> {
        if self.manual_text.trim().is_empty() {
            return Err(FormError::EmptyTag);
        }
        Ok(self.manual_text.clone())
    }

    pub fn tag_request(&self, image_path: Option<&str>) -> Result<GenerateTagRequest, FormError> {
        let image_path = image_path.ok_or(FormError::NoImageSelected)?;
        let (system_prompt, user_prompt) = self.prompts.require()?;
        Ok(GenerateTagRequest {
            image_path: image_path.to_string(),
            system_prompt,
            user_prompt,
        })
    }
}

// ============================================================================
// Image generation
// ============================================================================

/// A reference image with a private preview copy
///
/// The copy lives as long as the entry; dropping the entry deletes it.
#[derive(Debug)]
pub struct ReferenceImage {
    source: PathBuf,
    preview: NamedTempFile,
}

impl ReferenceImage {
    fn copy_of(source: &Path) -> anyhow::Result<Self> {
        let suffix = source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let mut preview = tempfile::Builder::new()
            .prefix("reference-")
            .suffix(&suffix)
            .tempfile()?;
        let mut file = std::fs::File::open(source)
            .with_context(|| format!("opening {}", source.display()))?;
        std::io::copy(&mut file, &mut preview)?;
        Ok(Self {
            source: source.to_path_buf(),
            preview,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn preview(&self) -> &Path {
        self.preview.path()
    }
}

/// Reference images attached to a generation request
#[derive(Debug, Default)]
pub struct ReferencePicker {
    entries: Vec<ReferenceImage>,
}

impl ReferencePicker {
    /// Attach image files, skipping anything that is not an image
    ///
    /// Returns how many files were attached.
    pub fn add<P: AsRef<Path>>(&mut self, files: impl IntoIterator<Item = P>) -> anyhow::Result<usize> {
        let mut added = 0;
        for file in files {
            let file = file.as_ref();
            if image::ImageFormat::from_path(file).is_err() {
                log::debug!("Skipping non-image reference {}", file.display());
                continue;
            }
            self.entries.push(ReferenceImage::copy_of(file)?);
            added += 1;
        }
        Ok(added)
    }

    /// Detach one reference and release its preview
    pub fn remove(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.entries.remove(index);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ReferenceImage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn preview_paths(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .map(|entry| entry.preview().to_path_buf())
            .collect()
    }
}

/// Generate panel state
#[derive(Debug, Default)]
pub struct GenerationForm {
    pub prompts: Prompts,
    pub model: ImageModel,
    pub references: ReferencePicker,
}

impl GenerationForm {
    /// Request for the current input; references point at the preview copies
    pub fn request(&self) -> Result<GenerateImageRequest, FormError> {
        let (system_prompt, user_prompt) = self.prompts.require()?;
        Ok(GenerateImageRequest {
            system_prompt,
            user_prompt,
            model: self.model,
            references: self.references.preview_paths(),
        })
    }

    /// Clear prompts and release every reference; the model choice stays
    pub fn reset(&mut self) {
        self.prompts.clear();
        self.references.clear();
    }
}
