//! Dataset store backed by a local directory
//!
//! Layout: `<root>/originals/*.png` and `<root>/datasets/*.png`, with tag text
//! for a dataset image in `<root>/datasets/<stem>.txt`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{DynamicImage, ImageFormat, RgbaImage};

use super::{DatasetStore, DeleteReport, SavedImage};
use crate::config::ShapeColor;
use crate::domain::{
    ArrowRequest, Collection, CropRequest, ImageFile, ImageListing, ImagePath, NaturalSize,
    TagRequest,
};
use crate::render::image::{crop_image, draw_arrow_on_image};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    arrow_color: ShapeColor,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, arrow_color: ShapeColor) -> Self {
        Self {
            root: root.into(),
            arrow_color,
        }
    }

    /// Open a store, creating both collection folders if missing
    pub fn open(root: impl Into<PathBuf>, arrow_color: ShapeColor) -> anyhow::Result<Self> {
        let store = Self::new(root, arrow_color);
        for collection in Collection::ALL {
            let dir = store.folder(collection);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    /// Validate a dataset path and locate it on disk
    pub fn resolve(&self, path: &str) -> anyhow::Result<(ImagePath, PathBuf)> {
        let parsed = ImagePath::parse(path)?;
        let file = self.folder(parsed.collection).join(&parsed.file_name);
        Ok((parsed, file))
    }

    /// Intrinsic pixel size of an image, read from its header
    pub async fn natural_size(&self, path: &str) -> anyhow::Result<NaturalSize> {
        let (_, file) = self.resolve(path)?;
        tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let (width, height) = image::image_dimensions(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            Ok(NaturalSize::new(width, height))
        })
        .await?
    }
}

impl DatasetStore for LocalStore {
    async fn list_images(&self) -> anyhow::Result<ImageListing> {
        let originals = self.folder(Collection::Originals);
        let datasets = self.folder(Collection::Datasets);
        tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            Ok(ImageListing {
                originals: list_folder(&originals, Collection::Originals)?,
                datasets: list_folder(&datasets, Collection::Datasets)?,
            })
        })
        .await?
    }

    async fn cut_image(&self, request: CropRequest) -> anyhow::Result<SavedImage> {
        let (_, source) = self.resolve(&request.image_path)?;
        let target_dir = self.folder(Collection::Datasets);
        let rect = request.rect();

        let name = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let image = open_rgba(&source)?;
            let cropped = crop_image(&image, rect).with_context(|| {
                format!(
                    "crop {}x{} at ({}, {}) lies outside {}x{}",
                    rect.width,
                    rect.height,
                    rect.x,
                    rect.y,
                    image.width(),
                    image.height()
                )
            })?;
            write_new_png(&target_dir, "crop_", DynamicImage::ImageRgba8(cropped))
        })
        .await??;

        let saved = SavedImage {
            path: format!("{}/{}", Collection::Datasets.as_str(), name),
        };
        log::info!("Cropped {} into {}", request.image_path, saved.path);
        Ok(saved)
    }

    async fn save_arrow_image(&self, request: ArrowRequest) -> anyhow::Result<SavedImage> {
        let (parsed, source) = self.resolve(&request.image_path)?;
        let target_dir = self.folder(Collection::Datasets);
        let color = self.arrow_color;
        let (start, end) = (request.start(), request.end());

        let saved = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let mut image = open_rgba(&source)?;
            draw_arrow_on_image(&mut image, start, end, color);
            let rgb = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8());

            match parsed.collection {
                Collection::Originals => {
                    let prefix = format!("{}_arrow_", parsed.stem());
                    let name = write_new_png(&target_dir, &prefix, rgb)?;
                    Ok(SavedImage {
                        path: format!("{}/{}", Collection::Datasets.as_str(), name),
                    })
                }
                Collection::Datasets => {
                    overwrite_png(&source, rgb)?;
                    Ok(SavedImage {
                        path: parsed.to_string(),
                    })
                }
            }
        })
        .await??;

        log::info!("Saved arrow on {} as {}", request.image_path, saved.path);
        Ok(saved)
    }

    async fn save_tag(&self, request: TagRequest) -> anyhow::Result<()> {
        let (parsed, _) = self.resolve(&request.image_path)?;
        let file = self
            .folder(parsed.collection)
            .join(format!("{}.txt", parsed.stem()));
        tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            std::fs::write(&file, request.tag_content)
                .with_context(|| format!("writing {}", file.display()))
        })
        .await??;
        log::info!("Saved tag for {}", request.image_path);
        Ok(())
    }

    async fn delete_images(&self, paths: Vec<String>) -> anyhow::Result<DeleteReport> {
        let resolved: Vec<_> = paths
            .into_iter()
            .map(|path| {
                let file = self.resolve(&path).ok().map(|(_, file)| file);
                (path, file)
            })
            .collect();

        let report = tokio::task::spawn_blocking(move || {
            let mut report = DeleteReport::default();
            for (path, file) in resolved {
                match file.map(|file| std::fs::remove_file(&file)) {
                    Some(Ok(())) => report.deleted.push(path),
                    Some(Err(err)) => {
                        log::warn!("Failed to delete {}: {}", path, err);
                        report.failed.push(path);
                    }
                    None => {
                        log::warn!("Refusing to delete invalid path {}", path);
                        report.failed.push(path);
                    }
                }
            }
            report
        })
        .await?;

        log::info!(
            "Deleted {} images, {} failed",
            report.deleted.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

fn list_folder(dir: &Path, collection: Collection) -> anyhow::Result<Vec<ImageFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("png") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let has_tag = collection == Collection::Datasets && path.with_extension("txt").exists();
        files.push(ImageFile::new(collection, name, has_tag));
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn open_rgba(path: &Path) -> anyhow::Result<RgbaImage> {
    let image = image::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(image.to_rgba8())
}

fn encode_png(image: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Write a PNG under a fresh unique name in `dir` and return that name
fn write_new_png(dir: &Path, prefix: &str, image: DynamicImage) -> anyhow::Result<String> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_").to_string();
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{prefix}{stamp}"))
        .suffix(".png")
        .tempfile_in(dir)
        .with_context(|| format!("creating image in {}", dir.display()))?;
    file.write_all(&encode_png(&image)?)?;
    let (_, path) = file.keep()?;
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .context("generated file name is not valid UTF-8")
}

/// Replace an existing PNG without leaving a half-written file behind
fn overwrite_png(target: &Path, image: DynamicImage) -> anyhow::Result<()> {
    let dir = target.parent().context("image has no parent directory")?;
    let mut file = tempfile::Builder::new()
        .prefix(".arrow-")
        .suffix(".png")
        .tempfile_in(dir)?;
    file.write_all(&encode_png(&image)?)?;
    file.persist(target)
        .with_context(|| format!("replacing {}", target.display()))?;
    Ok(())
}
