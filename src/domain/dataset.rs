//! Dataset image descriptors and the displayed image

use serde::{Deserialize, Serialize};

use super::geometry::{ImageLayout, NaturalSize};

/// The two image collections of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Source images; edits here produce new files in `Datasets`
    Originals,
    /// Curated images; edits here overwrite in place
    Datasets,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Originals, Collection::Datasets];

    /// Folder name, also the path prefix of every image in the collection
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Originals => "originals",
            Collection::Datasets => "datasets",
        }
    }

    pub fn from_folder(folder: &str) -> Option<Self> {
        match folder {
            "originals" => Some(Collection::Originals),
            "datasets" => Some(Collection::Datasets),
            _ => None,
        }
    }

    /// Collection an image path lexically belongs to, by its prefix
    pub fn of_path(path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| path.strip_prefix(c.as_str()).is_some_and(|rest| rest.starts_with('/')))
    }
}

/// Malformed dataset image path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("invalid image path: {0}")]
    Invalid(String),
    #[error("invalid folder: {0}")]
    UnknownFolder(String),
}

/// A validated `"<collection>/<file name>"` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    pub collection: Collection,
    pub file_name: String,
}

impl ImagePath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let mut parts = path.split('/');
        let (Some(folder), Some(file_name), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(PathError::Invalid(path.to_string()));
        };
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return Err(PathError::Invalid(path.to_string()));
        }
        let collection = Collection::from_folder(folder)
            .ok_or_else(|| PathError::UnknownFolder(folder.to_string()))?;
        Ok(Self {
            collection,
            file_name: file_name.to_string(),
        })
    }

    /// File name without its final extension
    pub fn stem(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map_or(self.file_name.as_str(), |(stem, _)| stem)
    }
}

impl std::fmt::Display for ImagePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection.as_str(), self.file_name)
    }
}

/// One entry of the image listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub name: String,
    pub path: String,
    /// A companion `.txt` tag file exists
    #[serde(default)]
    pub has_tag: bool,
}

impl ImageFile {
    pub fn new(collection: Collection, name: impl Into<String>, has_tag: bool) -> Self {
        let name = name.into();
        Self {
            path: format!("{}/{}", collection.as_str(), name),
            name,
            has_tag,
        }
    }
}

/// Images grouped by collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageListing {
    pub originals: Vec<ImageFile>,
    pub datasets: Vec<ImageFile>,
}

impl ImageListing {
    pub fn get(&self, collection: Collection) -> &[ImageFile] {
        match collection {
            Collection::Originals => &self.originals,
            Collection::Datasets => &self.datasets,
        }
    }

    pub fn find(&self, path: &str) -> Option<&ImageFile> {
        self.originals
            .iter()
            .chain(self.datasets.iter())
            .find(|file| file.path == path)
    }

    pub fn len(&self) -> usize {
        self.originals.len() + self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The image currently shown, with its measured on-screen layout
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedImage {
    pub file: ImageFile,
    pub natural: NaturalSize,
    /// `None` until the element has been laid out
    pub layout: Option<ImageLayout>,
}

impl DisplayedImage {
    pub fn new(file: ImageFile, natural: NaturalSize) -> Self {
        Self {
            file,
            natural,
            layout: None,
        }
    }

    pub fn with_layout(mut self, layout: ImageLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn path(&self) -> &str {
        &self.file.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_of_path_uses_prefix() {
        assert_eq!(Collection::of_path("originals/a.png"), Some(Collection::Originals));
        assert_eq!(Collection::of_path("datasets/b.png"), Some(Collection::Datasets));
        assert_eq!(Collection::of_path("originalsx/a.png"), None);
        assert_eq!(Collection::of_path("datasets"), None);
        assert_eq!(Collection::of_path("/datasets/a.png"), None);
    }

    #[test]
    fn test_image_path_parse() {
        let path = ImagePath::parse("datasets/cat.01.png").expect("valid");
        assert_eq!(path.collection, Collection::Datasets);
        assert_eq!(path.stem(), "cat.01");
        assert_eq!(path.to_string(), "datasets/cat.01.png");

        assert_eq!(
            ImagePath::parse("other/a.png"),
            Err(PathError::UnknownFolder("other".into()))
        );
        assert!(matches!(ImagePath::parse("a.png"), Err(PathError::Invalid(_))));
        assert!(matches!(
            ImagePath::parse("datasets/x/a.png"),
            Err(PathError::Invalid(_))
        ));
        assert!(matches!(ImagePath::parse("datasets/.."), Err(PathError::Invalid(_))));
    }

    #[test]
    fn test_listing_lookup() {
        let listing = ImageListing {
            originals: vec![ImageFile::new(Collection::Originals, "a.png", false)],
            datasets: vec![ImageFile::new(Collection::Datasets, "b.png", true)],
        };
        assert_eq!(listing.len(), 2);
        assert!(listing.find("datasets/b.png").is_some_and(|f| f.has_tag));
        assert!(listing.find("datasets/a.png").is_none());
        assert_eq!(listing.get(Collection::Originals)[0].path, "originals/a.png");
    }
}
