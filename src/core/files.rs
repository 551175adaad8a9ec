//! File browser selection for batch deletion

use std::collections::BTreeSet;

use crate::domain::{Collection, ImageListing};

/// Browser state: normal browsing, or picking images to delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBrowser {
    select_mode: bool,
    marked: BTreeSet<String>,
}

impl FileBrowser {
    pub fn select_mode(&self) -> bool {
        self.select_mode
    }

    /// Enter or leave delete-select mode; either way the marks are dropped
    pub fn toggle_select_mode(&mut self) {
        self.select_mode = !self.select_mode;
        self.marked.clear();
    }

    /// Mark or unmark one path, returning whether it is now marked
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.marked.remove(path) {
            false
        } else {
            self.marked.insert(path.to_string());
            true
        }
    }

    pub fn is_marked(&self, path: &str) -> bool {
        self.marked.contains(path)
    }

    /// Mark every image of one collection, keeping existing marks
    pub fn select_all(&mut self, listing: &ImageListing, collection: Collection) {
        self.marked
            .extend(listing.get(collection).iter().map(|file| file.path.clone()));
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }

    pub fn count(&self) -> usize {
        self.marked.len()
    }

    /// Marked paths in sorted order
    pub fn marked(&self) -> Vec<String> {
        self.marked.iter().cloned().collect()
    }
}
