//! Collaborator seams between the pipeline and the outside world.
//!
//! Every trait here has one production implementation in this crate and
//! in-memory substitutes in the test suites, so use cases can run against
//! canned data without touching the real filesystem or a spreadsheet
//! library.

use std::path::{Path, PathBuf};

use crate::domain::{DocumentFile, DocumentGroup, ManifestItem};
use crate::error::Result;

/// Source of manifest rows.
pub trait ManifestRepository {
    /// Loads all items, in sheet order. Missing or malformed input fails
    /// with [`Error::ManifestRead`](crate::error::Error::ManifestRead).
    fn load(&self, path: &Path) -> Result<Vec<ManifestItem>>;
}

/// Source of the files under consideration.
pub trait FileRepository {
    /// Lists every regular file under `directory`, recursively, with
    /// `size_bytes` populated and status `Unvalidated`.
    fn list(&self, directory: &Path) -> Result<Vec<DocumentFile>>;
}

/// Raw text extraction from one document file.
pub trait ContentExtractor {
    fn extract_text(&self, file: &DocumentFile, profile_id: &str) -> Result<String>;
}

/// Document-code recognition inside extracted text, driven by the named
/// extraction profile's pattern list and strategy.
pub trait CodeExtractor {
    fn find_code(&self, text: &str, profile_id: &str) -> Option<String>;
}

/// Physical filesystem effects. Each method fails with
/// [`Error::FileSystem`](crate::error::Error::FileSystem) on OS-level
/// failure.
pub trait FileSystemManager {
    fn create_directory(&self, path: &Path) -> Result<()>;

    /// Moves `src` to `dst`. A no-op when the two are equal; an error when
    /// `dst` already exists.
    fn move_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Like [`move_file`](Self::move_file), but resolves a destination
    /// collision with a unique suffix instead of failing. Returns the path
    /// actually written.
    fn move_file_unique(&self, src: &Path, dst: &Path) -> Result<PathBuf>;

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// Produces one lot spreadsheet from a master template.
pub trait TemplateFiller {
    /// Copies `template` to `destination` and inserts one row per file of
    /// `groups` above the sentinel row, preserving template formatting.
    fn fill_and_save(
        &self,
        template: &Path,
        destination: &Path,
        groups: &[DocumentGroup],
    ) -> Result<()>;
}
