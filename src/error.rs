use std::path::PathBuf;

use thiserror::Error;

/// The failures the pipeline recognizes and recovers from.
///
/// The orchestrator converts every member of this family into a failed
/// [`OrganizationResult`](crate::domain::OrganizationResult); anything else
/// (a programming error) panics through to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("manifest could not be read from {}: {detail}", path.display())]
    ManifestRead { path: PathBuf, detail: String },

    #[error("source directory not found: {}", .0.display())]
    SourceDirectoryNotFound(PathBuf),

    #[error("failed to read content of {}: {detail}", path.display())]
    FileRead { path: PathBuf, detail: String },

    #[error("code extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("extracted code '{0}' is not present in the manifest")]
    CodeNotInManifest(String),

    #[error("file system operation failed: {0}")]
    FileSystem(String),

    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("failed to fill template: {0}")]
    TemplateFill(String),
}

pub type Result<T> = std::result::Result<T, Error>;
