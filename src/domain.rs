//! Entities shared by every stage of the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A row of the source-of-truth manifest.
///
/// Immutable once loaded; one validation run shares items across files (and
/// across concurrent resolution tasks) through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    /// Natural key used for all matching.
    pub document_code: String,
    /// Revision label; not necessarily numeric ("A", "0", "2a").
    pub revision: String,
    pub title: String,
    /// Extra manifest columns in sheet order, written back into lot sheets.
    pub metadata: Vec<(String, String)>,
}

impl ManifestItem {
    pub fn new(
        document_code: impl Into<String>,
        revision: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            document_code: document_code.into(),
            revision: revision.into(),
            title: title.into(),
            metadata: Vec::new(),
        }
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Where a file currently stands in the validation lifecycle.
///
/// Transitions are performed only by the validator and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Unvalidated,
    /// Matched a manifest entry (by filename or by extracted content).
    Validated,
    /// Content yielded a code but no manifest entry matched (permissive
    /// resolution only).
    Recognized,
    Unrecognized,
    Error,
}

/// A physical file under consideration.
///
/// `path` changes identity when the file is physically moved; holders must
/// treat the value as "the same logical document", not "the same path".
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub status: DocumentStatus,
    /// At most one manifest association at any time.
    pub manifest_item: Option<Arc<ManifestItem>>,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            status: DocumentStatus::Unvalidated,
            manifest_item: None,
        }
    }

    /// Final path component, lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Filename without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Files sharing one document code. Built during one organization run and
/// discarded afterwards.
#[derive(Debug, Clone)]
pub struct DocumentGroup {
    pub document_code: String,
    pub files: Vec<DocumentFile>,
}

impl DocumentGroup {
    pub fn new(document_code: impl Into<String>, files: Vec<DocumentFile>) -> Self {
        Self {
            document_code: document_code.into(),
            files,
        }
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.size_bytes).sum()
    }
}

/// An output batch of groups, named and populated by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OutputLot {
    pub lot_name: String,
    pub groups: Vec<DocumentGroup>,
}

impl OutputLot {
    pub fn total_size_bytes(&self) -> u64 {
        self.groups.iter().map(DocumentGroup::total_size_bytes).sum()
    }

    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|group| group.files.len()).sum()
    }
}

/// Aggregated outcome of one organization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationResult {
    pub lots_created: usize,
    pub files_moved: usize,
    pub success: bool,
    pub message: String,
}

impl OrganizationResult {
    pub fn succeeded(lots_created: usize, files_moved: usize) -> Self {
        Self {
            lots_created,
            files_moved,
            success: true,
            message: format!("organized {files_moved} files into {lots_created} lots"),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            lots_created: 0,
            files_moved: 0,
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lot_size_is_the_sum_of_its_groups() {
        let group_a = DocumentGroup::new(
            "DOC-A",
            vec![
                DocumentFile::new("a1.pdf", 100),
                DocumentFile::new("a2.pdf", 50),
            ],
        );
        let group_b = DocumentGroup::new("DOC-B", vec![DocumentFile::new("b.pdf", 25)]);

        assert_eq!(group_a.total_size_bytes(), 150);
        let lot = OutputLot {
            lot_name: String::new(),
            groups: vec![group_a, group_b],
        };
        assert_eq!(lot.total_size_bytes(), 175);
        assert_eq!(lot.file_count(), 3);
    }

    #[test]
    fn metadata_lookup_is_by_column_name() {
        let mut item = ManifestItem::new("DOC-1", "A", "Piping isometric");
        item.metadata
            .push(("FORMATO".to_string(), "A3".to_string()));
        item.metadata
            .push(("DISCIPLINA".to_string(), "TUBULAÇÃO".to_string()));

        assert_eq!(item.metadata_value("FORMATO"), Some("A3"));
        assert_eq!(item.metadata_value("DISCIPLINA"), Some("TUBULAÇÃO"));
        assert_eq!(item.metadata_value("PROPÓSITO"), None);
    }

    #[test]
    fn stem_and_file_name_ignore_directories() {
        let file = DocumentFile::new("/batch/incoming/RL-001_A.pdf", 10);
        assert_eq!(file.file_name(), "RL-001_A.pdf");
        assert_eq!(file.stem(), "RL-001_A");
        assert_eq!(file.status, DocumentStatus::Unvalidated);
        assert!(file.manifest_item.is_none());
    }
}
