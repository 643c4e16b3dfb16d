//! Manifest-to-disk validation: the first pass that matches discovered files
//! to manifest entries by filename alone.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{DocumentFile, DocumentStatus, ManifestItem};
use crate::error::Result;
use crate::ports::{FileRepository, ManifestRepository};

/// Trailing-suffix patterns tried in order against a file stem; the first
/// one that matches is stripped to obtain the base document code.
static SUFFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // single-letter revision: _A, _b
        r"(?i)_[a-z]$",
        // textual revision marker: _Rev1, _rev12
        r"(?i)_rev\d+$",
        // purely numeric: _0, _003
        r"_\d+$",
        // housekeeping tokens people append by hand
        r"(?i)_(final|temp|old|backup|draft|preliminary)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("suffix pattern compiles"))
    .collect()
});

/// Strips the first recognized trailing suffix from a file stem; a stem with
/// no recognized suffix is returned unchanged.
pub fn base_code(stem: &str) -> String {
    for pattern in SUFFIX_PATTERNS.iter() {
        if pattern.is_match(stem) {
            return pattern.replace(stem, "").into_owned();
        }
    }
    stem.to_string()
}

/// Builds the `document_code -> item` lookup. Duplicate codes keep the later
/// row, with a warning, so a manifest carrying a superseded entry stays
/// loadable.
pub(crate) fn build_lookup(items: &[Arc<ManifestItem>]) -> HashMap<&str, &Arc<ManifestItem>> {
    let mut lookup = HashMap::with_capacity(items.len());
    for item in items {
        if lookup.insert(item.document_code.as_str(), item).is_some() {
            tracing::warn!(
                code = %item.document_code,
                "duplicate document code in manifest, keeping the later row"
            );
        }
    }
    lookup
}

/// Everything one validation run produces. The loaded manifest rides along
/// so the caller can hand it to the resolver without re-reading the
/// workbook.
#[derive(Debug)]
pub struct BatchValidation {
    pub manifest: Vec<Arc<ManifestItem>>,
    pub validated: Vec<DocumentFile>,
    pub unrecognized: Vec<DocumentFile>,
}

pub struct BatchValidator<M, F> {
    manifest_repo: M,
    file_repo: F,
}

impl<M: ManifestRepository, F: FileRepository> BatchValidator<M, F> {
    pub fn new(manifest_repo: M, file_repo: F) -> Self {
        Self {
            manifest_repo,
            file_repo,
        }
    }

    /// Loads the manifest and the source directory, then partitions the
    /// files. Collaborator failures propagate untouched.
    pub fn execute(&self, manifest_path: &Path, source_dir: &Path) -> Result<BatchValidation> {
        let manifest: Vec<Arc<ManifestItem>> = self
            .manifest_repo
            .load(manifest_path)?
            .into_iter()
            .map(Arc::new)
            .collect();
        let files = self.file_repo.list(source_dir)?;
        let lookup = build_lookup(&manifest);

        let mut validated = Vec::new();
        let mut unrecognized = Vec::new();
        for mut file in files {
            let stem = file.stem();
            let code = base_code(&stem);
            match lookup.get(code.as_str()) {
                Some(item) => {
                    file.status = DocumentStatus::Validated;
                    file.manifest_item = Some(Arc::clone(item));
                    tracing::debug!(file = %file.file_name(), code = %code, "matched manifest entry");
                    validated.push(file);
                }
                None => {
                    file.status = DocumentStatus::Unrecognized;
                    tracing::debug!(file = %file.file_name(), code = %code, "no manifest entry for base code");
                    unrecognized.push(file);
                }
            }
        }

        tracing::info!(
            manifest_items = manifest.len(),
            validated = validated.len(),
            unrecognized = unrecognized.len(),
            "batch validation finished"
        );
        Ok(BatchValidation {
            manifest,
            validated,
            unrecognized,
        })
    }
}
