//! Content-based resolution of files the validator could not match by name.

pub mod profiles;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{DocumentFile, DocumentStatus, ManifestItem};
use crate::error::{Error, Result};
use crate::ports::{CodeExtractor, ContentExtractor, FileSystemManager};
use crate::rename;
use crate::validate;

/// Revision label assigned when a code is accepted without a manifest row.
pub const DEFAULT_RECOGNIZED_REVISION: &str = "A";

/// What to do when an extracted code has no exact manifest row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// Fail with [`Error::CodeNotInManifest`], leaving the file untouched.
    Strict,
    /// Fall back to substring containment against the manifest, and on a
    /// total miss still accept the extracted code with the default revision
    /// and status `Recognized`.
    #[default]
    Permissive,
}

/// One trailing `_<alphanumeric>` character is a revision marker riding on
/// the extracted code; longer trailing segments are part of the code itself.
static TRAILING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_[A-Za-z0-9]$").expect("marker pattern compiles"));

pub(crate) fn sanitize_code(raw: &str) -> String {
    TRAILING_MARKER.replace(raw, "").into_owned()
}

/// Recovers a manifest association for one unrecognized file by reading the
/// document itself, then renames the file to `<code>_<revision>.<ext>`.
pub struct ExceptionResolver<C, X, F> {
    content: C,
    codes: X,
    fs: F,
    policy: ResolutionPolicy,
}

impl<C, X, F> ExceptionResolver<C, X, F>
where
    C: ContentExtractor,
    X: CodeExtractor,
    F: FileSystemManager,
{
    pub fn new(content: C, codes: X, fs: F) -> Self {
        Self {
            content,
            codes,
            fs,
            policy: ResolutionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolves one file in place.
    ///
    /// The file is mutated only after every fallible step has succeeded, so
    /// a failed resolution leaves it exactly as it was. Callers running
    /// resolutions concurrently own the collection bookkeeping and must not
    /// invoke this twice for the same file.
    pub fn resolve(
        &self,
        file: &mut DocumentFile,
        profile_id: &str,
        manifest: &[Arc<ManifestItem>],
    ) -> Result<()> {
        let text = self.content.extract_text(file, profile_id)?;
        if text.trim().is_empty() {
            return Err(Error::ExtractionFailed(format!(
                "no text extracted from {}",
                file.file_name()
            )));
        }

        let raw = self.codes.find_code(&text, profile_id).ok_or_else(|| {
            Error::ExtractionFailed(format!(
                "no document code recognized in {}",
                file.file_name()
            ))
        })?;
        let sanitized = sanitize_code(&raw);

        let lookup = validate::build_lookup(manifest);
        let mut matched = lookup.get(sanitized.as_str()).map(|item| Arc::clone(item));

        if matched.is_none() {
            if self.policy == ResolutionPolicy::Strict {
                return Err(Error::CodeNotInManifest(sanitized));
            }
            matched = manifest
                .iter()
                .find(|item| {
                    item.document_code.contains(&sanitized)
                        || sanitized.contains(&item.document_code)
                })
                .cloned();
            if matched.is_some() {
                tracing::debug!(code = %sanitized, "matched manifest entry by containment");
            }
        }

        let (code, revision, status) = match &matched {
            Some(item) => (
                item.document_code.clone(),
                item.revision.clone(),
                DocumentStatus::Validated,
            ),
            None => (
                raw.clone(),
                DEFAULT_RECOGNIZED_REVISION.to_string(),
                DocumentStatus::Recognized,
            ),
        };

        let new_name = match file.path.extension() {
            Some(ext) => rename::filename_with_revision(
                &format!("{code}.{}", ext.to_string_lossy()),
                &revision,
            ),
            None => rename::filename_with_revision(&code, &revision),
        };
        let destination = file.path.with_file_name(&new_name);
        let actual = self.fs.move_file_unique(&file.path, &destination)?;

        tracing::info!(
            from = %file.file_name(),
            to = %actual.display(),
            status = ?status,
            "resolved by content"
        );

        file.path = actual;
        file.status = status;
        file.manifest_item = matched;
        Ok(())
    }
}
