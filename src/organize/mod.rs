//! Lot assembly: grouping, balancing, naming, moving, and sheet generation.

pub mod balance;

#[cfg(test)]
mod tests;

use std::path::Path;

use crate::domain::{DocumentFile, DocumentGroup, OrganizationResult};
use crate::error::Result;
use crate::ports::{FileSystemManager, TemplateFiller};
use crate::rename;

/// Revision used for files that carry no manifest association.
pub const FALLBACK_REVISION: &str = "0";

/// Knobs for one organization run.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    /// Document groups per lot; zero collapses everything into one lot.
    pub max_docs_per_lot: usize,
    /// Sequence number substituted into the first lot's name.
    pub start_sequence: u32,
    /// Lot directory name with `XXXX` standing in for the sequence.
    pub lot_name_pattern: String,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            max_docs_per_lot: 10,
            start_sequence: 1,
            lot_name_pattern: "LOTE_XXXX".to_string(),
        }
    }
}

/// Drives one organization run end to end: groups validated files, balances
/// them into lots, moves everything into lot directories, and generates one
/// spreadsheet per lot from the master template.
pub struct LotOrganizer<F, T> {
    fs: F,
    filler: T,
}

impl<F: FileSystemManager, T: TemplateFiller> LotOrganizer<F, T> {
    pub fn new(fs: F, filler: T) -> Self {
        Self { fs, filler }
    }

    /// Runs the whole pipeline tail. Pipeline errors come back as a failed
    /// result; panics and other programming errors propagate.
    pub fn organize(
        &self,
        files: Vec<DocumentFile>,
        output_dir: &Path,
        template: &Path,
        options: &OrganizeOptions,
    ) -> OrganizationResult {
        match self.run(files, output_dir, template, options) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "organization failed");
                OrganizationResult::failed(e.to_string())
            }
        }
    }

    fn run(
        &self,
        files: Vec<DocumentFile>,
        output_dir: &Path,
        template: &Path,
        options: &OrganizeOptions,
    ) -> Result<OrganizationResult> {
        let groups = group_by_code(files);
        let mut lots = balance::balance(groups, options.max_docs_per_lot);

        let mut files_moved = 0;
        for (index, lot) in lots.iter_mut().enumerate() {
            lot.lot_name =
                rename::lot_name(&options.lot_name_pattern, options.start_sequence + index as u32);
            let lot_dir = output_dir.join(&lot.lot_name);
            self.fs.create_directory(&lot_dir)?;

            for group in &mut lot.groups {
                for file in &mut group.files {
                    let revision = file
                        .manifest_item
                        .as_ref()
                        .map(|item| item.revision.clone())
                        .unwrap_or_else(|| FALLBACK_REVISION.to_string());
                    let new_name = rename::filename_with_revision(&file.file_name(), &revision);
                    let destination = lot_dir.join(&new_name);
                    self.fs.move_file(&file.path, &destination)?;
                    file.path = destination;
                    files_moved += 1;
                }
            }

            let sheet_path = lot_dir.join(format!("{}.xlsx", lot.lot_name));
            self.filler.fill_and_save(template, &sheet_path, &lot.groups)?;
            tracing::info!(
                lot = %lot.lot_name,
                files = lot.file_count(),
                bytes = lot.total_size_bytes(),
                "lot written"
            );
        }

        Ok(OrganizationResult::succeeded(lots.len(), files_moved))
    }
}

/// Groups files by associated document code, falling back to the filename
/// stem for files without an association. First-seen order is preserved.
fn group_by_code(files: Vec<DocumentFile>) -> Vec<DocumentGroup> {
    let mut groups: Vec<DocumentGroup> = Vec::new();
    for file in files {
        let code = file
            .manifest_item
            .as_ref()
            .map(|item| item.document_code.clone())
            .unwrap_or_else(|| file.stem());
        match groups.iter_mut().find(|group| group.document_code == code) {
            Some(group) => group.files.push(file),
            None => groups.push(DocumentGroup::new(code, vec![file])),
        }
    }
    groups
}
