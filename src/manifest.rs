//! Manifest loading from the master spreadsheet.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use crate::domain::ManifestItem;
use crate::error::{Error, Result};
use crate::ports::ManifestRepository;

/// Reads manifest rows from the first worksheet of an `.xlsx` workbook.
///
/// Row 1 is the header row. Columns are positional: code, revision, title,
/// then one metadata pair per remaining column with a non-empty header.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxManifestRepository;

impl XlsxManifestRepository {
    pub fn new() -> Self {
        Self
    }
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::Empty) | None => String::new(),
        // Display renders numeric cells without a trailing ".0"
        Some(value) => value.to_string().trim().to_string(),
    }
}

impl ManifestRepository for XlsxManifestRepository {
    fn load(&self, path: &Path) -> Result<Vec<ManifestItem>> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| Error::ManifestRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::ManifestRead {
                path: path.to_path_buf(),
                detail: "workbook has no sheets".to_string(),
            })?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| Error::ManifestRead {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(|cell| cell_text(Some(cell))).collect(),
            None => return Ok(Vec::new()),
        };

        let mut items = Vec::new();
        for (index, row) in rows.enumerate() {
            let row_number = index + 2;
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }

            let code = cell_text(row.first());
            if code.is_empty() {
                tracing::warn!(row = row_number, "manifest row has no document code, skipping");
                continue;
            }

            let mut item = ManifestItem::new(code, cell_text(row.get(1)), cell_text(row.get(2)));
            for (column, header) in headers.iter().enumerate().skip(3) {
                if header.is_empty() {
                    continue;
                }
                item.metadata
                    .push((header.clone(), cell_text(row.get(column))));
            }
            items.push(item);
        }

        tracing::info!(
            manifest = %path.display(),
            items = items.len(),
            "manifest loaded"
        );
        Ok(items)
    }
}
