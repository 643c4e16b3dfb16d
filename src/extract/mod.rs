//! Raw text extraction from document files, dispatched on extension.

pub mod codes;

use std::fs;
use std::path::Path;

use calamine::{open_workbook, Reader, Xls, Xlsx};

use crate::domain::DocumentFile;
use crate::error::{Error, Result};
use crate::ports::ContentExtractor;

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Wrapped in catch_unwind: the PDF parser (and its font handling) can
    /// panic on malformed files.
    fn extract_pdf(path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        })) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::FileRead {
                path: path.to_path_buf(),
                detail: format!("pdf extraction failed: {e}"),
            }),
            Err(_panic) => {
                tracing::error!(path = %path.display(), "pdf extraction panicked");
                Err(Error::FileRead {
                    path: path.to_path_buf(),
                    detail: "pdf extraction panicked, likely malformed fonts".to_string(),
                })
            }
        }
    }

    fn extract_docx(path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let doc = docx_rs::read_docx(&bytes).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: format!("docx parse failed: {e}"),
        })?;

        let mut text = String::new();
        for child in doc.document.children {
            Self::collect_docx_text(&child, &mut text);
        }
        Ok(text)
    }

    fn collect_docx_text(element: &docx_rs::DocumentChild, output: &mut String) {
        match element {
            docx_rs::DocumentChild::Paragraph(para) => {
                Self::collect_paragraph_text(para, output);
                output.push('\n');
            }
            docx_rs::DocumentChild::Table(table) => {
                for row in &table.rows {
                    let docx_rs::TableChild::TableRow(tr) = row;
                    for cell in &tr.cells {
                        let docx_rs::TableRowChild::TableCell(tc) = cell;
                        for child in &tc.children {
                            if let docx_rs::TableCellContent::Paragraph(para) = child {
                                Self::collect_paragraph_text(para, output);
                                output.push_str(" | ");
                            }
                        }
                    }
                    output.push('\n');
                }
            }
            _ => {}
        }
    }

    fn collect_paragraph_text(paragraph: &docx_rs::Paragraph, output: &mut String) {
        for child in &paragraph.children {
            match child {
                docx_rs::ParagraphChild::Run(run) => {
                    for run_child in &run.children {
                        if let docx_rs::RunChild::Text(text) = run_child {
                            output.push_str(&text.text);
                        }
                    }
                }
                docx_rs::ParagraphChild::Hyperlink(link) => {
                    for nested in &link.children {
                        if let docx_rs::ParagraphChild::Run(run) = nested {
                            for run_child in &run.children {
                                if let docx_rs::RunChild::Text(text) = run_child {
                                    output.push_str(&text.text);
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_xlsx(path: &Path) -> Result<String> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: format!("failed to open workbook: {e}"),
        })?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let mut text = String::new();
        for sheet_name in &sheet_names {
            if let Ok(range) = workbook.worksheet_range(sheet_name) {
                Self::dump_range(sheet_name, &range, &mut text);
            }
        }
        Ok(text)
    }

    fn extract_xls(path: &Path) -> Result<String> {
        let mut workbook: Xls<_> = open_workbook(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: format!("failed to open workbook: {e}"),
        })?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let mut text = String::new();
        for sheet_name in &sheet_names {
            if let Ok(range) = workbook.worksheet_range(sheet_name) {
                Self::dump_range(sheet_name, &range, &mut text);
            }
        }
        Ok(text)
    }

    fn dump_range(sheet_name: &str, range: &calamine::Range<calamine::Data>, output: &mut String) {
        output.push_str(&format!("Sheet: {sheet_name}\n"));
        for row in range.rows() {
            let row_text: Vec<String> = row
                .iter()
                .map(|cell| cell.to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !row_text.is_empty() {
                output.push_str(&row_text.join(" | "));
                output.push('\n');
            }
        }
    }

    fn extract_plain(path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn clean_text(text: &str) -> String {
        text.lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ContentExtractor for DocumentTextExtractor {
    fn extract_text(&self, file: &DocumentFile, _profile_id: &str) -> Result<String> {
        let path = &file.path;
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let raw = match extension.as_str() {
            "pdf" => Self::extract_pdf(path)?,
            "docx" => Self::extract_docx(path)?,
            "xlsx" => Self::extract_xlsx(path)?,
            "xls" => Self::extract_xls(path)?,
            "txt" | "md" | "csv" | "log" => Self::extract_plain(path)?,
            // unsupported formats yield no text; the resolver reports that
            // as an extraction failure
            _ => String::new(),
        };

        let text = Self::clean_text(&raw);
        tracing::debug!(
            file = %file.file_name(),
            chars = text.len(),
            "content extracted"
        );
        Ok(text)
    }
}
