//! Lot spreadsheet generation by rewriting a copy of the master template.

use std::path::Path;

use umya_spreadsheet::{
    Border, Color, HorizontalAlignmentValues, VerticalAlignmentValues, Worksheet,
};

use crate::domain::{DocumentFile, DocumentGroup};
use crate::error::{Error, Result};
use crate::organize::FALLBACK_REVISION;
use crate::ports::{FileSystemManager, TemplateFiller};
use crate::rename;

/// First-column marker for the end of the data region.
const SENTINEL: &str = "FIM";

/// Fixed widths for columns A through I.
const COLUMN_WIDTHS: [f64; 9] = [35.0, 10.0, 60.0, 35.0, 10.0, 20.0, 20.0, 20.0, 20.0];

/// Sheet format written when the manifest row does not say otherwise.
const DEFAULT_FORMAT: &str = "A4";

/// Fills copies of the master template, one per lot, inserting file rows
/// above the sentinel so whatever the template keeps below it survives.
pub struct XlsxTemplateFiller<F> {
    fs: F,
}

impl<F: FileSystemManager> XlsxTemplateFiller<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Row index of the sentinel, or 2 when the template has none.
    fn find_insertion_row(sheet: &Worksheet) -> u32 {
        let highest = sheet.get_highest_row();
        for row in 2..=highest {
            if sheet.get_value((1, row)).trim() == SENTINEL {
                return row;
            }
        }
        2
    }

    fn row_values(group: &DocumentGroup, file: &DocumentFile) -> [String; 9] {
        match &file.manifest_item {
            Some(item) => [
                item.document_code.clone(),
                item.revision.clone(),
                item.title.clone(),
                rename::filename_with_revision(&file.file_name(), &item.revision),
                item.metadata_value("FORMATO")
                    .unwrap_or(DEFAULT_FORMAT)
                    .to_string(),
                item.metadata_value("DISCIPLINA").unwrap_or("").to_string(),
                item.metadata_value("TIPO DE DOCUMENTO")
                    .unwrap_or("")
                    .to_string(),
                item.metadata_value("PROPÓSITO").unwrap_or("").to_string(),
                item.metadata_value("CAMINHO DATABOOK")
                    .unwrap_or("")
                    .to_string(),
            ],
            None => [
                group.document_code.clone(),
                FALLBACK_REVISION.to_string(),
                String::new(),
                rename::filename_with_revision(&file.file_name(), FALLBACK_REVISION),
                DEFAULT_FORMAT.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        }
    }

    fn apply_formatting(sheet: &mut Worksheet) {
        let columns = COLUMN_WIDTHS.len() as u32;

        for column in 1..=columns {
            let style = sheet.get_style_mut((column, 1));
            style.set_background_color(Color::COLOR_YELLOW);
            style.get_font_mut().set_bold(true);
            style.get_font_mut().set_size(11.0);
            let alignment = style.get_alignment_mut();
            alignment.set_horizontal(HorizontalAlignmentValues::Center);
            alignment.set_vertical(VerticalAlignmentValues::Center);
        }

        for (index, width) in COLUMN_WIDTHS.iter().enumerate() {
            let letter = char::from(b'A' + index as u8).to_string();
            sheet.get_column_dimension_mut(&letter).set_width(*width);
        }

        // data rows plus the sentinel, when present
        let highest = sheet.get_highest_row();
        for row in 2..=highest {
            for column in 1..=columns {
                let style = sheet.get_style_mut((column, row));
                let borders = style.get_borders_mut();
                borders
                    .get_left_border_mut()
                    .set_border_style(Border::BORDER_THIN);
                borders
                    .get_right_border_mut()
                    .set_border_style(Border::BORDER_THIN);
                borders
                    .get_top_border_mut()
                    .set_border_style(Border::BORDER_THIN);
                borders
                    .get_bottom_border_mut()
                    .set_border_style(Border::BORDER_THIN);
                let alignment = style.get_alignment_mut();
                alignment.set_horizontal(HorizontalAlignmentValues::Left);
                alignment.set_vertical(VerticalAlignmentValues::Center);
            }
        }
    }
}

impl<F: FileSystemManager> TemplateFiller for XlsxTemplateFiller<F> {
    fn fill_and_save(
        &self,
        template: &Path,
        destination: &Path,
        groups: &[DocumentGroup],
    ) -> Result<()> {
        if !template.exists() {
            return Err(Error::TemplateNotFound(template.to_path_buf()));
        }
        // the source template is never opened for writing
        self.fs.copy_file(template, destination)?;

        let mut book = umya_spreadsheet::reader::xlsx::read(destination).map_err(|e| {
            Error::TemplateFill(format!("failed to open {}: {e}", destination.display()))
        })?;

        {
            let sheet = book
                .get_sheet_mut(&0)
                .ok_or_else(|| Error::TemplateFill("template has no sheets".to_string()))?;

            let insertion_row = Self::find_insertion_row(sheet);
            let rows: Vec<[String; 9]> = groups
                .iter()
                .flat_map(|group| group.files.iter().map(|file| Self::row_values(group, file)))
                .collect();

            if !rows.is_empty() {
                sheet.insert_new_row(&insertion_row, &(rows.len() as u32));
                for (offset, values) in rows.iter().enumerate() {
                    let row = insertion_row + offset as u32;
                    for (column, value) in values.iter().enumerate() {
                        // always text: codes like "3.1.1" must not turn numeric
                        sheet
                            .get_cell_mut(((column + 1) as u32, row))
                            .set_value_string(value);
                    }
                }
            }

            Self::apply_formatting(sheet);
        }

        umya_spreadsheet::writer::xlsx::write(&book, destination).map_err(|e| {
            Error::TemplateFill(format!("failed to write {}: {e}", destination.display()))
        })?;

        tracing::debug!(sheet = %destination.display(), "lot spreadsheet written");
        Ok(())
    }
}
