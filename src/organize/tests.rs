//! End-to-end organization runs against real directories and workbooks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{DocumentFile, DocumentStatus, ManifestItem};
use crate::error::{Error, Result};
use crate::fsops::SafeFileManager;
use crate::organize::{group_by_code, LotOrganizer, OrganizeOptions};
use crate::ports::FileSystemManager;
use crate::rename;
use crate::template::XlsxTemplateFiller;

const HEADERS: [&str; 9] = [
    "CÓDIGO",
    "REVISÃO",
    "TÍTULO",
    "ARQUIVO",
    "FORMATO",
    "DISCIPLINA",
    "TIPO DE DOCUMENTO",
    "PROPÓSITO",
    "CAMINHO DATABOOK",
];

struct Workspace {
    _dir: tempfile::TempDir,
    source: PathBuf,
    output: PathBuf,
    template: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("entrada");
    let output = dir.path().join("lotes");
    let template = dir.path().join("template.xlsx");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&output).unwrap();
    write_template(&template);
    Workspace {
        _dir: dir,
        source,
        output,
        template,
    }
}

fn write_template(path: &Path) {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_mut(&0).unwrap();
    for (column, header) in HEADERS.iter().enumerate() {
        sheet
            .get_cell_mut(((column + 1) as u32, 1))
            .set_value_string(*header);
    }
    sheet.get_cell_mut((1, 2)).set_value_string("FIM");
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

fn item(code: &str, revision: &str) -> Arc<ManifestItem> {
    Arc::new(ManifestItem::new(code, revision, format!("Título {code}")))
}

fn validated_file(
    source: &Path,
    name: &str,
    size: usize,
    item: Option<&Arc<ManifestItem>>,
) -> DocumentFile {
    let path = source.join(name);
    fs::write(&path, vec![b'x'; size]).unwrap();
    let mut file = DocumentFile::new(&path, size as u64);
    file.status = DocumentStatus::Validated;
    file.manifest_item = item.map(Arc::clone);
    file
}

fn organizer() -> LotOrganizer<SafeFileManager, XlsxTemplateFiller<SafeFileManager>> {
    LotOrganizer::new(
        SafeFileManager::new(),
        XlsxTemplateFiller::new(SafeFileManager::new()),
    )
}

#[test]
fn both_files_of_one_document_land_in_one_lot() {
    let ws = workspace();
    let doc = item("DOC-1", "A");
    let files = vec![
        validated_file(&ws.source, "DOC-1_A.pdf", 500, Some(&doc)),
        validated_file(&ws.source, "DOC-1.docx", 300, Some(&doc)),
    ];

    let options = OrganizeOptions {
        max_docs_per_lot: 1,
        ..OrganizeOptions::default()
    };
    let result = organizer().organize(files, &ws.output, &ws.template, &options);

    assert!(result.success);
    assert_eq!(result.lots_created, 1);
    assert_eq!(result.files_moved, 2);

    let lot_dir = ws.output.join("LOTE_0001");
    assert!(lot_dir.join("DOC-1_A.pdf").exists());
    assert!(lot_dir.join("DOC-1_A.docx").exists());

    let book = umya_spreadsheet::reader::xlsx::read(lot_dir.join("LOTE_0001.xlsx")).unwrap();
    let sheet = book.get_sheet(&0).unwrap();
    assert_eq!(sheet.get_value((1, 2)), "DOC-1");
    assert_eq!(sheet.get_value((4, 2)), "DOC-1_A.pdf");
    assert_eq!(sheet.get_value((4, 3)), "DOC-1_A.docx");
    assert_eq!(sheet.get_value((1, 4)), "FIM");
}

#[test]
fn four_groups_balance_into_two_lots_by_size() {
    let ws = workspace();
    let sizes = [("A", 100), ("B", 80), ("C", 60), ("D", 10)];
    let files = sizes
        .iter()
        .map(|(code, size)| {
            let doc = item(code, "A");
            validated_file(&ws.source, &format!("{code}.pdf"), *size, Some(&doc))
        })
        .collect();

    let options = OrganizeOptions {
        max_docs_per_lot: 2,
        ..OrganizeOptions::default()
    };
    let result = organizer().organize(files, &ws.output, &ws.template, &options);

    assert!(result.success);
    assert_eq!(result.lots_created, 2);
    assert_eq!(result.files_moved, 4);

    // 100+10 against 80+60
    let first = ws.output.join("LOTE_0001");
    let second = ws.output.join("LOTE_0002");
    assert!(first.join("A_A.pdf").exists());
    assert!(first.join("D_A.pdf").exists());
    assert!(second.join("B_A.pdf").exists());
    assert!(second.join("C_A.pdf").exists());
}

#[test]
fn lot_names_follow_the_start_sequence_and_pattern() {
    let ws = workspace();
    let files = vec![
        validated_file(&ws.source, "P1.pdf", 10, Some(&item("P1", "0"))),
        validated_file(&ws.source, "P2.pdf", 10, Some(&item("P2", "0"))),
    ];

    let options = OrganizeOptions {
        max_docs_per_lot: 1,
        start_sequence: 7,
        lot_name_pattern: "REMESSA_XXXX".to_string(),
    };
    let result = organizer().organize(files, &ws.output, &ws.template, &options);

    assert!(result.success);
    assert!(ws.output.join("REMESSA_0007").is_dir());
    assert!(ws.output.join("REMESSA_0008").is_dir());
    assert!(ws.output.join("REMESSA_0007/REMESSA_0007.xlsx").exists());
}

#[test]
fn a_missing_template_fails_the_run() {
    let ws = workspace();
    let doc = item("DOC-1", "A");
    let files = vec![validated_file(&ws.source, "DOC-1_A.pdf", 10, Some(&doc))];

    let result = organizer().organize(
        files,
        &ws.output,
        &ws.template.with_file_name("ghost.xlsx"),
        &OrganizeOptions::default(),
    );

    assert!(!result.success);
    assert_eq!(result.lots_created, 0);
    assert_eq!(result.files_moved, 0);
    assert!(result.message.contains("template not found"));
}

#[test]
fn a_failed_move_becomes_a_failed_result() {
    struct ExplodingMoves;

    impl FileSystemManager for ExplodingMoves {
        fn create_directory(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
        fn move_file(&self, _src: &Path, _dst: &Path) -> Result<()> {
            Err(Error::FileSystem("no space left on device".to_string()))
        }
        fn move_file_unique(&self, _src: &Path, dst: &Path) -> Result<PathBuf> {
            Ok(dst.to_path_buf())
        }
        fn copy_file(&self, _src: &Path, _dst: &Path) -> Result<()> {
            Ok(())
        }
    }

    let ws = workspace();
    let doc = item("DOC-1", "A");
    let files = vec![validated_file(&ws.source, "DOC-1_A.pdf", 10, Some(&doc))];

    let organizer = LotOrganizer::new(
        ExplodingMoves,
        XlsxTemplateFiller::new(SafeFileManager::new()),
    );
    let result = organizer.organize(files, &ws.output, &ws.template, &OrganizeOptions::default());

    assert!(!result.success);
    assert!(result.message.contains("no space left"));
}

#[test]
fn grouping_falls_back_to_the_file_stem() {
    let doc = item("DOC-9", "B");
    let mut recognized = DocumentFile::new("/in/XYZ_1.pdf", 5);
    recognized.status = DocumentStatus::Recognized;
    let mut sibling = DocumentFile::new("/in/XYZ_1.txt", 5);
    sibling.status = DocumentStatus::Recognized;
    let mut validated = DocumentFile::new("/in/DOC-9_B.pdf", 5);
    validated.status = DocumentStatus::Validated;
    validated.manifest_item = Some(Arc::clone(&doc));

    let groups = group_by_code(vec![recognized, validated, sibling]);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].document_code, "XYZ_1");
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(groups[1].document_code, "DOC-9");
    assert_eq!(groups[1].files.len(), 1);
}

#[test]
fn no_file_is_lost_or_duplicated_across_lots() {
    let ws = workspace();
    let mut expected = Vec::new();
    let mut files = Vec::new();
    for index in 0..9_usize {
        let code = format!("DOC-{index}");
        let revision = if index % 2 == 0 { "A" } else { "1" };
        let doc = item(&code, revision);
        let name = format!("{code}.pdf");
        files.push(validated_file(&ws.source, &name, 10 + index * 7, Some(&doc)));
        expected.push(rename::filename_with_revision(&name, revision));
    }

    let options = OrganizeOptions {
        max_docs_per_lot: 2,
        ..OrganizeOptions::default()
    };
    let result = organizer().organize(files, &ws.output, &ws.template, &options);

    assert!(result.success);
    assert_eq!(result.lots_created, 5);
    assert_eq!(result.files_moved, 9);

    let mut found = Vec::new();
    for lot in fs::read_dir(&ws.output).unwrap() {
        let lot = lot.unwrap();
        assert!(lot.file_type().unwrap().is_dir());
        for entry in fs::read_dir(lot.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            if !name.ends_with(".xlsx") {
                found.push(name);
            }
        }
    }
    found.sort();
    expected.sort();
    assert_eq!(found, expected);

    assert_eq!(fs::read_dir(&ws.source).unwrap().count(), 0);
}

#[test]
fn organizing_nothing_succeeds_with_zero_lots() {
    let ws = workspace();
    let result = organizer().organize(
        Vec::new(),
        &ws.output,
        &ws.template,
        &OrganizeOptions::default(),
    );
    assert!(result.success);
    assert_eq!(result.lots_created, 0);
    assert_eq!(result.files_moved, 0);
}

#[test]
fn default_options_match_the_common_run() {
    let options = OrganizeOptions::default();
    assert_eq!(options.max_docs_per_lot, 10);
    assert_eq!(options.start_sequence, 1);
    assert_eq!(options.lot_name_pattern, "LOTE_XXXX");
}
