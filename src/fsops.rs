//! Disk-backed implementations of the file collaborators.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::DocumentFile;
use crate::error::{Error, Result};
use crate::ports::{FileRepository, FileSystemManager};

/// Collision suffixes tried before falling back to a UUID.
const MAX_UNIQUE_ATTEMPTS: u32 = 1000;

/// Lists regular files from a source directory on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFileRepository;

impl DiskFileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl FileRepository for DiskFileRepository {
    fn list(&self, directory: &Path) -> Result<Vec<DocumentFile>> {
        if !directory.is_dir() {
            return Err(Error::SourceDirectoryNotFound(directory.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(directory).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(DocumentFile::new(entry.path(), size));
        }

        tracing::debug!(
            directory = %directory.display(),
            count = files.len(),
            "listed source files"
        );
        Ok(files)
    }
}

/// Filesystem effects with parent creation and cross-device fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafeFileManager;

impl SafeFileManager {
    pub fn new() -> Self {
        Self
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::FileSystem(format!(
                        "failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Tries rename first (same filesystem), falls back to copy+delete.
    fn rename_or_copy(src: &Path, dst: &Path) -> Result<()> {
        if fs::rename(src, dst).is_ok() {
            return Ok(());
        }
        fs::copy(src, dst).map_err(|e| {
            Error::FileSystem(format!(
                "failed to copy {} to {}: {e}",
                src.display(),
                dst.display()
            ))
        })?;
        fs::remove_file(src)
            .map_err(|e| Error::FileSystem(format!("failed to remove {}: {e}", src.display())))?;
        Ok(())
    }

    fn unique_destination(dst: &Path) -> PathBuf {
        let parent = dst.parent().unwrap_or(Path::new("."));
        let stem = dst
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let ext = dst
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut counter = 1;
        loop {
            let candidate = parent.join(format!("{stem}_{counter}{ext}"));
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
            if counter > MAX_UNIQUE_ATTEMPTS {
                return parent.join(format!("{stem}_{}{ext}", uuid::Uuid::new_v4()));
            }
        }
    }
}

impl FileSystemManager for SafeFileManager {
    fn create_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| {
            Error::FileSystem(format!("failed to create directory {}: {e}", path.display()))
        })
    }

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if src == dst {
            return Ok(());
        }
        if !src.exists() {
            return Err(Error::FileSystem(format!(
                "source not found: {}",
                src.display()
            )));
        }
        if dst.exists() {
            return Err(Error::FileSystem(format!(
                "destination already exists: {}",
                dst.display()
            )));
        }
        Self::ensure_parent(dst)?;
        Self::rename_or_copy(src, dst)
    }

    fn move_file_unique(&self, src: &Path, dst: &Path) -> Result<PathBuf> {
        if src == dst {
            return Ok(dst.to_path_buf());
        }
        if !src.exists() {
            return Err(Error::FileSystem(format!(
                "source not found: {}",
                src.display()
            )));
        }
        Self::ensure_parent(dst)?;

        let target = if dst.exists() {
            let unique = Self::unique_destination(dst);
            tracing::warn!(
                requested = %dst.display(),
                actual = %unique.display(),
                "destination taken, moving under a unique name"
            );
            unique
        } else {
            dst.to_path_buf()
        };

        Self::rename_or_copy(src, &target)?;
        Ok(target)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        Self::ensure_parent(dst)?;
        fs::copy(src, dst).map_err(|e| {
            Error::FileSystem(format!(
                "failed to copy {} to {}: {e}",
                src.display(),
                dst.display()
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentStatus;

    #[test]
    fn lists_files_recursively_with_sizes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), b"12345").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.docx"), b"123").unwrap();

        let mut files = DiskFileRepository::new().list(dir.path()).unwrap();
        files.sort_by_key(|f| f.file_name());

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name(), "a.pdf");
        assert_eq!(files[0].size_bytes, 5);
        assert_eq!(files[0].status, DocumentStatus::Unvalidated);
        assert_eq!(files[1].file_name(), "b.docx");
        assert_eq!(files[1].size_bytes, 3);
    }

    #[test]
    fn missing_source_directory_is_an_error() {
        let err = DiskFileRepository::new()
            .list(Path::new("/no/such/dir"))
            .unwrap_err();
        assert!(matches!(err, Error::SourceDirectoryNotFound(_)));
    }

    #[test]
    fn move_file_creates_parents_and_moves() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        let dst = dir.path().join("lot/out.txt");
        fs::write(&src, b"payload").unwrap();

        SafeFileManager::new().move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"payload");
    }

    #[test]
    fn move_file_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        let dst = dir.path().join("out.txt");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        let err = SafeFileManager::new().move_file(&src, &dst).unwrap_err();
        assert!(matches!(err, Error::FileSystem(_)));
        assert_eq!(fs::read(&dst).unwrap(), b"old");
        assert!(src.exists());
    }

    #[test]
    fn move_file_to_itself_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        fs::write(&src, b"payload").unwrap();

        SafeFileManager::new().move_file(&src, &src).unwrap();
        assert_eq!(fs::read(&src).unwrap(), b"payload");
    }

    #[test]
    fn move_file_unique_suffixes_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        let dst = dir.path().join("DOC-1_A.pdf");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        let actual = SafeFileManager::new().move_file_unique(&src, &dst).unwrap();

        assert_eq!(actual, dir.path().join("DOC-1_A_1.pdf"));
        assert_eq!(fs::read(&actual).unwrap(), b"new");
        assert_eq!(fs::read(&dst).unwrap(), b"old");
    }

    #[test]
    fn move_file_unique_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SafeFileManager::new()
            .move_file_unique(&dir.path().join("ghost.txt"), &dir.path().join("out.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::FileSystem(_)));
    }

    #[test]
    fn copy_file_keeps_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("template.xlsx");
        let dst = dir.path().join("lots/LOTE_0001.xlsx");
        fs::write(&src, b"book").unwrap();

        SafeFileManager::new().copy_file(&src, &dst).unwrap();

        assert!(src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"book");
    }
}
