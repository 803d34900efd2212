//! Output seam for generated files

use sdkgen_common::{GeneratorError, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination of generated directories and files
#[cfg_attr(test, mockall::automock)]
pub trait SourceWriter {
    /// Create a directory and its parents
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Write a file, replacing existing content
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes generated files to disk
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl SourceWriter for FsWriter {
    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| {
            GeneratorError::Generation(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|e| {
            GeneratorError::Generation(format!("Failed to write {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
        Ok(())
    }
}

/// Records the files a run would write without touching the disk
#[derive(Debug, Default)]
pub struct DryRunWriter {
    files: RefCell<Vec<(PathBuf, usize)>>,
}

impl DryRunWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths recorded so far, in write order
    pub fn files(&self) -> Vec<PathBuf> {
        self.files
            .borrow()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Total size of the recorded contents in bytes
    pub fn total_bytes(&self) -> usize {
        self.files.borrow().iter().map(|(_, size)| size).sum()
    }
}

impl SourceWriter for DryRunWriter {
    fn create_dir(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .push((path.to_path_buf(), contents.len()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_writer_creates_files() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src/types");

        FsWriter.create_dir(&nested).unwrap();
        FsWriter
            .write_file(&nested.join("mod.rs"), "//! Types\n")
            .unwrap();

        assert_eq!(
            fs::read_to_string(nested.join("mod.rs")).unwrap(),
            "//! Types\n"
        );
    }

    #[test]
    fn test_dry_run_writer_records_paths() {
        let writer = DryRunWriter::new();
        writer.create_dir(Path::new("/out/src")).unwrap();
        writer
            .write_file(Path::new("/out/src/lib.rs"), "pub mod client;")
            .unwrap();

        assert_eq!(writer.files(), vec![PathBuf::from("/out/src/lib.rs")]);
        assert_eq!(writer.total_bytes(), 15);
        assert!(!Path::new("/out/src/lib.rs").exists());
    }
}
