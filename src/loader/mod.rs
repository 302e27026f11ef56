//! Document loaders and file discovery.
//!
//! [`TextLoader`] reads a whole UTF-8 file into one document.
//! [`CsvLoader`] turns every CSV record into its own document whose
//! content lists each field as a `header: value` line, matching how the
//! QA pipeline wants tabular records presented to the retrievers.
//! [`discover_files`] walks a directory tree for files with a given
//! extension; results are sorted so runs are deterministic.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::types::{AppError, Document, DocumentMetadata, Result};

pub struct TextLoader;

impl TextLoader {
    pub fn load(path: &Path) -> Result<Document> {
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), chars = content.chars().count(), "loaded text file");
        Ok(Document::new(
            content,
            DocumentMetadata::from_source(path.to_string_lossy()),
        ))
    }
}

pub struct CsvLoader;

impl CsvLoader {
    /// Load one document per CSV record. The header row supplies the
    /// field names; `row` in the metadata is the zero-based record
    /// index, not the file line number.
    pub fn load(path: &Path) -> Result<Vec<Document>> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            AppError::InvalidInput(format!("Failed to open CSV {}: {}", path.display(), e))
        })?;
        let headers = reader
            .headers()
            .map_err(|e| {
                AppError::InvalidInput(format!("Failed to read CSV headers in {}: {}", path.display(), e))
            })?
            .clone();

        let source = path.to_string_lossy().to_string();
        let mut documents = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                AppError::InvalidInput(format!(
                    "Malformed CSV record in {} (record {}): {}",
                    path.display(),
                    row,
                    e
                ))
            })?;

            let content = headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| format!("{}: {}", header, value))
                .collect::<Vec<_>>()
                .join("\n");

            let mut metadata = DocumentMetadata::from_source(&source);
            metadata.row = Some(row);
            documents.push(Document::new(content, metadata));
        }

        info!(path = %path.display(), records = documents.len(), "loaded CSV file");
        Ok(documents)
    }
}

/// Recursively find regular files under `dir` whose extension matches
/// `extension` (without the leading dot), sorted by path.
pub fn discover_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::NotFound(format!(
            "Data directory {} does not exist",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}

/// Load every CSV file under `dir` into a single document list.
pub fn load_csv_dir(dir: &Path) -> Result<Vec<Document>> {
    let files = discover_files(dir, "csv")?;
    let mut documents = Vec::new();
    for file in &files {
        documents.extend(CsvLoader::load(file)?);
    }
    info!(files = files.len(), documents = documents.len(), "loaded CSV directory");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn text_loader_reads_whole_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("book.txt");
        fs::write(&path, "line one\nline two").unwrap();

        let doc = TextLoader::load(&path).unwrap();
        assert_eq!(doc.content, "line one\nline two");
        assert!(doc.metadata.source.ends_with("book.txt"));
        assert_eq!(doc.metadata.row, None);
    }

    #[test]
    fn text_loader_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = TextLoader::load(&tmp.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn csv_loader_makes_one_document_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pets.csv");
        fs::write(&path, "name,species\nRex,dog\nWhiskers,cat\n").unwrap();

        let docs = CsvLoader::load(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "name: Rex\nspecies: dog");
        assert_eq!(docs[0].metadata.row, Some(0));
        assert_eq!(docs[1].content, "name: Whiskers\nspecies: cat");
        assert_eq!(docs[1].metadata.row, Some(1));
    }

    #[test]
    fn csv_loader_empty_body_yields_no_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.csv");
        fs::write(&path, "name,species\n").unwrap();

        let docs = CsvLoader::load(&path).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn discover_files_walks_subdirectories_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("b.csv"), "h\nv\n").unwrap();
        fs::write(tmp.path().join("sub/a.csv"), "h\nv\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let files = discover_files(tmp.path(), "csv").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.csv"));
        assert!(files[1].ends_with("sub/a.csv"));
    }

    #[test]
    fn discover_files_missing_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_files(&tmp.path().join("absent"), "csv").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn load_csv_dir_merges_all_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("one.csv"), "h\na\nb\n").unwrap();
        fs::write(tmp.path().join("two.csv"), "h\nc\n").unwrap();

        let docs = load_csv_dir(tmp.path()).unwrap();
        assert_eq!(docs.len(), 3);
    }
}
