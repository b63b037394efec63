//! Finding documents to ingest: explicit files are taken as given, directories are
//! walked for files with a supported extension.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::extract::Format;

/// Every supported document under `root`, sorted by path.
/// Hidden files and directories are skipped; symlinks are not followed.
pub fn scan_documents(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.map_err(|e| ScanError::Walk(e.to_string()))?;
        let path = entry.path();
        if entry.file_type().is_file() && Format::from_path(path).is_ok() {
            found.push(path.to_path_buf());
        }
    }
    Ok(found)
}

/// Expand a mix of files and directories into a flat list of document paths.
/// Files are kept even if their extension is unsupported, so the ingestion report
/// can say why they were skipped.
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut out = Vec::new();
    for p in paths {
        if p.is_dir() {
            out.extend(scan_documents(p)?);
        } else {
            out.push(p.clone());
        }
    }
    Ok(out)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_supported_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("a.txt"), "a").unwrap();
        std::fs::write(root.join("sub/b.PDF"), "b").unwrap();
        std::fs::write(root.join("sub/c.md"), "c").unwrap();
        std::fs::write(root.join(".hidden.txt"), "h").unwrap();
        std::fs::write(root.join(".git/d.txt"), "d").unwrap();

        let found = scan_documents(root).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.txt"), PathBuf::from("sub/b.PDF")]);
    }

    #[test]
    fn scan_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "a").unwrap();
        assert!(matches!(scan_documents(&file), Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn collect_keeps_explicit_files() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("x.txt"), "x").unwrap();
        let odd = dir.path().join("slides.pptx");
        std::fs::write(&odd, "p").unwrap();

        let all = collect_documents(&[odd.clone(), docs.clone()]).unwrap();
        assert_eq!(all, vec![odd, docs.join("x.txt")]);
    }
}
