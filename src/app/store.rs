//! File access for collection sources and pipeline outputs
//!
//! Sources are discovered in name order so that every run visits them in the
//! same sequence. Writes go through a temporary sibling file and a rename,
//! so an interrupted run never leaves a half-written collection behind.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::app::models::Collection;
use crate::app::normalize::normalize;
use crate::constants::files;
use crate::errors::{SourceError, SourceResult};

/// A source file that could not be processed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSource {
    pub file: String,
    pub reason: String,
}

impl FailedSource {
    pub fn new(path: &Path, reason: impl Display) -> Self {
        Self {
            file: file_name(path),
            reason: reason.to_string(),
        }
    }
}

/// Lists files with `extension` directly inside `dir`, sorted by name
///
/// The extension matches case-sensitively, so `bkk.json` and `bkk.JSON`
/// never both become sources. Files whose name appears in `exclude` are
/// skipped.
pub async fn discover_sources(
    dir: &Path,
    extension: &str,
    exclude: &[&str],
) -> SourceResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|_| SourceError::DirectoryNotAccessible {
            path: dir.to_path_buf(),
        })?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SourceError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?
    {
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == extension);
        let excluded = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| exclude.contains(&n));
        if matches_extension && !excluded && path.is_file() {
            paths.push(path);
        }
    }

    paths.sort();
    debug!("Found {} *.{} files in {}", paths.len(), extension, dir.display());
    Ok(paths)
}

/// Stable source identifier: the file stem
pub fn source_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name as displayed in reports
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads and parses a JSON document
pub async fn read_document(path: &Path) -> SourceResult<Value> {
    let bytes = tokio::fs::read(path).await.map_err(|e| SourceError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Reads a collection file and normalizes its shape
pub async fn load_collection(path: &Path) -> SourceResult<Collection> {
    let document = read_document(path).await?;
    let mut collection = normalize(&source_id(path), document);
    collection.file = file_name(path);
    Ok(collection)
}

/// Writes a collection back in the shape it was read in
///
/// Malformed collections are left untouched on disk; returns whether the
/// file was written.
pub async fn save_collection(path: &Path, collection: &Collection) -> SourceResult<bool> {
    match collection.to_document() {
        Some(document) => {
            write_json_atomic(path, &document).await?;
            Ok(true)
        }
        None => {
            warn!("{}: malformed document, not rewriting", path.display());
            Ok(false)
        }
    }
}

/// Serializes `value` as pretty JSON and atomically replaces `path`
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> SourceResult<()> {
    let mut content = serde_json::to_vec_pretty(value).map_err(|e| SourceError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    content.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SourceError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let temp_path = temp_path_for(path);
    tokio::fs::write(&temp_path, &content)
        .await
        .map_err(|e| SourceError::Write {
            path: temp_path.clone(),
            source: e,
        })?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        debug!("Rename of {} failed: {}", temp_path.display(), e);
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(SourceError::AtomicOperationFailed {
            temp_path,
            final_path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Writes `value` to `primary` and, when `copy_dir` exists, a copy named
/// `copy_name` inside it
///
/// A missing copy directory is logged and skipped. Returns the copy path when
/// one was written.
pub async fn write_with_copy<T: Serialize + ?Sized>(
    value: &T,
    primary: &Path,
    copy_dir: Option<&Path>,
    copy_name: &str,
) -> SourceResult<Option<PathBuf>> {
    write_json_atomic(primary, value).await?;

    let Some(dir) = copy_dir else {
        return Ok(None);
    };
    if !dir.is_dir() {
        warn!("Dashboard directory {} not found, skipping copy", dir.display());
        return Ok(None);
    }
    let copy = dir.join(copy_name);
    write_json_atomic(&copy, value).await?;
    Ok(Some(copy))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::DocumentShape;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_discover_sources_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["tensio.json", "bkk.json", "grid_index.json", "notes.txt", "bkk.JSON"] {
            std::fs::write(temp_dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("nested.json")).unwrap();

        let paths = discover_sources(temp_dir.path(), "json", &["grid_index.json"])
            .await
            .unwrap();
        let names: Vec<String> = paths.iter().map(|p| file_name(p)).collect();
        // Upper-case extension is not a source, so ids stay unique
        assert_eq!(names, vec!["bkk.json", "tensio.json"]);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = discover_sources(&temp_dir.path().join("missing"), "json", &[]).await;
        assert!(matches!(
            result,
            Err(SourceError::DirectoryNotAccessible { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_preserves_wrapped_shape() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lede.json");
        let doc = json!([{"type": "FeatureCollection", "features": [{"type": "Feature"}]}]);
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let collection = load_collection(&path).await.unwrap();
        assert_eq!(collection.source_id, "lede");
        assert_eq!(collection.shape, DocumentShape::Wrapped);
        assert!(save_collection(&path, &collection).await.unwrap());

        let reread = read_document(&path).await.unwrap();
        assert_eq!(reread, doc);
        assert!(!temp_dir.path().join("lede.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_malformed_collection_not_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("odd.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let collection = load_collection(&path).await.unwrap();
        assert_eq!(collection.shape, DocumentShape::Malformed);
        assert!(!save_collection(&path, &collection).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1, 2]");
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{\"features\": [").unwrap();
        assert!(matches!(
            load_collection(&path).await,
            Err(SourceError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_ascii_written_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");
        write_json_atomic(&path, &json!({"kommune": "Bærum"})).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Bærum"));
    }

    #[tokio::test]
    async fn test_write_with_copy() {
        let temp_dir = TempDir::new().unwrap();
        let primary = temp_dir.path().join("data").join("grid_index.json");
        let dashboard = temp_dir.path().join("public");

        // Copy directory absent: only the primary is written
        let copy = write_with_copy(&json!({"a": 1}), &primary, Some(&dashboard), "grid_index.json")
            .await
            .unwrap();
        assert!(copy.is_none());
        assert!(primary.exists());

        std::fs::create_dir(&dashboard).unwrap();
        let copy = write_with_copy(&json!({"a": 2}), &primary, Some(&dashboard), "grid_index.json")
            .await
            .unwrap();
        assert_eq!(copy, Some(dashboard.join("grid_index.json")));
        assert_eq!(
            read_document(&dashboard.join("grid_index.json")).await.unwrap(),
            json!({"a": 2})
        );
    }
}
