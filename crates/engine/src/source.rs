//! Catalog source implementations.
//!
//! - [`FileCatalog`]: JSON or YAML file on disk, chosen by extension
//! - [`StaticCatalog`]: records already in memory

use crate::record::StarterRecord;
use crate::traits::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Accepted top-level shapes: a bare list, or `{ starters: [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<StarterRecord>),
    Wrapped { starters: Vec<StarterRecord> },
}

impl CatalogFile {
    fn into_records(self) -> Vec<StarterRecord> {
        match self {
            CatalogFile::List(records) => records,
            CatalogFile::Wrapped { starters } => starters,
        }
    }
}

// ===========================================================================
// File-backed catalog
// ===========================================================================

pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_error(&self, e: impl std::fmt::Display) -> CapError {
        CapError::Parse(format!("{}: {}", self.path.display(), e))
    }
}

impl CatalogSource for FileCatalog {
    fn load(&self) -> CapResult<Vec<StarterRecord>> {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let is_json = match ext.as_deref() {
            Some("json") => true,
            Some("yaml") | Some("yml") => false,
            _ => {
                return Err(CapError::Unsupported(format!(
                    "catalog format of {} (expected .json, .yaml or .yml)",
                    self.path.display()
                )))
            }
        };

        let text = std::fs::read_to_string(&self.path)?;
        let parsed: CatalogFile = if is_json {
            serde_json::from_str(&text).map_err(|e| self.parse_error(e))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| self.parse_error(e))?
        };

        let records = parsed.into_records();
        tracing::info!(path = %self.path.display(), records = records.len(), "catalog file loaded");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ===========================================================================
// In-memory catalog
// ===========================================================================

pub struct StaticCatalog(pub Vec<StarterRecord>);

impl CatalogSource for StaticCatalog {
    fn load(&self) -> CapResult<Vec<StarterRecord>> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} records)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tmp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("starter_engine_{}_{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_json_list() {
        let path = write_tmp(
            "list.json",
            r#"[{ "id": "a", "tags": ["blog"], "stars": 3, "updated_at": "2024-01-01T00:00:00Z" }]"#,
        );
        let records = FileCatalog::new(&path).load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stars, 3);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_yaml_wrapped() {
        let path = write_tmp(
            "wrapped.yaml",
            r#"
starters:
  - id: a
    updated_at: "2024-01-01T00:00:00Z"
    dependencies:
      - [gatsby, "^2.0.0"]
  - id: b
    updated_at: "2024-02-01T00:00:00Z"
"#,
        );
        let records = FileCatalog::new(&path).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dependencies.as_ref().unwrap()[0].name(), "gatsby");
        assert!(records[1].dependencies.is_none());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let path = write_tmp("catalog.toml", "");
        let err = FileCatalog::new(&path).load().unwrap_err();
        assert!(matches!(err, CapError::Unsupported(_)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let path = write_tmp("broken.json", "{ not json");
        let err = FileCatalog::new(&path).load().unwrap_err();
        assert!(matches!(err, CapError::Parse(_)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FileCatalog::new("/nonexistent/starters.json").load().unwrap_err();
        assert!(matches!(err, CapError::Io(_)));
    }
}
