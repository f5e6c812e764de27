//! Schema loader for populating a registry from disk
//!
//! Reads every `*.json` file in a directory into a [`SchemaRegistry`].
//! Documents carrying an `$id` register under it; every file also registers
//! under its bare filename so neighbors can reference each other without
//! absolute URIs. Malformed files fail the whole load.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::registry::SchemaRegistry;
use crate::keywords::KeywordRegistry;
use crate::observability::Logger;

/// Loads schema documents from a directory into a registry.
pub struct SchemaLoader {
    schema_dir: PathBuf,
}

impl SchemaLoader {
    /// Creates a loader rooted at the given directory.
    pub fn new(schema_dir: impl AsRef<Path>) -> Self {
        Self {
            schema_dir: schema_dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every `*.json` file into `registry`, returning how many
    /// documents were registered. Non-JSON files are skipped with a warning.
    pub fn load_all(
        &self,
        registry: &mut SchemaRegistry,
        keywords: &KeywordRegistry,
    ) -> SchemaResult<usize> {
        let entries = fs::read_dir(&self.schema_dir).map_err(|e| SchemaError::Malformed {
            path: self.schema_dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut loaded = 0;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                Logger::warn(
                    "SCHEMA_FILE_SKIPPED",
                    &[("path", &path.display().to_string())],
                );
                continue;
            }
            self.load_file(&path, registry, keywords)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    fn load_file(
        &self,
        path: &Path,
        registry: &mut SchemaRegistry,
        keywords: &KeywordRegistry,
    ) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Malformed {
            path: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;

        let raw: Value = serde_json::from_str(&content).map_err(|e| SchemaError::Malformed {
            path: path.display().to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("schema.json")
            .to_string();

        // The document's own $id wins; the filename is always an alias.
        let uri = raw
            .get("$id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| filename.clone());

        let id = registry.register(&uri, &raw, keywords)?;
        if uri != filename {
            let root = registry
                .schema(id)
                .to_value(registry.arena());
            // Alias under the filename without re-parsing the original text.
            registry.register(&filename, &root, keywords)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_schema(dir: &Path, name: &str, value: &serde_json::Value) {
        fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn test_load_all_registers_by_filename() {
        let tmp = TempDir::new().unwrap();
        write_schema(tmp.path(), "user.json", &json!({"type": "object"}));
        write_schema(tmp.path(), "tag.json", &json!({"type": "string"}));

        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        let loaded = SchemaLoader::new(tmp.path())
            .load_all(&mut registry, &keywords)
            .unwrap();

        assert_eq!(loaded, 2);
        assert!(registry.lookup("user.json").is_some());
        assert!(registry.lookup("tag.json").is_some());
    }

    #[test]
    fn test_document_id_wins_over_filename() {
        let tmp = TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            "anything.json",
            &json!({"$id": "https://schemas.invalid/user.json", "type": "object"}),
        );

        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        SchemaLoader::new(tmp.path())
            .load_all(&mut registry, &keywords)
            .unwrap();

        assert!(registry.lookup("https://schemas.invalid/user.json").is_some());
        assert!(registry.lookup("anything.json").is_some());
    }

    #[test]
    fn test_malformed_file_fails_the_load() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.json"), "{ not json").unwrap();

        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        let err = SchemaLoader::new(tmp.path())
            .load_all(&mut registry, &keywords)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        assert!(SchemaLoader::new(&missing)
            .load_all(&mut registry, &keywords)
            .is_err());
    }

    #[test]
    fn test_non_json_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_schema(tmp.path(), "ok.json", &json!(true));
        fs::write(tmp.path().join("README.md"), "# docs").unwrap();

        let keywords = KeywordRegistry::with_defaults();
        let mut registry = SchemaRegistry::new();
        let loaded = SchemaLoader::new(tmp.path())
            .load_all(&mut registry, &keywords)
            .unwrap();
        assert_eq!(loaded, 1);
    }
}
