use crate::error::{AutoloadError, Result, SchemaLoadError};
use crate::schema::SchemaDefinition;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension a file must carry to be treated as a model schema
pub const SCHEMA_EXTENSION: &str = "json";

/// A parsed model file: the `name` and `schema` exports plus where they came from
#[derive(Debug, Clone)]
pub struct SchemaFile {
    pub name: String,
    pub collection: Option<String>,
    pub schema: SchemaDefinition,
    pub path: PathBuf,
    pub checksum: String,
}

pub struct SchemaLoader {
    dir: PathBuf,
}

impl SchemaLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List candidate schema files directly inside the folder, sorted by file name.
    ///
    /// Sub-directories, dotfiles and files without the `.json` extension are skipped.
    /// A missing or unreadable folder is fatal.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(AutoloadError::SchemaFolderNotFound {
                path: self.dir.clone(),
            });
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| AutoloadError::SchemaFolderUnreadable {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut files = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {:?}: {}", self.dir, e);
                    continue;
                }
            };

            let path = entry.path();
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with('.') {
                debug!("Skipping hidden entry {}", file_name);
                continue;
            }

            if path.is_dir() {
                debug!("Skipping sub-directory {}", file_name);
                continue;
            }

            if path.extension().map_or(true, |ext| ext != SCHEMA_EXTENSION) {
                debug!("Skipping {}: not a .{} file", file_name, SCHEMA_EXTENSION);
                continue;
            }

            files.push(path);
        }

        files.sort_by(|a, b| {
            a.file_name()
                .unwrap_or_default()
                .cmp(b.file_name().unwrap_or_default())
        });

        Ok(files)
    }

    /// Read and parse one model file
    pub fn load(&self, path: &Path) -> std::result::Result<SchemaFile, SchemaLoadError> {
        let data = fs::read(path).map_err(|e| SchemaLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let checksum = compute_checksum(&data);

        let value: Value = serde_json::from_slice(&data).map_err(|e| SchemaLoadError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let name = value
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty());
        let schema = value.get("schema").and_then(Value::as_object);

        let (name, schema) = match (name, schema) {
            (Some(name), Some(schema)) => (name, schema),
            (None, Some(_)) => return Err(SchemaLoadError::MissingExport { missing: "name" }),
            (Some(_), None) => return Err(SchemaLoadError::MissingExport { missing: "schema" }),
            (None, None) => {
                return Err(SchemaLoadError::MissingExport {
                    missing: "name and schema",
                })
            }
        };

        let collection = value
            .get("collection")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(SchemaFile {
            name: name.to_string(),
            collection,
            schema: SchemaDefinition::from_json(schema)?,
            path: path.to_path_buf(),
            checksum,
        })
    }
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_filters_entries() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "a.json", r#"{"name": "A", "schema": {}}"#);
        write(temp_dir.path(), ".hidden.json", r#"{"name": "Hidden", "schema": {}}"#);
        write(temp_dir.path(), "b.txt", "not a schema");
        fs::create_dir(temp_dir.path().join("nested.json")).unwrap();

        let loader = SchemaLoader::new(temp_dir.path());
        let files = loader.discover().unwrap();

        assert_eq!(files, vec![temp_dir.path().join("a.json")]);
    }

    #[test]
    fn test_discover_sorts_by_file_name() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "c.json", "{}");
        write(temp_dir.path(), "a.json", "{}");
        write(temp_dir.path(), "b.json", "{}");

        let files = SchemaLoader::new(temp_dir.path()).discover().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "c.json"]);
    }

    #[test]
    fn test_discover_missing_folder_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = SchemaLoader::new(&missing).discover().unwrap_err();
        assert!(matches!(err, AutoloadError::SchemaFolderNotFound { ref path } if *path == missing));
    }

    #[test]
    fn test_discover_file_instead_of_folder_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = write(temp_dir.path(), "models", "");

        let err = SchemaLoader::new(&file).discover().unwrap_err();
        assert!(matches!(err, AutoloadError::SchemaFolderNotFound { .. }));
    }

    #[test]
    fn test_load_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            temp_dir.path(),
            "user.json",
            r#"{"name": "User", "collection": "people", "schema": {"email": {"type": "String", "required": true}}}"#,
        );

        let file = SchemaLoader::new(temp_dir.path()).load(&path).unwrap();
        assert_eq!(file.name, "User");
        assert_eq!(file.collection.as_deref(), Some("people"));
        assert_eq!(file.schema.len(), 1);
        assert_eq!(file.checksum.len(), 64);
        assert_eq!(file.path, path);
    }

    #[test]
    fn test_load_missing_exports() {
        let temp_dir = TempDir::new().unwrap();
        let loader = SchemaLoader::new(temp_dir.path());

        let only_name = write(temp_dir.path(), "only_name.json", r#"{"name": "X"}"#);
        assert!(matches!(
            loader.load(&only_name),
            Err(SchemaLoadError::MissingExport { missing: "schema" })
        ));

        let only_schema = write(temp_dir.path(), "only_schema.json", r#"{"schema": {}}"#);
        assert!(matches!(
            loader.load(&only_schema),
            Err(SchemaLoadError::MissingExport { missing: "name" })
        ));

        let empty_name = write(temp_dir.path(), "empty_name.json", r#"{"name": "", "schema": {}}"#);
        assert!(matches!(
            loader.load(&empty_name),
            Err(SchemaLoadError::MissingExport { missing: "name" })
        ));

        let neither = write(temp_dir.path(), "neither.json", "[]");
        assert!(matches!(
            loader.load(&neither),
            Err(SchemaLoadError::MissingExport { missing: "name and schema" })
        ));
    }

    #[test]
    fn test_load_broken_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "broken.json", "{ name: ");

        let err = SchemaLoader::new(temp_dir.path()).load(&path).unwrap_err();
        assert!(matches!(err, SchemaLoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
