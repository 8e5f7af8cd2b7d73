//! # Schema Sources
//!
//! A [`SchemaSource`] is the raw schema text, used verbatim as the cache key.
//! Two sources with identical text are the same schema, however they were
//! built. [`SchemaCatalog`] collects named sources from a directory of
//! `*.schema.json` files so they can be compiled before serving traffic.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::SchemaLoadError;

const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Immutable JSON Schema text.
///
/// Cloning is cheap (the text is reference counted).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaSource(Arc<str>);

impl SchemaSource {
    /// Wrap schema text.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Build a source from an in-memory JSON value.
    ///
    /// The value is serialized compactly, so two equal values always map to
    /// the same cache key.
    pub fn from_value(value: &Value) -> Self {
        Self::new(value.to_string())
    }

    /// Read a source from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(text))
    }

    /// The schema text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SchemaSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SchemaSource {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SchemaSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SchemaSource {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaSource").field(&self.0.as_ref()).finish()
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named schema sources, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    entries: BTreeMap<String, SchemaSource>,
}

impl SchemaCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<name>.schema.json` file in `dir`.
    ///
    /// Other files and subdirectories are skipped. The file is read as text
    /// only; compiling is left to the cache so that every compile goes
    /// through the same path.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SchemaLoadError> {
        let dir = dir.as_ref();
        let io_err = |source| SchemaLoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut catalog = Self::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(name) = file_name.strip_suffix(SCHEMA_FILE_SUFFIX) else {
                continue;
            };
            if !is_valid_name(name) {
                return Err(SchemaLoadError::InvalidName {
                    path: path.clone(),
                    reason: "schema names may only contain ASCII letters, digits, '-', '_' and '.'"
                        .to_string(),
                });
            }
            let source = SchemaSource::from_file(&path)?;
            tracing::debug!(schema = name, path = %path.display(), "loaded schema source");
            catalog.insert(name, source);
        }
        Ok(catalog)
    }

    /// Add or replace a named source.
    pub fn insert(&mut self, name: impl Into<String>, source: SchemaSource) -> Option<SchemaSource> {
        self.entries.insert(name.into(), source)
    }

    /// Look up a source by name.
    pub fn get(&self, name: &str) -> Option<&SchemaSource> {
        self.entries.get(name)
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog holds no sources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, source)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaSource)> {
        self.entries.iter().map(|(name, source)| (name.as_str(), source))
    }

    /// The sources alone, in name order.
    pub fn sources(&self) -> impl Iterator<Item = &SchemaSource> {
        self.entries.values()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_text_is_the_same_source() {
        let a = SchemaSource::new(r#"{"type":"object"}"#);
        let b = SchemaSource::from(String::from(r#"{"type":"object"}"#));
        assert_eq!(a, b);
        assert_ne!(a, SchemaSource::new(r#"{ "type": "object" }"#));
    }

    #[test]
    fn from_value_is_canonical() {
        let a = SchemaSource::from_value(&json!({"type": "integer"}));
        let b = SchemaSource::from_value(&serde_json::from_str(r#"{ "type" :  "integer" }"#).unwrap());
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"{"type":"integer"}"#);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = SchemaSource::from_file("/definitely/not/here.schema.json").unwrap_err();
        assert!(matches!(err, SchemaLoadError::Io { .. }));
    }

    #[test]
    fn load_dir_picks_schema_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("order.schema.json"), r#"{"type":"object"}"#).unwrap();
        std::fs::write(dir.path().join("user.v2.schema.json"), r#"{"type":"array"}"#).unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested.schema.json")).unwrap();

        let catalog = SchemaCatalog::load_dir(dir.path()).unwrap();
        let names: Vec<&str> = catalog.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["order", "user.v2"]);
        assert_eq!(catalog.get("order").unwrap().as_str(), r#"{"type":"object"}"#);
    }

    #[test]
    fn load_dir_rejects_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad name.schema.json"), "{}").unwrap();

        let err = SchemaCatalog::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SchemaLoadError::InvalidName { .. }));
    }

    #[test]
    fn load_dir_missing_directory() {
        let err = SchemaCatalog::load_dir("/definitely/not/a/dir").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/a/dir"));
    }
}
