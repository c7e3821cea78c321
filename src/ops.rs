//! Config operations: listing, key lookup, document and schema output, and the
//! result types callers display.
//!
//! Provides the logic behind `config list`, `config get`, `config gen`,
//! `config schema`, `config set` and `config unset`. Everything here works on a
//! [`Schema`] plus an already-parsed settings value; nothing depends on how the
//! caller's own command line is structured.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::coerce;
use crate::error::ArgfigError;
use crate::schema::Schema;
use crate::types::Value;

/// A config subcommand, independent of any CLI framework.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Show every visible field and its current value.
    List,
    /// Show one field's value and help text.
    Get { key: String },
    /// Write the current settings as a document, to `output` or as text.
    Gen { output: Option<PathBuf> },
    /// Write the document meta-schema, to `output` or as text.
    Schema { output: Option<PathBuf> },
    /// Persist one field into the document at `path`.
    Set {
        path: PathBuf,
        key: String,
        value: String,
    },
    /// Remove one field from the document at `path`.
    Unset { path: PathBuf, key: String },
}

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated document.
    Document(String),
    /// Confirmation that a document was written to a file.
    DocumentWritten { path: PathBuf },
    /// A generated meta-schema, pretty-printed.
    Schema(String),
    /// Confirmation that a meta-schema was written to a file.
    SchemaWritten { path: PathBuf },
    /// A field's current value and its help text.
    KeyValue {
        key: String,
        value: String,
        doc: Vec<String>,
    },
    /// Confirmation that a value was persisted.
    ValueSet { key: String, value: String },
    /// Confirmation that a value was removed.
    ValueUnset { key: String },
    /// All visible fields and their values.
    Listing { entries: Vec<(String, String)> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Document(text) | ConfigResult::Schema(text) => write!(f, "{text}"),
            ConfigResult::DocumentWritten { path } => {
                write!(f, "Config document written to {}", path.display())
            }
            ConfigResult::SchemaWritten { path } => {
                write!(f, "Config schema written to {}", path.display())
            }
            ConfigResult::KeyValue { key, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {value}")
            }
            ConfigResult::ValueSet { key, value } => write!(f, "Set {key} = {value}"),
            ConfigResult::ValueUnset { key } => write!(f, "Unset {key}"),
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Get a field's value by long or short name, including its help text.
pub fn get_value<S>(schema: &Schema<S>, settings: &S, key: &str) -> Result<ConfigResult, ArgfigError> {
    let id = schema
        .lookup(key)
        .ok_or_else(|| ArgfigError::KeyNotFound(key.into()))?;
    let d = schema.descriptor(id);
    Ok(ConfigResult::KeyValue {
        key: d.name.clone(),
        value: format_value(&schema.get(id, settings)),
        doc: d.help.lines().map(str::to_string).collect(),
    })
}

/// List every non-hidden field in usage order.
pub fn list_values<S>(schema: &Schema<S>, settings: &S) -> ConfigResult {
    let entries = schema
        .ordered()
        .iter()
        .filter(|id| !schema.descriptor(**id).flags.hidden)
        .map(|&id| {
            (
                schema.descriptor(id).name.clone(),
                format_value(&schema.get(id, settings)),
            )
        })
        .collect();
    ConfigResult::Listing { entries }
}

/// Format a value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => coerce::to_text(other),
    }
}

/// Write `content` to `path`, creating parent directories as needed.
pub(crate) fn write_output(path: &Path, content: &str) -> Result<(), ArgfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ArgfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| ArgfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Build, Point};
    use tempfile::TempDir;

    fn build() -> Build {
        Build {
            name: "nightly".into(),
            count: vec![1, 2],
            origin: Some(Point { x: 3, y: 4 }),
            secret: "hidden".into(),
            ..Build::default()
        }
    }

    #[test]
    fn get_by_long_name() {
        let schema = Schema::<Build>::new().unwrap();
        let result = get_value(&schema, &build(), "name").unwrap();
        assert_eq!(
            result,
            ConfigResult::KeyValue {
                key: "name".into(),
                value: "nightly".into(),
                doc: vec!["Name of the build.".into()],
            }
        );
    }

    #[test]
    fn get_by_short_name_reports_long_name() {
        let schema = Schema::<Build>::new().unwrap();
        match get_value(&schema, &build(), "N").unwrap() {
            ConfigResult::KeyValue { key, .. } => assert_eq!(key, "name"),
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_formats_compound_values() {
        let schema = Schema::<Build>::new().unwrap();
        let b = build();
        let value = |key| match get_value(&schema, &b, key).unwrap() {
            ConfigResult::KeyValue { value, .. } => value,
            other => panic!("Expected KeyValue, got {other:?}"),
        };
        assert_eq!(value("count"), "[1, 2]");
        assert_eq!(value("origin"), "3 4");
        assert_eq!(value("limit"), "<not set>");
    }

    #[test]
    fn get_nonexistent_key() {
        let schema = Schema::<Build>::new().unwrap();
        let result = get_value(&schema, &build(), "nonexistent");
        assert!(matches!(result, Err(ArgfigError::KeyNotFound(_))));
    }

    #[test]
    fn list_skips_hidden_fields() {
        let schema = Schema::<Build>::new().unwrap();
        let ConfigResult::Listing { entries } = list_values(&schema, &build()) else {
            panic!("Expected Listing");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"name"));
        assert!(keys.contains(&"log"));
        assert!(!keys.contains(&"secret"));
        assert_eq!(entries.len(), schema.len() - 1);
    }

    #[test]
    fn key_value_display_includes_doc() {
        let result = ConfigResult::KeyValue {
            key: "port".into(),
            value: "8080".into(),
            doc: vec!["Port to listen on.".into()],
        };
        assert_eq!(result.to_string(), "# Port to listen on.\nport = 8080");
    }

    #[test]
    fn listing_display_format() {
        let result = ConfigResult::Listing {
            entries: vec![
                ("host".into(), "localhost".into()),
                ("port".into(), "8080".into()),
            ],
        };
        assert_eq!(result.to_string(), "host = localhost\nport = 8080");
    }

    #[test]
    fn write_output_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("out.toml");
        write_output(&path, "x = 1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x = 1\n");
    }
}
