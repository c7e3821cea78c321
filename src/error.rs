use std::path::PathBuf;

use thiserror::Error;

use crate::context::ErrorTable;

/// A malformed field declaration. Raised once, when the schema is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Invalid argument name '{0}': names must match ^\\w[\\w-]*$")]
    InvalidName(String),

    #[error("Argument name '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("Argument '{field}' has an unsupported type: {reason}")]
    InvalidType { field: String, reason: String },

    #[error("Only one default argument is allowed, but both '{first}' and '{second}' are marked default")]
    MultipleDefaults { first: String, second: String },

    #[error("Default argument '{0}' cannot be a boolean switch")]
    BooleanDefault(String),
}

#[derive(Debug, Error)]
pub enum ArgfigError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("{0}")]
    Invalid(ErrorTable),

    #[error("{0}")]
    UsageRequested(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ErrorSource;

    #[test]
    fn invalid_name_formats() {
        let err = SchemaError::InvalidName("bad name".into());
        assert!(err.to_string().contains("'bad name'"));
    }

    #[test]
    fn multiple_defaults_names_both_fields() {
        let err = SchemaError::MultipleDefaults {
            first: "target".into(),
            second: "input".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("target"));
        assert!(msg.contains("input"));
    }

    #[test]
    fn invalid_displays_the_combined_table() {
        let mut table = ErrorTable::new();
        table.record("name", "missing required argument", ErrorSource::CommandLine);
        let err = ArgfigError::Invalid(table);
        assert_eq!(err.to_string(), "name: missing required argument");
    }

    #[test]
    fn key_not_found_formats() {
        let err = ArgfigError::KeyNotFound("origin".into());
        assert!(err.to_string().contains("origin"));
    }
}
