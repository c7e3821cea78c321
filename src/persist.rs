//! Config persistence: patch single fields in TOML documents while preserving
//! formatting.
//!
//! Uses `toml_edit` for comment-preserving edits. Keys and values are checked
//! against the schema before anything is written, so a persisted document always
//! reads back cleanly. When no file exists yet, starts from an empty document
//! with the settings' root table and version. Creates parent directories as
//! needed.

use std::path::Path;

use toml_edit::{DocumentMut, Item, Table};

use crate::coerce;
use crate::document;
use crate::error::ArgfigError;
use crate::ops::{self, ConfigResult};
use crate::schema::{FieldId, Schema, Settings};
use crate::tokenize;
use crate::types::{TypeTag, Value};

/// Pure function: patch a document string, setting field `key` to `raw_value`.
///
/// `raw_value` uses command-line syntax: arrays and structs take
/// whitespace-separated (optionally quoted) tokens, scalars take the text as is.
/// A field stored under its short name is rewritten under its long name.
pub fn set_in_document<S: Settings>(
    schema: &Schema<S>,
    content: Option<&str>,
    key: &str,
    raw_value: &str,
) -> Result<String, ArgfigError> {
    let id = schema
        .lookup(key)
        .ok_or_else(|| ArgfigError::KeyNotFound(key.into()))?;
    let d = schema.descriptor(id);
    if d.flags.cli_only {
        return Err(ArgfigError::InvalidValue {
            key: d.name.clone(),
            reason: "parameter can only be specified at the command line".into(),
        });
    }
    let value = parse_raw(&d.tag, raw_value).map_err(|reason| ArgfigError::InvalidValue {
        key: d.name.clone(),
        reason,
    })?;

    let mut doc = match content {
        Some(c) => parse(c, &d.name)?,
        None => {
            let mut doc = DocumentMut::new();
            doc["version"] = toml_edit::value(S::VERSION);
            doc
        }
    };
    let root = doc
        .entry(S::TYPE_NAME)
        .or_insert(Item::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| ArgfigError::InvalidValue {
            key: d.name.clone(),
            reason: format!("{} is not a table", S::TYPE_NAME),
        })?;

    remove_aliases(schema, root, id, Some(&d.name));
    match document::to_item(&d.tag, &value) {
        Some(item) => {
            let existed = root.contains_key(&d.name);
            root[d.name.as_str()] = item;
            if !existed && !d.help.is_empty() {
                document::annotate(root, &d.name, &d.help);
            }
        }
        None => {
            root.remove(&d.name);
        }
    }

    Ok(doc.to_string())
}

/// Pure function: remove field `key` (under any of its names) from a document string.
pub fn unset_in_document<S: Settings>(
    schema: &Schema<S>,
    content: &str,
    key: &str,
) -> Result<String, ArgfigError> {
    let id = schema
        .lookup(key)
        .ok_or_else(|| ArgfigError::KeyNotFound(key.into()))?;
    let mut doc = parse(content, key)?;
    if let Some(root) = doc.get_mut(S::TYPE_NAME).and_then(Item::as_table_mut) {
        remove_aliases(schema, root, id, None);
    }
    Ok(doc.to_string())
}

/// I/O wrapper: reads file (if it exists), patches it, writes back.
/// Creates parent directories if needed.
pub fn persist_value<S: Settings>(
    schema: &Schema<S>,
    file_path: &Path,
    key: &str,
    value: &str,
) -> Result<ConfigResult, ArgfigError> {
    let content = read_existing(file_path)?;
    if let Some(c) = &content {
        check_syntax(file_path, c)?;
    }
    let new_content = set_in_document(schema, content.as_deref(), key, value)?;
    ops::write_output(file_path, &new_content)?;

    let name = schema
        .lookup(key)
        .map(|id| schema.descriptor(id).name.clone())
        .unwrap_or_else(|| key.to_string());
    Ok(ConfigResult::ValueSet {
        key: name,
        value: value.into(),
    })
}

/// I/O wrapper: removes a field from the file. A missing file is left missing.
pub fn unset_value<S: Settings>(
    schema: &Schema<S>,
    file_path: &Path,
    key: &str,
) -> Result<ConfigResult, ArgfigError> {
    let id = schema
        .lookup(key)
        .ok_or_else(|| ArgfigError::KeyNotFound(key.into()))?;
    if let Some(content) = read_existing(file_path)? {
        check_syntax(file_path, &content)?;
        let new_content = unset_in_document(schema, &content, key)?;
        ops::write_output(file_path, &new_content)?;
    }
    Ok(ConfigResult::ValueUnset {
        key: schema.descriptor(id).name.clone(),
    })
}

fn read_existing(file_path: &Path) -> Result<Option<String>, ArgfigError> {
    match std::fs::read_to_string(file_path) {
        Ok(c) => Ok(Some(c)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ArgfigError::IoError {
            path: file_path.to_path_buf(),
            source: e,
        }),
    }
}

fn check_syntax(file_path: &Path, content: &str) -> Result<(), ArgfigError> {
    content
        .parse::<DocumentMut>()
        .map(|_| ())
        .map_err(|e| ArgfigError::ParseError {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn parse(content: &str, key: &str) -> Result<DocumentMut, ArgfigError> {
    content
        .parse()
        .map_err(|e: toml_edit::TomlError| ArgfigError::InvalidValue {
            key: key.into(),
            reason: e.to_string(),
        })
}

/// Drop every key in `root` that names field `id`, except `keep`.
fn remove_aliases<S>(schema: &Schema<S>, root: &mut Table, id: FieldId, keep: Option<&str>) {
    let stale: Vec<String> = root
        .iter()
        .map(|(k, _)| k.to_string())
        .filter(|k| schema.lookup(k) == Some(id) && Some(k.as_str()) != keep)
        .collect();
    for k in stale {
        root.remove(&k);
    }
}

/// Parse a raw value the way the command line would.
fn parse_raw(tag: &TypeTag, raw: &str) -> Result<Value, String> {
    if let Some(element) = tag.array_element() {
        let tokens = tokenize::split_arguments(raw);
        let items = match element.normalize() {
            TypeTag::Struct(s) => tokens
                .chunks(s.members.len())
                .map(|chunk| {
                    let parts: Vec<&str> = chunk.iter().map(String::as_str).collect();
                    coerce::parse_struct(s, &parts)
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => tokens
                .iter()
                .map(|token| coerce::parse_text(element, token))
                .collect::<Result<Vec<_>, _>>()?,
        };
        return Ok(Value::Array(items));
    }

    match tag.normalize() {
        TypeTag::Struct(s) => {
            let tokens = tokenize::split_arguments(raw);
            if tokens.len() > s.members.len() {
                return Err("too many values".into());
            }
            let parts: Vec<&str> = tokens.iter().map(String::as_str).collect();
            coerce::parse_struct(s, &parts)
        }
        _ => coerce::parse_text(tag, raw),
    }
}
