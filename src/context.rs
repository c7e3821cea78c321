//! Per-invocation parse state and the error table it produces.
//!
//! A [`ParseContext`] lives for exactly one parse call. It remembers which
//! fields each source has set, accumulates repeated array values until the
//! token stream is exhausted, and owns the [`ErrorTable`] handed back to the
//! caller.
//!
//! # Precedence
//!
//! The command line always wins. A command-line error replaces a document
//! error for the same key, a successful command-line value clears a document
//! error for its field, and a document error never replaces a command-line
//! error. Within a single source the first error recorded for a key is kept.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::schema::FieldId;
use crate::types::Value;

/// Which input produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    CommandLine,
    ConfigurationFile,
}

#[derive(Debug, Clone, PartialEq)]
struct ErrorEntry {
    key: String,
    message: String,
    source: ErrorSource,
}

/// Field-keyed error messages. Keys compare case-insensitively.
///
/// The empty key holds errors that belong to no field (failed file loads,
/// stray default arguments). `Display` renders one line per entry as
/// `key: message`, or the bare message for the empty key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorTable {
    entries: BTreeMap<String, ErrorEntry>,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, honoring command-line-wins precedence.
    pub fn record(&mut self, key: &str, message: impl Into<String>, source: ErrorSource) {
        let folded = key.to_lowercase();
        if let Some(existing) = self.entries.get(&folded) {
            let replaces = source == ErrorSource::CommandLine
                && existing.source == ErrorSource::ConfigurationFile;
            if !replaces {
                return;
            }
        }
        self.entries.insert(
            folded,
            ErrorEntry {
                key: key.to_string(),
                message: message.into(),
                source,
            },
        );
    }

    /// Record an error, adding a line to an existing entry from the same source.
    ///
    /// Used for the empty key, which collects failures not tied to one field.
    pub fn record_appending(&mut self, key: &str, message: impl Into<String>, source: ErrorSource) {
        match self.entries.get_mut(&key.to_lowercase()) {
            Some(existing) if existing.source == source => {
                existing.message.push('\n');
                existing.message.push_str(&message.into());
            }
            _ => self.record(key, message, source),
        }
    }

    /// Record an error only when nothing is recorded for `key` yet.
    pub fn record_if_absent(&mut self, key: &str, message: impl Into<String>, source: ErrorSource) {
        if !self.contains(key) {
            self.record(key, message, source);
        }
    }

    /// Add an error from a validation hook.
    pub fn add(&mut self, key: &str, message: impl Into<String>) {
        self.record(key, message, ErrorSource::CommandLine);
    }

    /// Drop a document error for `key`; command-line errors stay.
    pub fn clear_document_error(&mut self, key: &str) {
        let folded = key.to_lowercase();
        if self
            .entries
            .get(&folded)
            .is_some_and(|e| e.source == ErrorSource::ConfigurationFile)
        {
            self.entries.remove(&folded);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|e| e.message.as_str())
    }

    pub fn source(&self, key: &str) -> Option<ErrorSource> {
        self.entries.get(&key.to_lowercase()).map(|e| e.source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, message)` pairs, ordered by case-folded key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.key.as_str(), e.message.as_str()))
    }
}

impl fmt::Display for ErrorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, message)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if key.is_empty() {
                write!(f, "{message}")?;
            } else {
                write!(f, "{key}: {message}")?;
            }
        }
        Ok(())
    }
}

/// Mutable state for one parse call.
#[derive(Debug, Default)]
pub struct ParseContext {
    pending: HashMap<FieldId, Vec<Value>>,
    set_by_command_line: HashSet<FieldId>,
    set_by_document: HashSet<FieldId>,
    pub errors: ErrorTable,
    pub usage_requested: bool,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_command_line(&mut self, id: FieldId) {
        self.set_by_command_line.insert(id);
    }

    pub fn mark_document(&mut self, id: FieldId) {
        self.set_by_document.insert(id);
    }

    pub fn is_set_by_command_line(&self, id: FieldId) -> bool {
        self.set_by_command_line.contains(&id)
    }

    pub fn is_set(&self, id: FieldId) -> bool {
        self.set_by_command_line.contains(&id) || self.set_by_document.contains(&id)
    }

    /// Append an array element from the command line.
    ///
    /// The first command-line element discards anything a document contributed.
    pub fn append_from_command_line(&mut self, id: FieldId, value: Value) {
        if !self.set_by_command_line.contains(&id) {
            self.pending.remove(&id);
        }
        self.pending.entry(id).or_default().push(value);
        self.mark_command_line(id);
    }

    /// Append an array element from a document, unless the command line owns the field.
    pub fn append_from_document(&mut self, id: FieldId, value: Value) {
        if !self.set_by_command_line.contains(&id) {
            self.pending.entry(id).or_default().push(value);
        }
        self.mark_document(id);
    }

    /// Drain accumulated array values, in field order.
    pub fn take_pending(&mut self) -> Vec<(FieldId, Vec<Value>)> {
        let mut pending: Vec<_> = self.pending.drain().collect();
        pending.sort_by_key(|(id, _)| *id);
        pending
    }
}
