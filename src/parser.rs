//! Command-line parsing: a left-to-right scan over argument tokens.
//!
//! Each token is one of:
//!
//! - `@file.rsp` — the file's contents are tokenized and parsed in place, with
//!   further `@` inclusions disabled so response files cannot nest.
//! - `@file.<other>` — a structured document, merged below anything the
//!   command line sets.
//! - `/?`, `-?`, `--?` — usage request. Errors are cleared and the scan stops.
//! - `/name` or `-name` — selects a field by long name, then short name. A
//!   trailing `-` on a boolean name selects it with the value `false`.
//! - anything else — a value for the default field, if one is declared.
//!
//! A selected field consumes its values immediately: booleans take none,
//! structs take one token per member, everything else takes one token. Array
//! fields accumulate until [`finish`] assigns them, after which required fields
//! that no source supplied are reported.

use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::coerce;
use crate::context::{ErrorSource, ParseContext};
use crate::document;
use crate::schema::{FieldId, Schema, Settings};
use crate::source::FileSource;
use crate::tokenize;
use crate::types::{TypeTag, Value};

const USAGE_TOKENS: [&str; 3] = ["/?", "-?", "--?"];

pub struct CommandLineParser<'a, S> {
    schema: &'a Schema<S>,
    files: &'a dyn FileSource,
}

impl<'a, S: Settings> CommandLineParser<'a, S> {
    pub fn new(schema: &'a Schema<S>, files: &'a dyn FileSource) -> Self {
        Self { schema, files }
    }

    /// Scan `tokens`, assigning values to `settings` and recording errors in `ctx`.
    pub fn parse_tokens(
        &self,
        ctx: &mut ParseContext,
        settings: &mut S,
        tokens: &[String],
        allow_file_loads: bool,
    ) {
        let mut pos = 0;
        let mut previous_unresolved = false;

        while pos < tokens.len() {
            let token = tokens[pos].as_str();
            pos += 1;

            if allow_file_loads && let Some(path) = token.strip_prefix('@') {
                self.include(ctx, settings, path);
                if ctx.usage_requested {
                    return;
                }
                previous_unresolved = false;
                continue;
            }

            if USAGE_TOKENS.contains(&token) {
                ctx.errors.clear();
                ctx.usage_requested = true;
                return;
            }

            let (id, negated) = if let Some(name) = token
                .strip_prefix('/')
                .or_else(|| token.strip_prefix('-'))
            {
                match self.resolve_flag(ctx, token, name) {
                    Some(found) => found,
                    None => {
                        previous_unresolved = true;
                        continue;
                    }
                }
            } else {
                match self.schema.default_field() {
                    Some(id) => {
                        // The bare token is the default field's first value.
                        pos -= 1;
                        (id, false)
                    }
                    None => {
                        if !previous_unresolved {
                            ctx.errors.record(
                                "",
                                "default argument given but there is no default argument",
                                ErrorSource::CommandLine,
                            );
                        }
                        previous_unresolved = false;
                        continue;
                    }
                }
            };
            previous_unresolved = false;

            self.consume(ctx, settings, id, negated, tokens, &mut pos);
        }
    }

    /// Resolve a flag name to a field, recording an error when it does not resolve.
    fn resolve_flag(
        &self,
        ctx: &mut ParseContext,
        token: &str,
        name: &str,
    ) -> Option<(FieldId, bool)> {
        if let Some(id) = self.schema.lookup_long(name) {
            return Some((id, false));
        }
        if let Some(id) = self.schema.lookup_short(name) {
            return Some((id, false));
        }

        if let Some(trimmed) = name.strip_suffix('-')
            && let Some(id) = self.schema.lookup(trimmed)
        {
            let d = self.schema.descriptor(id);
            if !matches!(d.tag.normalize(), TypeTag::Bool) {
                ctx.errors.record(
                    &d.name,
                    "boolean switch used with non-boolean argument",
                    ErrorSource::CommandLine,
                );
                return None;
            }
            if d.flags.no_negation {
                ctx.errors.record(
                    &d.name,
                    "unknown argument (negation disallowed)",
                    ErrorSource::CommandLine,
                );
                return None;
            }
            return Some((id, true));
        }

        // A bare prefix has no name to report under.
        let key = if name.is_empty() { token } else { name };
        ctx.errors
            .record(key, "unknown argument", ErrorSource::CommandLine);
        None
    }

    /// Take the selected field's values from `tokens` starting at `pos`.
    fn consume(
        &self,
        ctx: &mut ParseContext,
        settings: &mut S,
        id: FieldId,
        negated: bool,
        tokens: &[String],
        pos: &mut usize,
    ) {
        let d = self.schema.descriptor(id);

        if let Some(element) = d.tag.array_element() {
            match take_value(element, negated, tokens, pos) {
                Ok(value) => {
                    ctx.append_from_command_line(id, value);
                    ctx.errors.clear_document_error(&d.name);
                }
                Err(message) => ctx.errors.record(&d.name, message, ErrorSource::CommandLine),
            }
            return;
        }

        if ctx.is_set_by_command_line(id) {
            // Skip the repeated field's values so they are not read as default arguments.
            let _ = take_value(&d.tag, negated, tokens, pos);
            ctx.errors
                .record(&d.name, "specified multiple times", ErrorSource::CommandLine);
            return;
        }

        match take_value(&d.tag, negated, tokens, pos) {
            Ok(value) => {
                if self.schema.set(id, settings, value) {
                    ctx.mark_command_line(id);
                    ctx.errors.clear_document_error(&d.name);
                } else {
                    ctx.errors.record(
                        &d.name,
                        "unable to assign value",
                        ErrorSource::CommandLine,
                    );
                }
            }
            Err(message) => ctx.errors.record(&d.name, message, ErrorSource::CommandLine),
        }
    }

    fn include(&self, ctx: &mut ParseContext, settings: &mut S, path: &str) {
        if path.to_lowercase().ends_with(".rsp") {
            match self.files.read_to_string(Path::new(path)) {
                Ok(text) => {
                    let tokens = tokenize::split_arguments(&text);
                    debug!(path, tokens = tokens.len(), "expanding response file");
                    self.parse_tokens(ctx, settings, &tokens, false);
                }
                Err(e) => {
                    warn!(path, error = %e, "failed to read response file");
                    ctx.errors.record_appending(
                        "",
                        format!("unable to read response file '{path}': {e}"),
                        ErrorSource::CommandLine,
                    );
                }
            }
        } else {
            self.load_document(ctx, settings, Path::new(path));
        }
    }

    /// Merge a structured document below anything the command line has set.
    pub fn load_document(&self, ctx: &mut ParseContext, settings: &mut S, path: &Path) {
        match self.files.read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loading configuration document");
                document::read_into(self.schema, ctx, settings, &text);
            }
            Err(e) => record_load_failure(ctx, path, &e),
        }
    }

    /// Load the default configuration before any token is seen.
    ///
    /// Unlike an explicit `@file`, a missing default configuration is not an error.
    pub fn preload(&self, ctx: &mut ParseContext, settings: &mut S, path: &Path) {
        match self.files.read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "pre-loading default configuration");
                document::read_into(self.schema, ctx, settings, &text);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no default configuration found");
            }
            Err(e) => record_load_failure(ctx, path, &e),
        }
    }
}

fn record_load_failure(ctx: &mut ParseContext, path: &Path, e: &io::Error) {
    warn!(path = %path.display(), error = %e, "failed to read configuration document");
    ctx.errors.record_appending(
        "",
        format!(
            "unable to read configuration file '{}': {e}",
            path.display()
        ),
        ErrorSource::CommandLine,
    );
}

/// Consume the tokens for one value of `tag`.
fn take_value(
    tag: &TypeTag,
    negated: bool,
    tokens: &[String],
    pos: &mut usize,
) -> Result<Value, String> {
    match tag {
        TypeTag::Nullable(inner) => take_value(inner, negated, tokens, pos),
        TypeTag::Bool => Ok(Value::Bool(!negated)),
        TypeTag::Struct(s) => {
            let end = (*pos + s.members.len()).min(tokens.len());
            let taken: Vec<&str> = tokens[*pos..end].iter().map(String::as_str).collect();
            *pos = end;
            coerce::parse_struct(s, &taken)
        }
        scalar => {
            let token = tokens.get(*pos).ok_or("too few values")?;
            *pos += 1;
            coerce::parse_text(scalar, token)
        }
    }
}

/// Assign accumulated arrays, then report required fields no source supplied.
pub fn finish<S>(schema: &Schema<S>, ctx: &mut ParseContext, settings: &mut S) {
    materialize(schema, ctx, settings);
    for &id in schema.required() {
        if !ctx.is_set(id) {
            let name = &schema.descriptor(id).name;
            ctx.errors
                .record_if_absent(name, "missing required argument", ErrorSource::CommandLine);
        }
    }
}

/// Assign every accumulated array to its field.
pub fn materialize<S>(schema: &Schema<S>, ctx: &mut ParseContext, settings: &mut S) {
    for (id, values) in ctx.take_pending() {
        if !schema.set(id, settings, Value::Array(values)) {
            let name = &schema.descriptor(id).name;
            ctx.errors
                .record(name, "unable to assign value", ErrorSource::CommandLine);
        }
    }
}
