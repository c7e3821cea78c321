use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::coerce;
use crate::context::{ErrorTable, ParseContext};
use crate::document;
use crate::error::{ArgfigError, SchemaError};
use crate::ops::{self, ConfigAction, ConfigResult};
use crate::parser::{self, CommandLineParser};
use crate::persist;
use crate::schema::{Schema, Settings};
use crate::source::{FileSource, StdFileSource};
use crate::types::Value;
use crate::usage::{self, UsageOptions};

/// Entry point for building an argfig parser.
pub struct Argfig;

impl Argfig {
    pub fn builder<S: Settings>() -> ArgfigBuilder<S> {
        ArgfigBuilder::new()
    }
}

/// Builder for a [`ConfigParser`].
///
/// Controls three things:
///
/// - **Usage text**: [`program_name()`](Self::program_name),
///   [`banner()`](Self::banner), [`usage_header()`](Self::usage_header) and
///   [`usage_width()`](Self::usage_width).
/// - **Inclusion**: [`no_file_loads()`](Self::no_file_loads) turns `@file`
///   tokens into ordinary values; [`file_source()`](Self::file_source) replaces
///   the file system.
/// - **Defaults**: [`default_config()`](Self::default_config) names a document
///   loaded before every parse, below everything else.
pub struct ArgfigBuilder<S: Settings> {
    program_name: Option<String>,
    banner: Option<String>,
    usage_header: Option<String>,
    usage_width: usize,
    allow_file_loads: bool,
    default_config: Option<PathBuf>,
    files: Box<dyn FileSource>,
    _phantom: PhantomData<S>,
}

impl<S: Settings> ArgfigBuilder<S> {
    fn new() -> Self {
        Self {
            program_name: None,
            banner: None,
            usage_header: None,
            usage_width: usage::DEFAULT_WIDTH,
            allow_file_loads: true,
            default_config: None,
            files: Box::new(StdFileSource),
            _phantom: PhantomData,
        }
    }

    /// Set the program name. Without an explicit [`banner()`](Self::banner),
    /// usage text opens with `Usage: {name} [options]`.
    pub fn program_name(mut self, name: &str) -> Self {
        self.program_name = Some(name.to_string());
        self
    }

    /// First line of the usage text.
    pub fn banner(mut self, banner: &str) -> Self {
        self.banner = Some(banner.to_string());
        self
    }

    /// Heading above the option list (default: `"Options:"`).
    pub fn usage_header(mut self, header: &str) -> Self {
        self.usage_header = Some(header.to_string());
        self
    }

    /// Display width for usage text (default: 80 columns).
    pub fn usage_width(mut self, width: usize) -> Self {
        self.usage_width = width;
        self
    }

    /// Enable or disable `@file` inclusion (default: enabled).
    pub fn allow_file_loads(mut self, allow: bool) -> Self {
        self.allow_file_loads = allow;
        self
    }

    /// Treat `@file` tokens as ordinary values.
    pub fn no_file_loads(self) -> Self {
        self.allow_file_loads(false)
    }

    /// Load this document before the command line on every parse.
    /// A missing file is skipped.
    pub fn default_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_config = Some(path.into());
        self
    }

    /// Read included files through `source` instead of the file system.
    pub fn file_source(mut self, source: impl FileSource + 'static) -> Self {
        self.files = Box::new(source);
        self
    }

    /// Build the schema and the parser. Fails if the field declarations are invalid.
    pub fn build(self) -> Result<ConfigParser<S>, SchemaError> {
        let schema = Schema::<S>::new()?;
        let banner = self.banner.or_else(|| {
            self.program_name.as_ref().map(|program| {
                let mut line = format!("Usage: {program} [options]");
                if let Some(id) = schema.default_field() {
                    line.push_str(&format!(" [<{}>]", schema.descriptor(id).name));
                }
                line
            })
        });
        let mut options = UsageOptions {
            banner,
            width: self.usage_width,
            ..UsageOptions::default()
        };
        if let Some(header) = self.usage_header {
            options.header = header;
        }

        Ok(ConfigParser {
            schema,
            options,
            allow_file_loads: self.allow_file_loads,
            default_config: self.default_config,
            files: self.files,
        })
    }
}

/// What a parse produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// `true` only when no error was recorded and usage was not requested.
    pub proceed: bool,
    pub errors: ErrorTable,
    /// Rendered usage text, when `/?` was given.
    pub usage: Option<String>,
}

/// A validated schema plus parse options for settings type `S`.
pub struct ConfigParser<S> {
    schema: Schema<S>,
    options: UsageOptions,
    allow_file_loads: bool,
    default_config: Option<PathBuf>,
    files: Box<dyn FileSource>,
}

impl<S: Settings> ConfigParser<S> {
    pub fn schema(&self) -> &Schema<S> {
        &self.schema
    }

    /// Parse `args` into `settings`, in place.
    ///
    /// The default configuration loads first, then tokens are scanned left to
    /// right. Arrays are assigned and required fields checked once the scan is
    /// done; the [`Settings::validate`] hook runs only if nothing failed before it.
    pub fn parse(&self, settings: &mut S, args: &[String]) -> ParseOutcome {
        let mut ctx = ParseContext::new();
        let parser = CommandLineParser::new(&self.schema, self.files.as_ref());

        if let Some(path) = &self.default_config {
            parser.preload(&mut ctx, settings, path);
        }
        parser.parse_tokens(&mut ctx, settings, args, self.allow_file_loads);

        if ctx.usage_requested {
            debug!("usage requested");
            return ParseOutcome {
                proceed: false,
                errors: ErrorTable::new(),
                usage: Some(self.usage()),
            };
        }

        parser::finish(&self.schema, &mut ctx, settings);
        if ctx.errors.is_empty() {
            settings.validate(&mut ctx.errors);
        }
        debug!(errors = ctx.errors.len(), "parse finished");
        ParseOutcome {
            proceed: ctx.errors.is_empty(),
            errors: ctx.errors,
            usage: None,
        }
    }

    /// Parse `args` into a fresh `S::default()`.
    ///
    /// ```ignore
    /// let settings: Build = Argfig::builder::<Build>()
    ///     .program_name("build")
    ///     .build()?
    ///     .load(std::env::args().skip(1))?;
    /// ```
    pub fn load<I, T>(&self, args: I) -> Result<S, ArgfigError>
    where
        S: Default,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut settings = S::default();
        let outcome = self.parse(&mut settings, &args);
        if let Some(usage) = outcome.usage {
            return Err(ArgfigError::UsageRequested(usage));
        }
        if !outcome.proceed {
            return Err(ArgfigError::Invalid(outcome.errors));
        }
        Ok(settings)
    }

    /// Word-wrapped help text for every visible field.
    pub fn usage(&self) -> String {
        usage::render(self.schema.usage_entries(), &self.options)
    }

    pub fn write_document(&self, settings: &S) -> String {
        document::write_document(&self.schema, settings)
    }

    /// Read a document on its own. Required fields are not checked.
    pub fn read_document(&self, settings: &mut S, text: &str) -> ErrorTable {
        document::read_document(&self.schema, settings, text)
    }

    /// Read a document file through the configured file source.
    pub fn load_document(&self, settings: &mut S, path: &Path) -> Result<(), ArgfigError> {
        let text = self
            .files
            .read_to_string(path)
            .map_err(|e| ArgfigError::IoError {
                path: path.to_path_buf(),
                source: e,
            })?;
        let errors = self.read_document(settings, &text);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ArgfigError::Invalid(errors))
        }
    }

    pub fn schema_document(&self) -> serde_json::Value {
        document::schema_document(&self.schema)
    }

    /// Render `settings` as command-line arguments that parse back to the same values.
    ///
    /// Null fields and empty arrays are left out, as are `false` values of
    /// fields that cannot be negated.
    pub fn render_command_line(&self, settings: &S) -> String {
        self.schema
            .ordered()
            .iter()
            .filter_map(|&id| {
                let d = self.schema.descriptor(id);
                let value = self.schema.get(id, settings);
                if d.flags.no_negation && value == Value::Bool(false) {
                    return None;
                }
                let rendered = coerce::render_field(&d.name, &value);
                (!rendered.is_empty()).then_some(rendered)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(&self, action: &ConfigAction, settings: &S) -> Result<(), ArgfigError> {
        let result = self.handle(action, settings)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / get / gen / schema / set / unset).
    pub fn handle(&self, action: &ConfigAction, settings: &S) -> Result<ConfigResult, ArgfigError> {
        match action {
            ConfigAction::List => Ok(ops::list_values(&self.schema, settings)),
            ConfigAction::Get { key } => ops::get_value(&self.schema, settings, key),
            ConfigAction::Gen { output } => {
                let text = self.write_document(settings);
                match output {
                    Some(path) => {
                        ops::write_output(path, &text)?;
                        Ok(ConfigResult::DocumentWritten { path: path.clone() })
                    }
                    None => Ok(ConfigResult::Document(text)),
                }
            }
            ConfigAction::Schema { output } => {
                let text = serde_json::to_string_pretty(&self.schema_document()).map_err(|e| {
                    ArgfigError::InvalidValue {
                        key: "<schema>".into(),
                        reason: e.to_string(),
                    }
                })?;
                match output {
                    Some(path) => {
                        ops::write_output(path, &text)?;
                        Ok(ConfigResult::SchemaWritten { path: path.clone() })
                    }
                    None => Ok(ConfigResult::Schema(text)),
                }
            }
            ConfigAction::Set { path, key, value } => {
                persist::persist_value(&self.schema, path, key, value)
            }
            ConfigAction::Unset { path, key } => persist::unset_value(&self.schema, path, key),
        }
    }
}
