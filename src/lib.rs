//! Typed configuration from command lines, response files, and TOML documents.
//! Declare your fields once, parse arguments, get a struct.
//!
//! Argfig fills one settings struct from three sources (command-line tokens,
//! `@file.rsp` response files, and `@file.toml` documents), reports every
//! problem it finds in a single field-keyed error table, and can write the
//! struct back out as a document, a JSON Schema, or a command line.
//!
//! ```ignore
//! let settings: Build = Argfig::builder::<Build>()
//!     .program_name("build")
//!     .build()?
//!     .load(std::env::args().skip(1))?;
//! ```
//!
//! # Declaring fields
//!
//! A settings type implements [`Settings`] and lists its fields, each one a
//! name plus an accessor pair into the struct:
//!
//! ```ignore
//! impl Settings for Build {
//!     const TYPE_NAME: &'static str = "Build";
//!
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::<Self>::new("name", |s| &s.name, |s| &mut s.name)
//!                 .short("n")
//!                 .required()
//!                 .help("Name of the build."),
//!             Field::<Self>::new("target", |s| &s.target, |s| &mut s.target)
//!                 .default_argument(),
//!             Field::<Self>::new("count", |s| &s.count, |s| &mut s.count),
//!         ]
//!     }
//! }
//! ```
//!
//! Field types come from [`FieldValue`]: the integer, float, bool and string
//! primitives, [`Version`], `Option<T>` for nullable fields, `Vec<T>` for
//! repeatable ones, and hand-written impls for enums and flat structs. The
//! declarations are checked once, in [`ArgfigBuilder::build`]; a bad name, a
//! name collision, an unsupported type or a second default field is a
//! [`SchemaError`].
//!
//! # Command-line grammar
//!
//! ```text
//! /name value   -name value    set a field (repeat for arrays)
//! /flag         -flag          set a boolean to true
//! /flag-        -flag-         set a boolean to false
//! /point 3 4                   a struct takes one token per member
//! value                        bare token: the default field
//! @args.rsp                    splice in the file's arguments (one level)
//! @build.toml                  merge a document below the command line
//! /?  -?  --?                  print usage and stop
//! ```
//!
//! Names match case-insensitively, by long name first and then short name.
//!
//! # Precedence and errors
//!
//! The command line always wins. A document never overwrites a field the
//! command line set, a command-line value clears a document's error for the
//! same field, and the first command-line element of an array replaces the
//! document's elements. Parse problems never abort the scan: they collect in an
//! [`ErrorTable`] keyed by field name, and [`ConfigParser::parse`] reports
//! whether the caller may proceed. [`Settings::validate`] runs last, only after
//! an otherwise clean parse.
//!
//! # Documents
//!
//! ```toml
//! version = "2.1"
//!
//! [Build]
//! # Name of the build.
//! name = "nightly"
//! count = [1, 2]
//! ```
//!
//! [`ConfigParser::write_document`] emits this form with help text as comments;
//! [`ConfigParser::schema_document`] describes it as a JSON Schema. `CliOnly`
//! fields never appear in either.
//!
//! # Config subcommands
//!
//! [`ConfigAction`] and [`ConfigParser::handle`] give an application
//! `config list|get|gen|schema|set|unset` without tying it to a CLI framework.
//! `set` and `unset` edit a document in place with `toml_edit`, keeping its
//! comments, and validate the key and value against the schema first.
//!
//! # Logging
//!
//! Argfig emits [`tracing`] events (response-file expansion, document loads,
//! version mismatches, unreadable include files) and never installs a
//! subscriber.

pub mod context;
pub mod error;
pub mod schema;
pub mod source;
pub mod types;

mod builder;
mod coerce;
mod document;
mod ops;
mod parser;
mod persist;
pub mod tokenize;
mod usage;

#[cfg(test)]
mod fixtures;

pub use builder::{Argfig, ArgfigBuilder, ConfigParser, ParseOutcome};
pub use context::{ErrorSource, ErrorTable};
pub use error::{ArgfigError, SchemaError};
pub use ops::{ConfigAction, ConfigResult};
pub use persist::{set_in_document, unset_in_document};
pub use schema::{Field, FieldDescriptor, FieldValue, Settings};
pub use source::{FileSource, MemoryFileSource, StdFileSource};
pub use types::{EnumType, FieldFlags, StructType, TypeTag, Value, Version};
pub use usage::DEFAULT_WIDTH;
