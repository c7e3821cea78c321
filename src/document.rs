//! Persisted configuration documents and their meta-schema.
//!
//! A document is TOML with a top-level `version` string and one table named
//! after the settings type. Each field is a key in that table, addressed by
//! long or short name:
//!
//! ```toml
//! version = "2.1"
//!
//! [Build]
//! # Name of the build.
//! name = "nightly"
//! count = [1, 2]
//!
//! [Build.origin]
//! x = 3
//! y = 4
//! ```
//!
//! Arrays are TOML arrays (a lone scalar counts as one element), structs are
//! sub-tables with one key per member, and arrays of structs are arrays of
//! tables. Scalars are read back through the same text coercion as command-line
//! tokens, so `port = 8080` and `port = "8080"` are equivalent. An empty string
//! means "no value": string fields become empty, every other field is left
//! alone.

use std::collections::HashSet;

use serde_json::json;
use toml_edit::{Array, ArrayOfTables, DocumentMut, Item, Table};
use tracing::warn;

use crate::coerce;
use crate::context::{ErrorSource, ErrorTable, ParseContext};
use crate::parser;
use crate::schema::{Schema, Settings};
use crate::types::{StructType, TypeTag, Value, Version};

const VERSION_KEY: &str = "version";
const VERSION_PATTERN: &str = r"^\d+(\.\d+){1,3}$";

/// Serialize every non-`CliOnly`, non-null field of `settings`.
pub fn write_document<S: Settings>(schema: &Schema<S>, settings: &S) -> String {
    let mut doc = DocumentMut::new();
    doc[VERSION_KEY] = toml_edit::value(S::VERSION);

    let mut root = Table::new();
    for &id in schema.ordered() {
        let d = schema.descriptor(id);
        if d.flags.cli_only {
            continue;
        }
        let Some(item) = to_item(&d.tag, &schema.get(id, settings)) else {
            continue;
        };
        root.insert(&d.name, item);
        if !d.help.is_empty() {
            annotate(&mut root, &d.name, &d.help);
        }
    }
    doc.insert(S::TYPE_NAME, Item::Table(root));
    doc.to_string()
}

pub(crate) fn to_item(tag: &TypeTag, value: &Value) -> Option<Item> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            if items.is_empty() {
                return None;
            }
            let element = tag.array_element()?;
            match element.normalize() {
                TypeTag::Struct(s) => {
                    let mut tables = ArrayOfTables::new();
                    for item in items {
                        if let Value::Struct(members) = item {
                            tables.push(struct_table(s, members));
                        }
                    }
                    Some(Item::ArrayOfTables(tables))
                }
                _ => {
                    let mut array = Array::new();
                    for item in items {
                        array.push(to_edit_value(item));
                    }
                    Some(toml_edit::value(array))
                }
            }
        }
        Value::Struct(members) => match tag.normalize() {
            TypeTag::Struct(s) => Some(Item::Table(struct_table(s, members))),
            _ => None,
        },
        scalar => Some(toml_edit::value(to_edit_value(scalar))),
    }
}

fn struct_table(s: &StructType, members: &[Value]) -> Table {
    let mut table = Table::new();
    for ((name, _), value) in s.members.iter().zip(members) {
        if !value.is_null() {
            table.insert(name, toml_edit::value(to_edit_value(value)));
        }
    }
    table
}

fn to_edit_value(value: &Value) -> toml_edit::Value {
    match value {
        Value::Int(v) => i64::from(*v).into(),
        Value::UInt(v) => i64::from(*v).into(),
        Value::Long(v) => (*v).into(),
        // TOML integers are signed 64-bit.
        Value::ULong(v) => match i64::try_from(*v) {
            Ok(i) => i.into(),
            Err(_) => v.to_string().into(),
        },
        Value::Double(v) => (*v).into(),
        Value::Bool(v) => (*v).into(),
        other => coerce::to_text(other).into(),
    }
}

/// Put `help` in a comment above the entry for `name`.
pub(crate) fn annotate(root: &mut Table, name: &str, help: &str) {
    let comment: String = help.lines().map(|line| format!("# {line}\n")).collect();
    if let Some(Item::Table(table)) = root.get_mut(name) {
        table.decor_mut().set_prefix(format!("\n{comment}"));
        return;
    }
    if let Some(Item::ArrayOfTables(tables)) = root.get_mut(name) {
        if let Some(first) = tables.get_mut(0) {
            first.decor_mut().set_prefix(format!("\n{comment}"));
        }
        return;
    }
    if let Some(mut key) = root.key_mut(name) {
        key.leaf_decor_mut().set_prefix(comment);
    }
}

/// Read a document into `settings` on its own.
///
/// Arrays are assigned, but required fields are not checked; a document alone
/// need not be complete.
pub fn read_document<S: Settings>(schema: &Schema<S>, settings: &mut S, text: &str) -> ErrorTable {
    let mut ctx = ParseContext::new();
    read_into(schema, &mut ctx, settings, text);
    parser::materialize(schema, &mut ctx, settings);
    ctx.errors
}

/// Merge a document into an in-progress parse.
///
/// Fields the command line already set keep their values. Array elements are
/// accumulated in `ctx` and assigned when the parse finishes.
pub fn read_into<S: Settings>(
    schema: &Schema<S>,
    ctx: &mut ParseContext,
    settings: &mut S,
    text: &str,
) {
    let doc: toml::Table = match toml::from_str(text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "configuration document is not valid TOML");
            ctx.errors.record_appending(
                "",
                format!("unable to parse configuration document: {}", e.message()),
                ErrorSource::ConfigurationFile,
            );
            return;
        }
    };

    let mut root = None;
    for (key, value) in &doc {
        if key == VERSION_KEY {
            check_version::<S>(value);
        } else if key == S::TYPE_NAME {
            match value {
                toml::Value::Table(table) => root = Some(table),
                _ => ctx.errors.record(
                    key,
                    format!("element {key} must be a table"),
                    ErrorSource::ConfigurationFile,
                ),
            }
        } else {
            ctx.errors
                .record(key, "unknown element", ErrorSource::ConfigurationFile);
        }
    }

    let Some(root) = root else {
        if !doc.contains_key(S::TYPE_NAME) {
            ctx.errors.record(
                "",
                format!("missing root element {}", S::TYPE_NAME),
                ErrorSource::ConfigurationFile,
            );
        }
        return;
    };

    let mut seen = HashSet::new();
    for (key, value) in root {
        let Some(id) = schema.lookup(key) else {
            ctx.errors
                .record(key, "unrecognized element", ErrorSource::ConfigurationFile);
            continue;
        };
        let d = schema.descriptor(id);
        if d.flags.cli_only {
            ctx.errors.record(
                &d.name,
                "parameter can only be specified at the command line",
                ErrorSource::ConfigurationFile,
            );
            continue;
        }

        if let Some(element) = d.tag.array_element() {
            if ctx.is_set_by_command_line(id) {
                ctx.mark_document(id);
                continue;
            }
            let items = match value {
                toml::Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for item in items {
                match decode(element, item) {
                    Ok(Some(v)) => ctx.append_from_document(id, v),
                    Ok(None) => {}
                    Err(message) => {
                        ctx.errors
                            .record(&d.name, message, ErrorSource::ConfigurationFile)
                    }
                }
            }
            continue;
        }

        if !seen.insert(id) {
            ctx.errors.record(
                &d.name,
                "specified multiple times",
                ErrorSource::ConfigurationFile,
            );
            continue;
        }
        if ctx.is_set_by_command_line(id) {
            ctx.mark_document(id);
            continue;
        }
        match decode(&d.tag, value) {
            Ok(Some(v)) => {
                if schema.set(id, settings, v) {
                    ctx.mark_document(id);
                } else {
                    ctx.errors.record(
                        &d.name,
                        "unable to assign value",
                        ErrorSource::ConfigurationFile,
                    );
                }
            }
            Ok(None) => {}
            Err(message) => ctx
                .errors
                .record(&d.name, message, ErrorSource::ConfigurationFile),
        }
    }
}

fn check_version<S: Settings>(value: &toml::Value) {
    let found = match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let same = match (found.parse::<Version>(), S::VERSION.parse::<Version>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => found == S::VERSION,
    };
    if !same {
        warn!(
            found,
            expected = S::VERSION,
            "document version differs from the settings version"
        );
    }
}

/// Decode one element. `Ok(None)` means the element carried no value.
fn decode(tag: &TypeTag, item: &toml::Value) -> Result<Option<Value>, String> {
    match (tag.normalize(), item) {
        (TypeTag::Struct(s), toml::Value::Table(table)) => decode_struct(s, table).map(Some),
        (TypeTag::Struct(_), toml::Value::String(text)) if text.is_empty() => Ok(None),
        (TypeTag::Struct(s), _) => Err(format!("expected a table of {} members", s.name)),
        _ => decode_scalar(tag, item),
    }
}

fn decode_struct(s: &StructType, table: &toml::Table) -> Result<Value, String> {
    if let Some(extra) = table
        .keys()
        .find(|key| !s.members.iter().any(|(name, _)| name.eq_ignore_ascii_case(key)))
    {
        return Err(format!("unrecognized element {extra}"));
    }

    let mut values = Vec::with_capacity(s.members.len());
    for (name, tag) in &s.members {
        let item = table
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, item)| item);
        let decoded = match item {
            Some(item) => decode_scalar(tag, item)?,
            None => None,
        };
        match decoded {
            Some(v) => values.push(v),
            None if matches!(tag, TypeTag::Nullable(_)) => values.push(Value::Null),
            None => return Err(format!("missing member {name}")),
        }
    }
    Ok(Value::Struct(values))
}

fn decode_scalar(tag: &TypeTag, item: &toml::Value) -> Result<Option<Value>, String> {
    let text = match item {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            return Err(format!(
                "expected a single value of type {}",
                tag.display_name()
            ));
        }
    };
    if text.is_empty() {
        return Ok(matches!(tag.normalize(), TypeTag::String).then(|| Value::String(text)));
    }
    coerce::parse_text(tag, &text).map(Some)
}

/// JSON Schema (draft 2020-12) describing the documents [`write_document`]
/// produces and [`read_document`] accepts.
pub fn schema_document<S: Settings>(schema: &Schema<S>) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for &id in schema.ordered() {
        let d = schema.descriptor(id);
        if d.flags.cli_only {
            continue;
        }
        let mut property = type_schema(&d.tag);
        if d.flags.required {
            required.push(json!(d.name));
            if d.tag.is_array() {
                property["minItems"] = json!(1);
            }
        }
        if !d.help.is_empty() {
            property["description"] = json!(d.help);
        }
        properties.insert(d.name.clone(), property);
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": S::TYPE_NAME,
        "type": "object",
        "properties": {
            VERSION_KEY: { "type": "string", "pattern": VERSION_PATTERN },
            (S::TYPE_NAME): {
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false,
            },
        },
        "required": [S::TYPE_NAME],
        "additionalProperties": false,
    })
}

fn type_schema(tag: &TypeTag) -> serde_json::Value {
    match tag {
        TypeTag::Nullable(inner) => type_schema(inner),
        TypeTag::Array(element) => json!({ "type": "array", "items": type_schema(element) }),
        TypeTag::Int => json!({ "type": "integer", "minimum": i32::MIN, "maximum": i32::MAX }),
        TypeTag::UInt => json!({ "type": "integer", "minimum": 0, "maximum": u32::MAX }),
        TypeTag::Long => json!({ "type": "integer" }),
        TypeTag::ULong => json!({
            "type": ["integer", "string"],
            "minimum": 0,
            "pattern": r"^\d+$",
        }),
        TypeTag::Double => json!({ "type": "number" }),
        TypeTag::Bool => json!({ "type": "boolean" }),
        TypeTag::String => json!({ "type": "string" }),
        TypeTag::Version => json!({ "type": "string", "pattern": VERSION_PATTERN }),
        TypeTag::Enum(e) => json!({ "type": "string", "enum": e.values }),
        TypeTag::Struct(s) => {
            let mut members = serde_json::Map::new();
            for (name, member) in &s.members {
                members.insert(name.clone(), type_schema(member));
            }
            let names: Vec<&str> = s.members.iter().map(|(name, _)| name.as_str()).collect();
            json!({
                "type": "object",
                "title": s.name,
                "properties": members,
                "required": names,
                "additionalProperties": false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Build, Mode, Point};

    fn schema() -> Schema<Build> {
        Schema::<Build>::new().unwrap()
    }

    fn full() -> Build {
        Build {
            name: "nightly".into(),
            count: vec![3, 1, 2],
            target: r"C:\out\".into(),
            verbose: true,
            strict: false,
            mode: Mode::Slow,
            origin: Some(Point { x: -1, y: 7 }),
            waypoints: vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }],
            min_version: Some(Version::new(1, 2, 0, 0)),
            ratio: 0.25,
            limit: Some(u64::MAX),
            tags: vec!["say \"hi\"".into(), String::new()],
            log: String::new(),
            secret: "s3cr3t".into(),
        }
    }

    fn read(text: &str) -> (Build, ErrorTable) {
        let mut build = Build::default();
        let errors = read_document(&schema(), &mut build, text);
        (build, errors)
    }

    #[test]
    fn write_then_read_round_trips() {
        let original = full();
        let text = write_document(&schema(), &original);
        let (read_back, errors) = read(&text);
        assert!(errors.is_empty(), "{errors}\n{text}");
        assert_eq!(read_back, original);
    }

    #[test]
    fn writer_layout() {
        let mut build = full();
        build.log = "run.log".into();
        build.origin = None;
        let text = write_document(&schema(), &build);
        assert!(text.starts_with("version = \"2.1\"\n"), "{text}");
        assert!(text.contains("[Build]"));
        assert!(text.contains("# Name of the build.\nname = \"nightly\""), "{text}");
        assert!(text.contains("count = [3, 1, 2]"));
        assert!(text.contains("[[Build.waypoints]]"));
        assert!(text.contains("limit = \"18446744073709551615\""));
        assert!(text.contains("min-version = \"1.2.0.0\""));
        assert!(!text.contains("run.log"));
        assert!(!text.contains("origin"));
    }

    #[test]
    fn structs_become_sub_tables() {
        let text = write_document(&schema(), &full());
        assert!(text.contains("[Build.origin]"), "{text}");
        assert!(text.contains("# Starting point.\n[Build.origin]"), "{text}");
    }

    #[test]
    fn short_names_and_string_scalars_are_accepted() {
        let (b, errors) = read("[Build]\nn = \"x\"\nratio = \"0.5\"\nlimit = 12\n");
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(b.name, "x");
        assert_eq!(b.ratio, 0.5);
        assert_eq!(b.limit, Some(12));
    }

    #[test]
    fn missing_root_element() {
        let (_, errors) = read("version = \"2.1\"\n");
        assert_eq!(errors.get(""), Some("missing root element Build"));
    }

    #[test]
    fn unknown_sibling_element() {
        let (b, errors) = read("[Build]\nname = \"x\"\n[Other]\ny = 1\n");
        assert_eq!(errors.get("Other"), Some("unknown element"));
        assert_eq!(b.name, "x");
    }

    #[test]
    fn unrecognized_field_element() {
        let (_, errors) = read("[Build]\nnope = 1\n");
        assert_eq!(errors.get("nope"), Some("unrecognized element"));
        assert_eq!(errors.source("nope"), Some(ErrorSource::ConfigurationFile));
    }

    #[test]
    fn cli_only_fields_are_rejected() {
        let (b, errors) = read("[Build]\nlog = \"x.log\"\n");
        assert_eq!(
            errors.get("log"),
            Some("parameter can only be specified at the command line")
        );
        assert!(b.log.is_empty());
    }

    #[test]
    fn same_field_twice_through_both_names() {
        let (b, errors) = read("[Build]\nname = \"a\"\nn = \"b\"\n");
        assert_eq!(errors.get("name"), Some("specified multiple times"));
        assert_eq!(b.name, "a");
    }

    #[test]
    fn array_accumulates_across_aliases() {
        let (b, errors) = read(
            "[Build]\ncount = 5\n[[Build.waypoints]]\nx = 1\ny = 1\n[[Build.w]]\nx = 2\ny = 2\n",
        );
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(b.count, vec![5]);
        assert_eq!(b.waypoints, vec![Point { x: 1, y: 1 }, Point { x: 2, y: 2 }]);
    }

    #[test]
    fn empty_text_is_absent_except_for_strings() {
        let mut build = Build {
            ratio: 0.75,
            name: "before".into(),
            ..Build::default()
        };
        let errors = read_document(&schema(), &mut build, "[Build]\nratio = \"\"\nname = \"\"\n");
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(build.ratio, 0.75);
        assert_eq!(build.name, "");
    }

    #[test]
    fn struct_member_errors() {
        let (_, errors) = read("[Build.origin]\nx = 1\n");
        assert_eq!(errors.get("origin"), Some("missing member y"));
        let (_, errors) = read("[Build.origin]\nx = 1\ny = 2\nz = 3\n");
        assert_eq!(errors.get("origin"), Some("unrecognized element z"));
        let (_, errors) = read("[Build]\norigin = 4\n");
        assert!(errors.get("origin").unwrap().starts_with("expected a table"));
    }

    #[test]
    fn bad_scalar_reports_type() {
        let (_, errors) = read("[Build]\nmode = \"medium\"\n");
        assert_eq!(
            errors.get("mode"),
            Some("unable to parse value 'medium' as type Mode")
        );
    }

    #[test]
    fn syntax_error_uses_empty_key() {
        let (_, errors) = read("[Build\nname = ");
        assert!(errors.get("").unwrap().starts_with("unable to parse configuration document"));
    }

    #[test]
    fn command_line_values_are_not_overwritten() {
        let schema = schema();
        let name = schema.lookup("name").unwrap();
        let mut ctx = ParseContext::new();
        let mut build = Build {
            name: "cli".into(),
            ..Build::default()
        };
        ctx.mark_command_line(name);
        read_into(&schema, &mut ctx, &mut build, "[Build]\nname = \"doc\"\n");
        assert_eq!(build.name, "cli");
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn version_mismatch_is_not_an_error() {
        let (b, errors) = read("version = \"9.0\"\n[Build]\nname = \"x\"\n");
        assert!(errors.is_empty());
        assert_eq!(b.name, "x");
    }

    #[test]
    fn meta_schema_shape() {
        let doc = schema_document(&schema());
        let root = &doc["properties"]["Build"];
        assert_eq!(root["required"], json!(["name"]));
        assert_eq!(root["additionalProperties"], json!(false));

        let props = &root["properties"];
        assert!(props.get("log").is_none());
        assert_eq!(props["count"]["type"], "array");
        assert!(props["count"].get("minItems").is_none());
        assert_eq!(props["mode"]["enum"], json!(["Fast", "Slow"]));
        assert_eq!(props["origin"]["required"], json!(["x", "y"]));
        assert_eq!(props["waypoints"]["items"]["type"], "object");
        assert_eq!(props["name"]["description"], "Name of the build.");
        assert_eq!(doc["required"], json!(["Build"]));
    }

    #[test]
    fn required_array_gets_min_items() {
        use crate::schema::Field;

        #[derive(Default)]
        struct Inputs {
            files: Vec<String>,
        }
        impl Settings for Inputs {
            const TYPE_NAME: &'static str = "Inputs";
            fn fields() -> Vec<Field<Self>> {
                vec![Field::<Self>::new("files", |s| &s.files, |s| &mut s.files).required()]
            }
        }
        let doc = schema_document(&Schema::<Inputs>::new().unwrap());
        assert_eq!(doc["properties"]["Inputs"]["properties"]["files"]["minItems"], 1);
    }
}
