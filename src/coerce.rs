//! Type classification and text coercion.
//!
//! [`check_type`] decides whether a declared [`TypeTag`] belongs to the
//! supported taxonomy. [`parse_text`] turns one token (or one document text node)
//! into a [`Value`]; [`to_text`] is its inverse. [`render_field`] produces the
//! command-line form of a field, which parses back to the same value.

use crate::types::{StructType, TypeTag, Value, Version};

/// Check that a declared type is one the engine can handle.
///
/// Returns a human-readable reason on failure.
pub fn check_type(tag: &TypeTag) -> Result<(), String> {
    match tag {
        TypeTag::Int
        | TypeTag::UInt
        | TypeTag::Double
        | TypeTag::Bool
        | TypeTag::String
        | TypeTag::Long
        | TypeTag::ULong
        | TypeTag::Version => Ok(()),
        TypeTag::Nullable(inner) => check_type(inner),
        TypeTag::Array(inner) => {
            let mut element = inner.as_ref();
            while let TypeTag::Nullable(wrapped) = element {
                element = wrapped.as_ref();
            }
            if matches!(element, TypeTag::Array(_)) {
                return Err("arrays of arrays are not supported".into());
            }
            check_type(inner)
        }
        TypeTag::Enum(e) => {
            if e.values.is_empty() {
                return Err(format!("enum {} declares no values", e.name));
            }
            Ok(())
        }
        TypeTag::Struct(s) => check_struct(s),
    }
}

fn check_struct(s: &StructType) -> Result<(), String> {
    if s.members.is_empty() {
        return Err(format!("struct {} declares no members", s.name));
    }
    for (name, member) in &s.members {
        let base = match member {
            TypeTag::Nullable(inner) => inner.as_ref(),
            other => other,
        };
        if matches!(base, TypeTag::Array(_) | TypeTag::Struct(_) | TypeTag::Nullable(_)) {
            return Err(format!(
                "member '{name}' of struct {} must be a primitive or enum",
                s.name
            ));
        }
        check_type(member)?;
    }
    Ok(())
}

/// Parse one text token as a value of `tag`.
///
/// Structs and arrays span several tokens and are assembled by the caller;
/// passing one here is an error.
pub fn parse_text(tag: &TypeTag, text: &str) -> Result<Value, String> {
    let fail = || unable_to_parse(text, tag);
    match tag {
        TypeTag::Int => text.trim().parse().map(Value::Int).map_err(|_| fail()),
        TypeTag::UInt => text.trim().parse().map(Value::UInt).map_err(|_| fail()),
        TypeTag::Long => text.trim().parse().map(Value::Long).map_err(|_| fail()),
        TypeTag::ULong => text.trim().parse().map(Value::ULong).map_err(|_| fail()),
        TypeTag::Double => text.trim().parse().map(Value::Double).map_err(|_| fail()),
        TypeTag::Bool => {
            let t = text.trim();
            if t.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if t.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(fail())
            }
        }
        TypeTag::String => Ok(Value::String(text.to_string())),
        TypeTag::Version => text
            .parse::<Version>()
            .map(Value::Version)
            .map_err(|_| fail()),
        TypeTag::Enum(e) => e
            .values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(text.trim()))
            .map(|v| Value::Enum(v.clone()))
            .ok_or_else(fail),
        TypeTag::Nullable(inner) => parse_text(inner, text),
        TypeTag::Struct(_) | TypeTag::Array(_) => Err(fail()),
    }
}

/// Parse a struct from exactly one token per member, positionally.
pub fn parse_struct(s: &StructType, tokens: &[&str]) -> Result<Value, String> {
    if tokens.len() < s.members.len() {
        return Err("too few values".into());
    }
    s.members
        .iter()
        .zip(tokens)
        .map(|((_, tag), token)| parse_text(tag, token))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Struct)
}

pub fn unable_to_parse(text: &str, tag: &TypeTag) -> String {
    format!(
        "unable to parse value '{text}' as type {}",
        tag.display_name()
    )
}

/// Canonical text form of a value, unquoted.
///
/// This is what documents store and what `config get` displays.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Long(v) => v.to_string(),
        Value::ULong(v) => v.to_string(),
        Value::Version(v) => v.to_string(),
        Value::Enum(v) => v.clone(),
        Value::Struct(members) | Value::Array(members) => members
            .iter()
            .map(to_text)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Quote a string for the command line.
///
/// Embedded quotes are escaped, and backslashes that precede a quote
/// (including the closing one) are doubled so they are not read as escapes.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut backslashes = 0;
    for c in text.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            other => {
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push(other);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat_n('\\', backslashes * 2));
    out.push('"');
    out
}

/// Render a value as it would appear after its flag on the command line.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Struct(members) | Value::Array(members) => members
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(" "),
        other => to_text(other),
    }
}

/// Render a whole field, flag included.
///
/// Booleans become `/name` or `/name-`; arrays repeat the flag once per
/// element; null values render as nothing.
pub fn render_field(name: &str, value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => format!("/{name}"),
        Value::Bool(false) => format!("/{name}-"),
        Value::Array(items) => items
            .iter()
            .map(|item| render_field(name, item))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other => format!("/{name} {}", render_value(other)),
    }
}
