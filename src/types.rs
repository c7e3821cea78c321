//! The closed type taxonomy shared by every part of the engine.
//!
//! A field's declared shape is a [`TypeTag`]; a field's current contents are a
//! [`Value`]. Coercion, command-line consumption, and document mapping all
//! dispatch by matching on these two enums.

use std::fmt;
use std::str::FromStr;

/// Declared type of a configuration field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    Int,
    UInt,
    Double,
    Bool,
    String,
    Long,
    ULong,
    Version,
    Enum(EnumType),
    Struct(StructType),
    Array(Box<TypeTag>),
    Nullable(Box<TypeTag>),
}

/// A named enumeration with its value names in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

/// A flat record: an ordered list of named members.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub members: Vec<(String, TypeTag)>,
}

impl TypeTag {
    pub fn enumeration(name: &str, values: &[&str]) -> Self {
        TypeTag::Enum(EnumType {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn structure(name: &str, members: Vec<(&str, TypeTag)>) -> Self {
        TypeTag::Struct(StructType {
            name: name.to_string(),
            members: members
                .into_iter()
                .map(|(n, t)| (n.to_string(), t))
                .collect(),
        })
    }

    pub fn array(element: TypeTag) -> Self {
        TypeTag::Array(Box::new(element))
    }

    pub fn nullable(inner: TypeTag) -> Self {
        TypeTag::Nullable(Box::new(inner))
    }

    /// Strip one outer `Nullable` or `Array` wrapper.
    pub fn normalize(&self) -> &TypeTag {
        match self {
            TypeTag::Nullable(inner) | TypeTag::Array(inner) => inner,
            other => other,
        }
    }

    /// Element type when this field accumulates repeated values.
    ///
    /// Looks through one `Nullable` so that `Option<Vec<T>>` fields behave like arrays.
    pub fn array_element(&self) -> Option<&TypeTag> {
        match self {
            TypeTag::Array(inner) => Some(inner),
            TypeTag::Nullable(inner) => match inner.as_ref() {
                TypeTag::Array(element) => Some(element),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_element().is_some()
    }

    /// Name used in usage text and error messages.
    pub fn display_name(&self) -> String {
        match self {
            TypeTag::Int => "int".into(),
            TypeTag::UInt => "uint".into(),
            TypeTag::Double => "double".into(),
            TypeTag::Bool => "bool".into(),
            TypeTag::String => "string".into(),
            TypeTag::Long => "long".into(),
            TypeTag::ULong => "ulong".into(),
            TypeTag::Version => "version".into(),
            TypeTag::Enum(e) => e.name.clone(),
            TypeTag::Struct(s) => s.name.clone(),
            TypeTag::Array(inner) => format!("{}[]", inner.display_name()),
            TypeTag::Nullable(inner) => format!("{}?", inner.display_name()),
        }
    }
}

/// A dotted numeric version with 2 to 4 components.
///
/// Missing trailing components are stored as 0, so `1.0`, `1.0.0` and `1.0.0.0`
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(format!("'{s}' must have between 2 and 4 components"));
        }
        let mut components = [0u32; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u32>()
                .map_err(|_| format!("'{part}' is not a version component"))?;
        }
        let [major, minor, build, revision] = components;
        Ok(Version::new(major, minor, build, revision))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Runtime value of a field, tagged to match [`TypeTag`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An unset nullable field.
    Null,
    Int(i32),
    UInt(u32),
    Double(f64),
    Bool(bool),
    String(String),
    Long(i64),
    ULong(u64),
    Version(Version),
    /// Canonical (declared) name of the enum value.
    Enum(String),
    /// Member values in declaration order.
    Struct(Vec<Value>),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Behavioral flags attached to a field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags {
    /// Must be supplied by the command line or a document.
    pub required: bool,
    /// Receives bare (unprefixed) command-line tokens.
    pub default: bool,
    /// Omitted from usage text.
    pub hidden: bool,
    /// Settable on the command line only; never read from or written to documents.
    pub cli_only: bool,
    /// Boolean field that rejects the `/name-` form.
    pub no_negation: bool,
}
