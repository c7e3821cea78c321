//! Field declarations and the schema registry built from them.
//!
//! A settings type lists its fields once, through [`Settings::fields`]. Each
//! [`Field`] pairs an immutable [`FieldDescriptor`] with a typed accessor pair,
//! so the engine can read and write the caller's struct without reflection.
//! [`Schema::from_fields`] validates the declarations and builds the lookup
//! indices every other component uses.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::coerce;
use crate::context::ErrorTable;
use crate::error::SchemaError;
use crate::types::{FieldFlags, TypeTag, Value, Version};
use crate::usage::{self, UsageEntry};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w[\w-]*$").expect("name pattern is a valid regex"));

/// Handle for a field, assigned in declaration order when the schema is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub(crate) usize);

/// A configuration type the engine can populate.
pub trait Settings: Sized + 'static {
    /// Root element name in persisted documents.
    const TYPE_NAME: &'static str;

    /// Written to the document's `version` attribute.
    const VERSION: &'static str = "1.0";

    fn fields() -> Vec<Field<Self>>;

    /// Runs after a clean parse. Errors added here fail the parse.
    fn validate(&self, _errors: &mut ErrorTable) {}
}

/// Maps a Rust type onto the engine's type taxonomy.
///
/// Implemented for the primitives, [`Version`], `Option<T>` and `Vec<T>`.
/// Enums and flat structs implement it by hand.
pub trait FieldValue: Sized {
    fn type_tag() -> TypeTag;
    fn into_value(self) -> Value;
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! primitive_field_value {
    ($ty:ty, $variant:ident) => {
        impl FieldValue for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::$variant
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

primitive_field_value!(i32, Int);
primitive_field_value!(u32, UInt);
primitive_field_value!(f64, Double);
primitive_field_value!(bool, Bool);
primitive_field_value!(String, String);
primitive_field_value!(i64, Long);
primitive_field_value!(u64, ULong);
primitive_field_value!(Version, Version);

impl<T: FieldValue> FieldValue for Option<T> {
    fn type_tag() -> TypeTag {
        TypeTag::nullable(T::type_tag())
    }

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn type_tag() -> TypeTag {
        TypeTag::array(T::type_tag())
    }

    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(FieldValue::into_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// Immutable description of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub short_name: Option<String>,
    pub tag: TypeTag,
    pub flags: FieldFlags,
    pub help: String,
}

type Getter<S> = Box<dyn Fn(&S) -> Value>;
type Setter<S> = Box<dyn Fn(&mut S, Value) -> bool>;

/// A field declaration plus the accessors that read and write it on `S`.
pub struct Field<S> {
    descriptor: FieldDescriptor,
    get: Getter<S>,
    set: Setter<S>,
}

impl<S: 'static> Field<S> {
    /// Declare a field backed by a member of `S`.
    ///
    /// ```ignore
    /// Field::<Build>::new("target", |s| &s.target, |s| &mut s.target)
    ///     .short("t")
    ///     .default_argument()
    ///     .help("File to build.")
    /// ```
    pub fn new<T>(name: &str, get: fn(&S) -> &T, get_mut: fn(&mut S) -> &mut T) -> Self
    where
        T: FieldValue + Clone + 'static,
    {
        Self {
            descriptor: FieldDescriptor {
                name: name.to_string(),
                short_name: None,
                tag: T::type_tag(),
                flags: FieldFlags::default(),
                help: String::new(),
            },
            get: Box::new(move |s: &S| get(s).clone().into_value()),
            set: Box::new(move |s: &mut S, value: Value| match T::from_value(value) {
                Some(v) => {
                    *get_mut(s) = v;
                    true
                }
                None => false,
            }),
        }
    }
}

impl<S> Field<S> {
    pub fn short(mut self, name: &str) -> Self {
        self.descriptor.short_name = Some(name.to_string());
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.descriptor.help = text.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.descriptor.flags.required = true;
        self
    }

    /// Bind bare command-line tokens to this field.
    pub fn default_argument(mut self) -> Self {
        self.descriptor.flags.default = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.descriptor.flags.hidden = true;
        self
    }

    pub fn cli_only(mut self) -> Self {
        self.descriptor.flags.cli_only = true;
        self
    }

    pub fn no_negation(mut self) -> Self {
        self.descriptor.flags.no_negation = true;
        self
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

/// Validated field set with name indices, built once per settings type.
pub struct Schema<S> {
    fields: Vec<Field<S>>,
    long_names: HashMap<String, FieldId>,
    short_names: HashMap<String, FieldId>,
    required: Vec<FieldId>,
    default_field: Option<FieldId>,
    ordered: Vec<FieldId>,
    usage: Vec<UsageEntry>,
}

impl<S: Settings> Schema<S> {
    pub fn new() -> Result<Self, SchemaError> {
        Self::from_fields(S::fields())
    }
}

impl<S> Schema<S> {
    /// Validate `fields` and build the registry.
    ///
    /// Checks run in order: name pattern, name uniqueness, type validity,
    /// single default field, non-boolean default field.
    pub fn from_fields(fields: Vec<Field<S>>) -> Result<Self, SchemaError> {
        for field in &fields {
            let d = &field.descriptor;
            for name in std::iter::once(&d.name).chain(d.short_name.as_ref()) {
                if !NAME_PATTERN.is_match(name) {
                    return Err(SchemaError::InvalidName(name.clone()));
                }
            }
        }

        let mut long_names = HashMap::new();
        let mut short_names = HashMap::new();
        let mut claimed: HashMap<String, FieldId> = HashMap::new();
        for (index, field) in fields.iter().enumerate() {
            let id = FieldId(index);
            let d = &field.descriptor;
            for name in std::iter::once(&d.name).chain(d.short_name.as_ref()) {
                let folded = name.to_lowercase();
                match claimed.get(&folded) {
                    Some(owner) if *owner != id => {
                        return Err(SchemaError::DuplicateName(name.clone()));
                    }
                    _ => {
                        claimed.insert(folded, id);
                    }
                }
            }
            long_names.insert(d.name.to_lowercase(), id);
            if let Some(short) = &d.short_name {
                short_names.insert(short.to_lowercase(), id);
            }
        }

        for field in &fields {
            let d = &field.descriptor;
            coerce::check_type(&d.tag).map_err(|reason| SchemaError::InvalidType {
                field: d.name.clone(),
                reason,
            })?;
        }

        let mut default_field: Option<FieldId> = None;
        for (index, field) in fields.iter().enumerate() {
            if !field.descriptor.flags.default {
                continue;
            }
            if let Some(first) = default_field {
                return Err(SchemaError::MultipleDefaults {
                    first: fields[first.0].descriptor.name.clone(),
                    second: field.descriptor.name.clone(),
                });
            }
            default_field = Some(FieldId(index));
        }
        if let Some(id) = default_field {
            let d = &fields[id.0].descriptor;
            if matches!(d.tag.normalize(), TypeTag::Bool) {
                return Err(SchemaError::BooleanDefault(d.name.clone()));
            }
        }

        let required = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.descriptor.flags.required)
            .map(|(i, _)| FieldId(i))
            .collect();

        let mut ordered: Vec<FieldId> = (0..fields.len()).map(FieldId).collect();
        ordered.sort_by_key(|id| fields[id.0].descriptor.name.to_lowercase());

        let usage = ordered
            .iter()
            .map(|id| &fields[id.0].descriptor)
            .filter(|d| !d.flags.hidden)
            .map(usage::entry_for)
            .collect();

        Ok(Self {
            fields,
            long_names,
            short_names,
            required,
            default_field,
            ordered,
            usage,
        })
    }

    pub fn descriptor(&self, id: FieldId) -> &FieldDescriptor {
        &self.fields[id.0].descriptor
    }

    pub fn get(&self, id: FieldId, settings: &S) -> Value {
        (self.fields[id.0].get)(settings)
    }

    /// Assign `value`; `false` if it does not fit the field's Rust type.
    pub fn set(&self, id: FieldId, settings: &mut S, value: Value) -> bool {
        (self.fields[id.0].set)(settings, value)
    }

    pub fn lookup_long(&self, name: &str) -> Option<FieldId> {
        self.long_names.get(&name.to_lowercase()).copied()
    }

    pub fn lookup_short(&self, name: &str) -> Option<FieldId> {
        self.short_names.get(&name.to_lowercase()).copied()
    }

    /// Long name first, then short name.
    pub fn lookup(&self, name: &str) -> Option<FieldId> {
        self.lookup_long(name).or_else(|| self.lookup_short(name))
    }

    pub fn required(&self) -> &[FieldId] {
        &self.required
    }

    pub fn default_field(&self) -> Option<FieldId> {
        self.default_field
    }

    /// Field ids sorted by case-insensitive long name.
    pub fn ordered(&self) -> &[FieldId] {
        &self.ordered
    }

    pub fn usage_entries(&self) -> &[UsageEntry] {
        &self.usage
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
