//! Usage schema types.
//!
//! A usage schema is an ordered list of [`UsageEntry`] values, one per
//! positional slot. Each entry names its type (or candidate types), whether
//! it is required, how many raw values it consumes, and any extra options
//! for its parser type.
//!
//! Entries round-trip through JSON and YAML. Types are written by registered
//! name, and unknown keys are kept as parser options:
//!
//! ```
//! use usage_schema_core::{Count, UsageEntry};
//!
//! let entry: UsageEntry = serde_json::from_str(
//!     r#"{"type": ["number", "string"], "count": -1, "explicit": true}"#,
//! ).unwrap();
//! assert_eq!(entry.type_spec.name(), "number|string");
//! assert_eq!(entry.count, Some(Count::Remaining));
//! assert!(entry.required);
//! assert_eq!(entry.options["explicit"], true);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::parser_type::{Options, ParserType};
use crate::registry::TypeRegistry;

/// How many raw values an entry consumes.
///
/// Written as an integer: `n >= 0` is [`Exactly`](Self::Exactly), `-1` is
/// [`Remaining`](Self::Remaining). An absent count means a single scalar
/// value and is modelled as `Option::<Count>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Count {
    /// Exactly this many consecutive values.
    Exactly(usize),
    /// Every value from the cursor to the end of the input.
    Remaining,
}

impl Count {
    /// Converts the integer form, returning `None` for values below `-1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use usage_schema_core::Count;
    ///
    /// assert_eq!(Count::from_raw(2), Some(Count::Exactly(2)));
    /// assert_eq!(Count::from_raw(-1), Some(Count::Remaining));
    /// assert_eq!(Count::from_raw(-2), None);
    /// ```
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            -1 => Some(Self::Remaining),
            n if n >= 0 => usize::try_from(n).ok().map(Self::Exactly),
            _ => None,
        }
    }

    /// Returns the integer form.
    pub fn as_raw(self) -> i64 {
        match self {
            Self::Exactly(n) => i64::try_from(n).unwrap_or(i64::MAX),
            Self::Remaining => -1,
        }
    }
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountVisitor;

        impl Visitor<'_> for CountVisitor {
            type Value = Count;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or -1")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Count, E> {
                Count::from_raw(v).ok_or_else(|| E::custom(format!("invalid count {v}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Count, E> {
                usize::try_from(v)
                    .map(Count::Exactly)
                    .map_err(|_| E::custom(format!("count {v} is too large")))
            }
        }

        deserializer.deserialize_i64(CountVisitor)
    }
}

/// Reference to a parser type: a shared instance or a registered name.
///
/// Named references are resolved against a [`TypeRegistry`] when parsing;
/// a name with no registered type is reported as
/// [`TypeIsNotParserType`](crate::ArgumentErrorKind::TypeIsNotParserType).
#[derive(Clone)]
pub enum TypeRef {
    /// A concrete parser type.
    Type(Arc<dyn ParserType>),
    /// A name to look up in the registry.
    Name(String),
}

impl TypeRef {
    /// Creates a reference by registered name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Wraps an already shared parser type.
    pub fn shared(ty: Arc<dyn ParserType>) -> Self {
        Self::Type(ty)
    }

    /// Returns the referenced type's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Type(ty) => ty.name(),
            Self::Name(name) => name,
        }
    }

    /// Resolves to a concrete parser type.
    pub fn resolve(&self, registry: &TypeRegistry) -> Option<Arc<dyn ParserType>> {
        match self {
            Self::Type(ty) => Some(Arc::clone(ty)),
            Self::Name(name) => registry.get(name),
        }
    }
}

impl<T: ParserType + 'static> From<T> for TypeRef {
    fn from(ty: T) -> Self {
        Self::Type(Arc::new(ty))
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => f.debug_tuple("Type").field(&ty.name()).finish(),
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(TypeRef::Name)
    }
}

/// The declared type of an entry: one type or an ordered candidate list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    /// A single parser type.
    Single(TypeRef),
    /// Candidate types tried in order.
    OneOf(Vec<TypeRef>),
}

impl TypeSpec {
    /// Returns the candidate references in declaration order.
    pub fn candidates(&self) -> &[TypeRef] {
        match self {
            Self::Single(ty) => std::slice::from_ref(ty),
            Self::OneOf(types) => types,
        }
    }

    /// Returns a display name; candidate lists are joined with `|`.
    pub fn name(&self) -> String {
        match self {
            Self::Single(ty) => ty.name().to_string(),
            Self::OneOf(types) => types
                .iter()
                .map(TypeRef::name)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

impl From<TypeRef> for TypeSpec {
    fn from(ty: TypeRef) -> Self {
        Self::Single(ty)
    }
}

impl<T: ParserType + 'static> From<T> for TypeSpec {
    fn from(ty: T) -> Self {
        Self::Single(TypeRef::from(ty))
    }
}

fn default_required() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// One positional slot of a usage schema.
///
/// # Examples
///
/// ```
/// use usage_schema_core::{Count, NUMBER, STRING, TypeRef, UsageEntry};
///
/// let port = UsageEntry::new(NUMBER);
/// assert!(port.required);
/// assert_eq!(port.count, None);
///
/// let files = UsageEntry::new(STRING).remaining().with_option("explicit", true);
/// assert_eq!(files.count, Some(Count::Remaining));
///
/// let either = UsageEntry::one_of([TypeRef::from(NUMBER), TypeRef::from(STRING)]).optional();
/// assert!(!either.required);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Declared type or candidate types.
    #[serde(rename = "type")]
    pub type_spec: TypeSpec,
    /// Whether a valid value must be present.
    #[serde(default = "default_required", skip_serializing_if = "is_true")]
    pub required: bool,
    /// Cardinality; `None` consumes exactly one scalar value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Count>,
    /// Extra keys, passed verbatim to the parser type.
    #[serde(flatten)]
    pub options: Options,
}

impl UsageEntry {
    /// Creates a required scalar entry.
    pub fn new(type_spec: impl Into<TypeSpec>) -> Self {
        Self {
            type_spec: type_spec.into(),
            required: true,
            count: None,
            options: Options::new(),
        }
    }

    /// Creates a required scalar entry over candidate types.
    pub fn one_of(types: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::new(TypeSpec::OneOf(types.into_iter().collect()))
    }

    /// Creates a required scalar entry referencing a type by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(TypeRef::named(name))
    }

    /// Marks the entry as not required.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Consumes exactly `n` values.
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(Count::Exactly(n));
        self
    }

    /// Consumes every remaining value.
    pub fn remaining(mut self) -> Self {
        self.count = Some(Count::Remaining);
        self
    }

    /// Adds a parser option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// One parsed slot, parallel to its [`UsageEntry`].
///
/// Serializes untagged: an absent scalar becomes `null`, a counted entry an
/// array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedValue {
    /// Result of a scalar entry; `None` when absent.
    Single(Option<Value>),
    /// Results of a counted entry, one per consumed value.
    Many(Vec<Value>),
}

impl ParsedValue {
    /// Returns the scalar value, if this is a present scalar.
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => value.as_ref(),
            Self::Many(_) => None,
        }
    }

    /// Returns the values of a counted entry.
    pub fn as_many(&self) -> Option<&[Value]> {
        match self {
            Self::Many(values) => Some(values),
            Self::Single(_) => None,
        }
    }

    /// Returns `true` for an absent scalar.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Single(None))
    }

    /// Converts into a plain value; absent becomes `null`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Single(value) => value.unwrap_or(Value::Null),
            Self::Many(values) => Value::Array(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{BOOLEAN, NUMBER};

    #[test]
    fn test_entry_defaults_when_decoded() {
        let entry: UsageEntry = serde_json::from_value(json!({"type": "number"})).unwrap();
        assert!(entry.required);
        assert_eq!(entry.count, None);
        assert!(entry.options.is_empty());
        assert_eq!(entry.type_spec.name(), "number");
    }

    #[test]
    fn test_entry_rejects_count_below_minus_one() {
        let result: Result<UsageEntry, _> =
            serde_json::from_value(json!({"type": "number", "count": -3}));
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_decodes_from_yaml() {
        let yaml = "type: [boolean, string]\nrequired: false\ncount: 2\nexplicit: true\n";
        let entry: UsageEntry = serde_yaml::from_str(yaml).unwrap();
        assert!(!entry.required);
        assert_eq!(entry.count, Some(Count::Exactly(2)));
        assert_eq!(entry.type_spec.candidates().len(), 2);
        assert_eq!(entry.options.get("explicit"), Some(&json!(true)));
    }

    #[test]
    fn test_entry_serializes_compactly() {
        let entry = UsageEntry::new(NUMBER).with_count(2);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"type": "number", "count": 2})
        );

        let entry = UsageEntry::new(BOOLEAN).optional().with_option("explicit", true);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"type": "boolean", "required": false, "explicit": true})
        );
    }

    #[test]
    fn test_type_ref_resolution() {
        let registry = TypeRegistry::default();
        assert!(TypeRef::named("boolean").resolve(&registry).is_some());
        assert!(TypeRef::named("float").resolve(&registry).is_none());
        assert!(TypeRef::from(NUMBER).resolve(&TypeRegistry::new()).is_some());
    }

    #[test]
    fn test_parsed_value_serialization() {
        let values = vec![
            ParsedValue::Single(Some(json!(1))),
            ParsedValue::Single(None),
            ParsedValue::Many(vec![json!("a")]),
        ];
        assert_eq!(serde_json::to_value(&values).unwrap(), json!([1, null, ["a"]]));
        assert!(values[1].is_absent());
        assert_eq!(values[2].as_many(), Some(&[json!("a")][..]));
    }
}
