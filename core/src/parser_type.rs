//! The parser type abstraction and the built-in types.
//!
//! A parser type pairs a validation predicate with a transformation. The
//! engine calls [`ParserType::parse`], which transforms a value only when it
//! validates, and reports everything else as absent (`None`).
//!
//! Per-call options are an explicit parameter of every call, so a single
//! instance can be shared freely between schema entries and threads.
//!
//! # Examples
//!
//! ```
//! use serde_json::{Map, json};
//! use usage_schema_core::{BOOLEAN, NUMBER, ParserType, STRING};
//!
//! let options = Map::new();
//! assert_eq!(NUMBER.parse(&json!("42"), &options), Some(json!(42)));
//! assert_eq!(BOOLEAN.parse(&json!("maybe"), &options), None);
//! assert_eq!(STRING.parse(&json!(7), &options), Some(json!("7")));
//! ```

use std::fmt;

use serde_json::{Map, Value};

/// Per-call options handed to [`ParserType::validate`].
pub type Options = Map<String, Value>;

/// Validate-then-transform capability bound to a schema entry.
///
/// Implementors only have to supply [`name`](Self::name),
/// [`validate`](Self::validate) and [`transform`](Self::transform).
pub trait ParserType: Send + Sync {
    /// Identifying name, used in diagnostics and registry lookups.
    fn name(&self) -> &str;

    /// Returns `true` when `value` is acceptable under `options`.
    fn validate(&self, value: &Value, options: &Options) -> bool;

    /// Maps an accepted value to its parsed form.
    fn transform(&self, value: &Value) -> Value;

    /// Transforms `value` if it validates, otherwise returns `None`.
    fn parse(&self, value: &Value, options: &Options) -> Option<Value> {
        if self.validate(value, options) {
            Some(self.transform(value))
        } else {
            None
        }
    }
}

/// Accepts anything unless `explicit` is set; coerces to a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;

/// Accepts numbers and numeric strings; yields a truncated integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberType;

/// Accepts `"true"`/`"false"` in any representation; yields a boolean.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanType;

/// Built-in `string` type.
pub const STRING: StringType = StringType;
/// Built-in `number` type.
pub const NUMBER: NumberType = NumberType;
/// Built-in `boolean` type.
pub const BOOLEAN: BooleanType = BooleanType;

impl ParserType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn validate(&self, value: &Value, options: &Options) -> bool {
        if is_truthy(options.get("explicit")) {
            value.is_string()
        } else {
            true
        }
    }

    fn transform(&self, value: &Value) -> Value {
        Value::String(string_form(value))
    }
}

impl ParserType for NumberType {
    fn name(&self) -> &str {
        "number"
    }

    fn validate(&self, value: &Value, _options: &Options) -> bool {
        match value {
            Value::Number(_) => true,
            Value::String(s) => parse_numeric(s).is_some(),
            _ => false,
        }
    }

    fn transform(&self, value: &Value) -> Value {
        let float = match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Value::from(i);
                }
                if let Some(u) = n.as_u64() {
                    return Value::from(u);
                }
                n.as_f64()
            }
            Value::String(s) => {
                if let Some(value) = leading_integer(s) {
                    return value;
                }
                parse_numeric(s)
            }
            _ => None,
        };
        float.map(|f| integer_value(f.trunc())).unwrap_or(Value::Null)
    }
}

impl ParserType for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn validate(&self, value: &Value, _options: &Options) -> bool {
        matches!(string_form(value).as_str(), "true" | "false")
    }

    fn transform(&self, value: &Value) -> Value {
        Value::Bool(string_form(value) == "true")
    }
}

type ValidateFn = dyn Fn(&Value, &Options) -> bool + Send + Sync;
type TransformFn = dyn Fn(&Value) -> Value + Send + Sync;

/// A parser type assembled from closures.
///
/// A type built with [`named`](Self::named) and no validator rejects every
/// value; without a transformer it yields `null`.
///
/// # Examples
///
/// ```
/// use serde_json::{Map, Value, json};
/// use usage_schema_core::{CustomType, ParserType};
///
/// let upper = CustomType::new(
///     "upper",
///     |value, _| value.is_string(),
///     |value| Value::String(value.as_str().unwrap_or_default().to_uppercase()),
/// );
/// assert_eq!(upper.parse(&json!("abc"), &Map::new()), Some(json!("ABC")));
/// assert_eq!(upper.parse(&json!(1), &Map::new()), None);
/// ```
pub struct CustomType {
    name: String,
    validate: Box<ValidateFn>,
    transform: Box<TransformFn>,
}

impl CustomType {
    /// Creates a type from a name, a validator, and a transformer.
    pub fn new<V, T>(name: impl Into<String>, validate: V, transform: T) -> Self
    where
        V: Fn(&Value, &Options) -> bool + Send + Sync + 'static,
        T: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            validate: Box::new(validate),
            transform: Box::new(transform),
        }
    }

    /// Creates a type with the bare-bones validator and transformer.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, |_, _| false, |_| Value::Null)
    }

    /// Replaces the validator.
    pub fn with_validate<V>(mut self, validate: V) -> Self
    where
        V: Fn(&Value, &Options) -> bool + Send + Sync + 'static,
    {
        self.validate = Box::new(validate);
        self
    }

    /// Replaces the transformer.
    pub fn with_transform<T>(mut self, transform: T) -> Self
    where
        T: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Box::new(transform);
        self
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ParserType for CustomType {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &Value, options: &Options) -> bool {
        (self.validate)(value, options)
    }

    fn transform(&self, value: &Value) -> Value {
        (self.transform)(value)
    }
}

/// Returns the plain string form of a value.
///
/// Strings render verbatim, scalars through their display form, and
/// arrays/objects as compact JSON.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use usage_schema_core::string_form;
///
/// assert_eq!(string_form(&json!("x")), "x");
/// assert_eq!(string_form(&json!(true)), "true");
/// assert_eq!(string_form(&json!(null)), "null");
/// assert_eq!(string_form(&json!([1, 2])), "[1,2]");
/// ```
pub fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Returns `true` for option values that count as enabled.
///
/// Missing, `null`, `false`, `0` and `""` are disabled; everything else is
/// enabled.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Integer formed by the optional sign and digits at the start of `s`.
///
/// Anything after the digits is ignored, so `"3.9"` is 3 and `"1e3"` is 1.
fn leading_integer(s: &str) -> Option<Value> {
    let trimmed = s.trim_start();
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    let sign_len = trimmed.len() - unsigned.len();
    if sign_len > 1 {
        return None;
    }

    let digits = unsigned.len() - unsigned.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }

    let prefix = trimmed[..sign_len + digits].trim_start_matches('+');
    match prefix.parse::<i64>() {
        Ok(i) => Some(Value::from(i)),
        Err(_) => prefix.parse::<f64>().ok().map(integer_value),
    }
}

fn integer_value(f: f64) -> Value {
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn explicit() -> Options {
        let mut options = Options::new();
        options.insert("explicit".into(), json!(true));
        options
    }

    #[test]
    fn test_string_accepts_anything_by_default() {
        let options = Options::new();
        assert_eq!(STRING.parse(&json!("hi"), &options), Some(json!("hi")));
        assert_eq!(STRING.parse(&json!(12), &options), Some(json!("12")));
        assert_eq!(STRING.parse(&json!(false), &options), Some(json!("false")));
        assert_eq!(STRING.parse(&json!(""), &options), Some(json!("")));
    }

    #[test]
    fn test_string_explicit_requires_string_values() {
        let options = explicit();
        assert_eq!(STRING.parse(&json!("hi"), &options), Some(json!("hi")));
        assert_eq!(STRING.parse(&json!(12), &options), None);
        assert_eq!(STRING.parse(&json!(null), &options), None);
    }

    #[test]
    fn test_string_explicit_false_is_ignored() {
        let mut options = Options::new();
        options.insert("explicit".into(), json!(false));
        assert_eq!(STRING.parse(&json!(5), &options), Some(json!("5")));
    }

    #[test]
    fn test_number_validation() {
        let options = Options::new();
        assert!(NUMBER.validate(&json!(3), &options));
        assert!(NUMBER.validate(&json!(-2.5), &options));
        assert!(NUMBER.validate(&json!("17"), &options));
        assert!(NUMBER.validate(&json!(" 8 "), &options));
        assert!(NUMBER.validate(&json!("1e3"), &options));
        assert!(!NUMBER.validate(&json!("abc"), &options));
        assert!(!NUMBER.validate(&json!(""), &options));
        assert!(!NUMBER.validate(&json!("NaN"), &options));
        assert!(!NUMBER.validate(&json!("inf"), &options));
        assert!(!NUMBER.validate(&json!(true), &options));
        assert!(!NUMBER.validate(&json!(null), &options));
    }

    #[test]
    fn test_number_transform_truncates() {
        assert_eq!(NUMBER.transform(&json!("42")), json!(42));
        assert_eq!(NUMBER.transform(&json!("3.9")), json!(3));
        assert_eq!(NUMBER.transform(&json!(-3.9)), json!(-3));
        assert_eq!(NUMBER.transform(&json!("1e3")), json!(1));
        assert_eq!(NUMBER.transform(&json!("-7.5")), json!(-7));
        assert_eq!(NUMBER.transform(&json!(" +12 ")), json!(12));
        assert_eq!(NUMBER.transform(&json!(".5")), json!(0));
        assert_eq!(NUMBER.transform(&json!(u64::MAX)), json!(u64::MAX));
    }

    #[test]
    fn test_number_zero_is_not_absent() {
        assert_eq!(NUMBER.parse(&json!("0"), &Options::new()), Some(json!(0)));
    }

    #[test]
    fn test_boolean_parsing() {
        let options = Options::new();
        assert_eq!(BOOLEAN.parse(&json!("true"), &options), Some(json!(true)));
        assert_eq!(BOOLEAN.parse(&json!(false), &options), Some(json!(false)));
        assert_eq!(BOOLEAN.parse(&json!("TRUE"), &options), None);
        assert_eq!(BOOLEAN.parse(&json!("maybe"), &options), None);
        assert_eq!(BOOLEAN.parse(&json!(1), &options), None);
    }

    #[test]
    fn test_boolean_rejects_wrapped_values() {
        let options = Options::new();
        assert_eq!(BOOLEAN.parse(&json!([true]), &options), None);
        assert_eq!(BOOLEAN.parse(&json!(["false"]), &options), None);
        assert_eq!(BOOLEAN.parse(&json!({"v": true}), &options), None);
    }

    #[test]
    fn test_custom_named_type_rejects_everything() {
        let ty = CustomType::named("nothing");
        assert_eq!(ty.name(), "nothing");
        assert_eq!(ty.parse(&json!("x"), &Options::new()), None);
    }

    #[test]
    fn test_custom_type_sees_options() {
        let ty = CustomType::named("min")
            .with_validate(|value, options| {
                let min = options.get("min").and_then(Value::as_i64).unwrap_or(0);
                value.as_i64().is_some_and(|v| v >= min)
            })
            .with_transform(|value| value.clone());

        let mut options = Options::new();
        options.insert("min".into(), json!(10));
        assert_eq!(ty.parse(&json!(12), &options), Some(json!(12)));
        assert_eq!(ty.parse(&json!(9), &options), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!(1))));
        assert!(is_truthy(Some(&json!("yes"))));
        assert!(is_truthy(Some(&json!([]))));
    }
}
