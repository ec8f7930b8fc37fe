//! The argument engine.
//!
//! [`ArgumentParser::parse`] walks a usage schema in order, slices the raw
//! inputs by each entry's [`Count`], resolves the entry's type(s) and runs
//! validate→transform on every sliced value. The first violation aborts the
//! whole parse; no partial output is returned.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use usage_schema_core::*;
//!
//! let usage = vec![
//!     UsageEntry::new(NUMBER).with_count(2),
//!     UsageEntry::new(STRING).optional(),
//! ];
//! let parsed = ArgumentParser::new().parse(&[json!("1"), json!(2)], &usage).unwrap();
//!
//! assert_eq!(parsed[0], ParsedValue::Many(vec![json!(1), json!(2)]));
//! assert!(parsed[1].is_absent());
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ArgumentError, ArgumentErrorKind, MessageError, ParserError};
use crate::parser_type::{Options, ParserType};
use crate::registry::TypeRegistry;
use crate::usage::{Count, ParsedValue, UsageEntry};
use crate::validate::validate_usage;

/// Which candidate's result a type list keeps.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use usage_schema_core::*;
///
/// let usage = vec![UsageEntry::one_of([TypeRef::from(NUMBER), TypeRef::from(STRING)])];
/// let args = [json!("7")];
///
/// let first = ArgumentParser::new().parse(&args, &usage).unwrap();
/// assert_eq!(first[0].as_single(), Some(&json!(7)));
///
/// let last = ArgumentParser::new()
///     .with_policy(TypeListPolicy::LastAttempted)
///     .parse(&args, &usage)
///     .unwrap();
/// assert_eq!(last[0].as_single(), Some(&json!("7")));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeListPolicy {
    /// Stop at the first candidate whose result fully validates. When none
    /// does, the last candidate's result is kept.
    #[default]
    FirstMatch,
    /// Evaluate every candidate and keep the last one's result.
    LastAttempted,
}

/// Parses raw positional values against usage schemas.
///
/// Holds a shared [`TypeRegistry`] for name resolution and a
/// [`TypeListPolicy`]. Cloning is cheap, and the parser keeps no state
/// between calls.
#[derive(Debug, Clone, Default)]
pub struct ArgumentParser {
    registry: Arc<TypeRegistry>,
    policy: TypeListPolicy,
}

impl ArgumentParser {
    /// Creates a parser with the built-in types and the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the type registry.
    pub fn with_registry(mut self, registry: impl Into<Arc<TypeRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    /// Replaces the type-list policy.
    pub fn with_policy(mut self, policy: TypeListPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the type-list policy.
    pub fn policy(&self) -> TypeListPolicy {
        self.policy
    }

    /// Parses `args` against `usage`.
    ///
    /// Returns one [`ParsedValue`] per entry, in schema order.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::Argument`] for schema rule violations (checked
    /// before any input is consumed), unresolvable types, and invalid or
    /// missing values.
    pub fn parse(
        &self,
        args: &[Value],
        usage: &[UsageEntry],
    ) -> Result<Vec<ParsedValue>, ParserError> {
        validate_usage(usage)?;

        // Every type resolves before any value is looked at
        let resolved = usage
            .iter()
            .enumerate()
            .map(|(entry_index, entry)| self.resolve_types(entry, entry_index))
            .collect::<Result<Vec<_>, _>>()?;

        let mut parsed = Vec::with_capacity(usage.len());
        let mut usage_index = 0usize;

        for (entry_index, (entry, types)) in usage.iter().zip(&resolved).enumerate() {
            let slot = match entry.count {
                None => self.parse_scalar(args.get(usage_index), usage_index, entry, types)?,
                Some(count) => self.parse_slice(args, usage_index, count, entry, types)?,
            };

            debug!(
                entry = entry_index,
                cursor = usage_index,
                ty = %entry.type_spec.name(),
                absent = slot.is_absent(),
                "Parsed usage entry"
            );
            parsed.push(slot);

            usage_index = match entry.count {
                None => usage_index + 1,
                Some(Count::Exactly(n)) => usage_index.saturating_add(n),
                Some(Count::Remaining) => args.len().max(usage_index),
            };
        }

        Ok(parsed)
    }

    /// Parses `args` against a dynamically shaped schema value.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::SchemaNotSequence`] if `usage` is not an
    /// array and [`MessageError::InvalidEntry`] if an element cannot be
    /// decoded; otherwise behaves like [`parse`](Self::parse).
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use usage_schema_core::*;
    ///
    /// let parser = ArgumentParser::new();
    /// let err = parser.parse_value(&[], &json!({"type": "number"})).unwrap_err();
    /// assert_eq!(err, ParserError::Message(MessageError::SchemaNotSequence));
    ///
    /// let parsed = parser.parse_value(&[json!("true")], &json!([{"type": "boolean"}])).unwrap();
    /// assert_eq!(parsed[0].as_single(), Some(&json!(true)));
    /// ```
    pub fn parse_value(
        &self,
        args: &[Value],
        usage: &Value,
    ) -> Result<Vec<ParsedValue>, ParserError> {
        let Value::Array(entries) = usage else {
            return Err(MessageError::SchemaNotSequence.into());
        };

        let usage = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value::<UsageEntry>(entry.clone()).map_err(|err| {
                    MessageError::InvalidEntry {
                        index,
                        reason: err.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.parse(args, &usage)
    }

    fn resolve_types(
        &self,
        entry: &UsageEntry,
        entry_index: usize,
    ) -> Result<Vec<Arc<dyn ParserType>>, ArgumentError> {
        let candidates = entry.type_spec.candidates();
        if candidates.is_empty() {
            return Err(ArgumentError::new(ArgumentErrorKind::TypeIsNotParserType)
                .with_index(entry_index)
                .with_type(entry.type_spec.name()));
        }

        candidates
            .iter()
            .map(|candidate| {
                candidate.resolve(&self.registry).ok_or_else(|| {
                    ArgumentError::new(ArgumentErrorKind::TypeIsNotParserType)
                        .with_index(entry_index)
                        .with_type(candidate.name())
                })
            })
            .collect()
    }

    fn parse_scalar(
        &self,
        value: Option<&Value>,
        usage_index: usize,
        entry: &UsageEntry,
        types: &[Arc<dyn ParserType>],
    ) -> Result<ParsedValue, ArgumentError> {
        let result = value.and_then(|value| {
            self.select(types, |ty| ty.parse(value, &entry.options), Option::is_some)
                .flatten()
        });

        if result.is_none() && entry.required {
            let mut err = ArgumentError::new(ArgumentErrorKind::NoRequiredArgument)
                .with_index(usage_index)
                .with_type(entry.type_spec.name());
            if let Some(value) = value {
                err = err.with_value(value.clone());
            }
            return Err(err);
        }

        Ok(ParsedValue::Single(result))
    }

    fn parse_slice(
        &self,
        args: &[Value],
        usage_index: usize,
        count: Count,
        entry: &UsageEntry,
        types: &[Arc<dyn ParserType>],
    ) -> Result<ParsedValue, ArgumentError> {
        let start = usage_index.min(args.len());
        let end = match count {
            Count::Exactly(n) => usage_index.saturating_add(n).min(args.len()),
            Count::Remaining => args.len(),
        };
        let current = &args[start..end];

        let results = self
            .select(
                types,
                |ty| parse_each(ty, current, &entry.options),
                |results| results.iter().all(Option::is_some),
            )
            .unwrap_or_default();

        if let Some(offset) = results.iter().position(Option::is_none) {
            return Err(ArgumentError::new(ArgumentErrorKind::RequiredArgumentUndefined)
                .with_value(current[offset].clone())
                .with_index(usage_index + offset)
                .with_type(entry.type_spec.name()));
        }

        if let Count::Exactly(n) = count {
            if results.len() < n {
                return Err(ArgumentError::new(ArgumentErrorKind::ArgumentsCountMismatch)
                    .with_value(Value::Array(current.to_vec()))
                    .with_index(usage_index)
                    .with_type(entry.type_spec.name()));
            }
        }

        Ok(ParsedValue::Many(results.into_iter().flatten().collect()))
    }

    /// Runs `attempt` over the candidates according to the policy.
    ///
    /// Returns `None` only when `types` is empty.
    fn select<R>(
        &self,
        types: &[Arc<dyn ParserType>],
        attempt: impl Fn(&dyn ParserType) -> R,
        matched: impl Fn(&R) -> bool,
    ) -> Option<R> {
        let mut result = None;
        for ty in types {
            let outcome = attempt(ty.as_ref());
            let hit = matched(&outcome);
            result = Some(outcome);
            if hit && self.policy == TypeListPolicy::FirstMatch {
                break;
            }
        }
        result
    }
}

fn parse_each(ty: &dyn ParserType, values: &[Value], options: &Options) -> Vec<Option<Value>> {
    values.iter().map(|value| ty.parse(value, options)).collect()
}

/// Parses `args` against `usage` with a default [`ArgumentParser`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use usage_schema_core::*;
///
/// let usage = vec![UsageEntry::new(BOOLEAN)];
/// let err = parse(&[json!("maybe")], &usage).unwrap_err();
/// assert_eq!(err.kind(), Some(ArgumentErrorKind::NoRequiredArgument));
/// ```
pub fn parse(args: &[Value], usage: &[UsageEntry]) -> Result<Vec<ParsedValue>, ParserError> {
    ArgumentParser::new().parse(args, usage)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{BOOLEAN, CustomType, NUMBER, STRING, TypeRef};

    fn parser() -> ArgumentParser {
        ArgumentParser::new()
    }

    fn argument_error(result: Result<Vec<ParsedValue>, ParserError>) -> ArgumentError {
        match result {
            Err(ParserError::Argument(err)) => err,
            other => panic!("expected argument error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_number_then_optional_string() {
        let usage = vec![UsageEntry::new(NUMBER), UsageEntry::new(STRING).optional()];
        let parsed = parser().parse(&[json!(42)], &usage).unwrap();
        assert_eq!(
            parsed,
            vec![ParsedValue::Single(Some(json!(42))), ParsedValue::Single(None)]
        );
    }

    #[test]
    fn test_parse_counted_numbers() {
        let usage = vec![UsageEntry::new(NUMBER).with_count(2)];
        let parsed = parser().parse(&[json!(1), json!(2)], &usage).unwrap();
        assert_eq!(parsed, vec![ParsedValue::Many(vec![json!(1), json!(2)])]);
    }

    #[test]
    fn test_parse_invalid_boolean_fails() {
        let usage = vec![UsageEntry::new(BOOLEAN)];
        let err = argument_error(parser().parse(&[json!("maybe")], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::NoRequiredArgument);
        assert_eq!(err.index, Some(0));
        assert_eq!(err.value, Some(json!("maybe")));
        assert_eq!(err.type_name.as_deref(), Some("boolean"));
    }

    #[test]
    fn test_parse_false_boolean_is_present() {
        let usage = vec![UsageEntry::new(BOOLEAN)];
        let parsed = parser().parse(&[json!("false")], &usage).unwrap();
        assert_eq!(parsed[0].as_single(), Some(&json!(false)));
    }

    #[test]
    fn test_missing_required_scalar_has_no_value() {
        let usage = vec![UsageEntry::new(STRING), UsageEntry::new(STRING)];
        let err = argument_error(parser().parse(&[json!("only")], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::NoRequiredArgument);
        assert_eq!(err.index, Some(1));
        assert_eq!(err.value, None);
    }

    #[test]
    fn test_missing_optional_string_does_not_consult_type() {
        let usage = vec![UsageEntry::new(STRING).optional()];
        let parsed = parser().parse(&[], &usage).unwrap();
        assert!(parsed[0].is_absent());
    }

    #[test]
    fn test_counted_slice_reports_absolute_index() {
        let usage = vec![UsageEntry::new(STRING), UsageEntry::new(NUMBER).with_count(3)];
        let err = argument_error(
            parser().parse(&[json!("x"), json!(1), json!("two"), json!(3)], &usage),
        );
        assert_eq!(err.kind, ArgumentErrorKind::RequiredArgumentUndefined);
        assert_eq!(err.index, Some(2));
        assert_eq!(err.value, Some(json!("two")));
    }

    #[test]
    fn test_counted_slice_too_short() {
        let usage = vec![UsageEntry::new(NUMBER).with_count(3)];
        let err = argument_error(parser().parse(&[json!(1), json!(2)], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::ArgumentsCountMismatch);
        assert_eq!(err.index, Some(0));
        assert_eq!(err.value, Some(json!([1, 2])));
    }

    #[test]
    fn test_count_zero_yields_empty_sequence() {
        let usage = vec![UsageEntry::new(NUMBER).with_count(0), UsageEntry::new(STRING)];
        let parsed = parser().parse(&[json!("a")], &usage).unwrap();
        assert_eq!(parsed[0], ParsedValue::Many(vec![]));
        assert_eq!(parsed[1].as_single(), Some(&json!("a")));
    }

    #[test]
    fn test_remaining_consumes_rest() {
        let usage = vec![UsageEntry::new(STRING), UsageEntry::new(NUMBER).remaining()];
        let parsed = parser()
            .parse(&[json!("cmd"), json!("1"), json!(2), json!("3")], &usage)
            .unwrap();
        assert_eq!(parsed[1], ParsedValue::Many(vec![json!(1), json!(2), json!(3)]));

        let parsed = parser().parse(&[json!("cmd")], &usage).unwrap();
        assert_eq!(parsed[1], ParsedValue::Many(vec![]));
    }

    #[test]
    fn test_entry_after_remaining_sees_nothing() {
        let usage = vec![
            UsageEntry::new(NUMBER).remaining(),
            UsageEntry::new(STRING).optional(),
        ];
        let parsed = parser().parse(&[json!(1), json!(2)], &usage).unwrap();
        assert_eq!(parsed[0], ParsedValue::Many(vec![json!(1), json!(2)]));
        assert!(parsed[1].is_absent());
    }

    #[test]
    fn test_unknown_type_name_fails_before_values() {
        let usage = vec![UsageEntry::new(NUMBER), UsageEntry::named("float")];
        let err = argument_error(parser().parse(&[json!("not a number")], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::TypeIsNotParserType);
        assert_eq!(err.index, Some(1));
        assert_eq!(err.type_name.as_deref(), Some("float"));
    }

    #[test]
    fn test_unknown_type_reported_before_missing_values() {
        let usage = vec![
            UsageEntry::new(BOOLEAN),
            UsageEntry::new(NUMBER).with_count(2),
            UsageEntry::named("float").optional(),
        ];
        let err = argument_error(parser().parse(&[], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::TypeIsNotParserType);
        assert_eq!(err.index, Some(2));
    }

    #[test]
    fn test_unknown_type_inside_list_fails() {
        let usage = vec![UsageEntry::one_of([
            TypeRef::from(NUMBER),
            TypeRef::named("float"),
        ])];
        let err = argument_error(parser().parse(&[json!(1)], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::TypeIsNotParserType);
        assert_eq!(err.type_name.as_deref(), Some("float"));
    }

    #[test]
    fn test_empty_type_list_is_not_a_parser_type() {
        let usage = vec![UsageEntry::one_of([])];
        let err = argument_error(parser().parse(&[json!(1)], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::TypeIsNotParserType);
        assert_eq!(err.index, Some(0));
    }

    #[test]
    fn test_first_match_policy_stops_at_first_valid() {
        let usage = vec![UsageEntry::one_of([TypeRef::from(BOOLEAN), TypeRef::from(STRING)])];
        let parsed = parser().parse(&[json!("true")], &usage).unwrap();
        assert_eq!(parsed[0].as_single(), Some(&json!(true)));

        let parsed = parser().parse(&[json!("hello")], &usage).unwrap();
        assert_eq!(parsed[0].as_single(), Some(&json!("hello")));
    }

    #[test]
    fn test_first_match_falls_back_to_last_result() {
        let usage = vec![UsageEntry::one_of([TypeRef::from(NUMBER), TypeRef::from(BOOLEAN)])];
        let err = argument_error(parser().parse(&[json!("maybe")], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::NoRequiredArgument);
        assert_eq!(err.type_name.as_deref(), Some("number|boolean"));
    }

    #[test]
    fn test_last_attempted_policy_keeps_last_result() {
        let usage = vec![UsageEntry::one_of([TypeRef::from(STRING), TypeRef::from(NUMBER)])];
        let last = parser().with_policy(TypeListPolicy::LastAttempted);

        let parsed = last.parse(&[json!("12")], &usage).unwrap();
        assert_eq!(parsed[0].as_single(), Some(&json!(12)));

        // STRING would accept, but NUMBER ran last and rejected
        let err = argument_error(last.parse(&[json!("abc")], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::NoRequiredArgument);
    }

    #[test]
    fn test_type_list_over_slice_requires_whole_slice() {
        let usage = vec![
            UsageEntry::one_of([TypeRef::from(NUMBER), TypeRef::from(STRING)]).with_count(2),
        ];
        let parsed = parser().parse(&[json!("1"), json!("x")], &usage).unwrap();
        assert_eq!(parsed[0], ParsedValue::Many(vec![json!("1"), json!("x")]));
    }

    #[test]
    fn test_options_reach_parser_type() {
        let usage = vec![UsageEntry::new(STRING).with_option("explicit", true)];
        let err = argument_error(parser().parse(&[json!(5)], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::NoRequiredArgument);

        let parsed = parser().parse(&[json!("5")], &usage).unwrap();
        assert_eq!(parsed[0].as_single(), Some(&json!("5")));
    }

    #[test]
    fn test_options_do_not_leak_between_entries() {
        let usage = vec![
            UsageEntry::new(STRING).with_option("explicit", true),
            UsageEntry::new(STRING),
        ];
        let parsed = parser().parse(&[json!("a"), json!(1)], &usage).unwrap();
        assert_eq!(parsed[1].as_single(), Some(&json!("1")));
    }

    #[test]
    fn test_custom_registry_resolves_names() {
        let mut registry = TypeRegistry::default();
        registry.register(CustomType::new(
            "port",
            |value, _| NUMBER.validate(value, &Options::new()),
            |value| NUMBER.transform(value),
        ));
        let parser = ArgumentParser::new().with_registry(registry);

        let usage = vec![UsageEntry::named("port")];
        let parsed = parser.parse(&[json!("8080")], &usage).unwrap();
        assert_eq!(parsed[0].as_single(), Some(&json!(8080)));
    }

    #[test]
    fn test_schema_rules_checked_before_types() {
        let usage = vec![
            UsageEntry::named("missing").optional(),
            UsageEntry::new(NUMBER).optional(),
        ];
        let err = argument_error(parser().parse(&[], &usage));
        assert_eq!(err.kind, ArgumentErrorKind::NonRequiredArgumentMustBeOne);
        assert_eq!(err.index, Some(1));
    }

    #[test]
    fn test_parse_value_rejects_bad_entry() {
        let err = parser()
            .parse_value(&[], &json!([{"type": "number"}, {"count": 1}]))
            .unwrap_err();
        assert!(matches!(
            err,
            ParserError::Message(MessageError::InvalidEntry { index: 1, .. })
        ));
    }
}
