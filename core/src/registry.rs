//! Name-to-type lookup for schemas that reference types by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::parser_type::{BOOLEAN, NUMBER, ParserType, STRING};

/// Registry of parser types addressable by name.
///
/// [`TypeRegistry::default`] contains the built-in `string`, `number` and
/// `boolean` types; [`TypeRegistry::new`] starts empty.
///
/// # Examples
///
/// ```
/// use serde_json::{Value, json};
/// use usage_schema_core::{CustomType, TypeRegistry};
///
/// let mut registry = TypeRegistry::default();
/// registry.register(CustomType::new("even", |v, _| v.as_i64().is_some_and(|n| n % 2 == 0), Value::clone));
///
/// assert!(registry.contains("number"));
/// assert!(registry.contains("even"));
/// assert!(registry.get("float").is_none());
/// ```
#[derive(Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn ParserType>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Creates a registry holding only the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(STRING);
        registry.register(NUMBER);
        registry.register(BOOLEAN);
        registry
    }

    /// Registers `ty` under its own name, replacing any previous entry.
    pub fn register(&mut self, ty: impl ParserType + 'static) {
        self.register_shared(Arc::new(ty));
    }

    /// Registers an already shared type under its own name.
    pub fn register_shared(&mut self, ty: Arc<dyn ParserType>) {
        self.types.insert(ty.name().to_string(), ty);
    }

    /// Looks up a type by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ParserType>> {
        self.types.get(name).cloned()
    }

    /// Returns `true` if a type is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}
