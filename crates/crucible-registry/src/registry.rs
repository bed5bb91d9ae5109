//! The registry seam and its in-memory implementation.
//!
//! A [`Registry`] accepts finished [`Definition`]s and answers with the name
//! each one ended up under - the explicit name when one was given, a
//! generated one otherwise. Lifecycle concerns (instantiation order,
//! injection, scanning) belong to the embedding framework, not this layer;
//! [`MapRegistry`] only keeps definition bookkeeping so tests and simple
//! embedders have something concrete to register into.

use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Closure producing a fresh, type-erased instance for a definition.
pub type Supplier = Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Errors raised by a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An explicit name was already taken.
    #[error("definition `{0}` is already registered")]
    DuplicateName(String),
}

/// A named, flagged recipe for producing one instance type.
pub struct Definition {
    type_name: &'static str,
    name: Option<String>,
    lazy_init: bool,
    primary: bool,
    description: Option<String>,
    supplier: Supplier,
}

impl Definition {
    /// Creates a definition around a supplier closure.
    #[must_use]
    pub fn new<T, F>(supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            name: None,
            lazy_init: false,
            primary: false,
            description: None,
            supplier: Box::new(move || Box::new(supplier())),
        }
    }

    /// Sets an explicit name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the definition for lazy initialization.
    #[must_use]
    pub fn lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = lazy_init;
        self
    }

    /// Marks the definition as the primary candidate for its type.
    #[must_use]
    pub fn primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Attaches a human-readable description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the full type name of the produced instances.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the explicit name, if one was set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if the definition asks for lazy initialization.
    #[must_use]
    pub const fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    /// Returns `true` if the definition is the primary candidate.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary
    }

    /// Returns the description, if one was set.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Produces a fresh type-erased instance.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Any + Send + Sync> {
        (self.supplier)()
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("lazy_init", &self.lazy_init)
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}

/// External component that accepts definitions.
///
/// Returns the name the definition was stored under: the explicit one when
/// set, a generated one otherwise.
pub trait Registry {
    /// Registers a definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the definition cannot be accepted, for
    /// example on a duplicate explicit name.
    fn register(&mut self, definition: Definition) -> Result<String, RegistryError>;
}

/// In-memory registry keeping definitions by name in registration order.
#[derive(Debug, Default)]
pub struct MapRegistry {
    definitions: indexmap::IndexMap<String, Definition>,
}

impl MapRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns `true` if a definition is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    /// Iterates over the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Produces a fresh instance from the named definition, downcast to `T`.
    ///
    /// Returns `None` when the name is unknown or the definition produces a
    /// different type.
    #[must_use]
    pub fn instantiate<T: 'static>(&self, name: &str) -> Option<T> {
        self.definitions
            .get(name)
            .map(Definition::instantiate)
            .and_then(|instance| instance.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    fn generated_name(&self, type_name: &str) -> String {
        let base = decapitalized_simple_name(type_name);
        if !self.definitions.contains_key(&base) {
            return base;
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{base}#{counter}");
            if !self.definitions.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

impl Registry for MapRegistry {
    fn register(&mut self, definition: Definition) -> Result<String, RegistryError> {
        let name = match definition.name() {
            Some(explicit) => {
                if self.definitions.contains_key(explicit) {
                    return Err(RegistryError::DuplicateName(explicit.to_string()));
                }
                explicit.to_string()
            }
            None => self.generated_name(definition.type_name()),
        };
        self.definitions.insert(name.clone(), definition);
        Ok(name)
    }
}

/// Derives a registry name from a full type path: last path segment,
/// generics stripped, first character lowercased.
fn decapitalized_simple_name(type_name: &str) -> String {
    let no_generics = type_name.split('<').next().unwrap_or(type_name);
    let simple = no_generics.rsplit("::").next().unwrap_or(no_generics);
    let mut chars = simple.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().collect::<String>() + chars.as_str()
    })
}
