//! The fluent registration surface.
//!
//! A [`Registrar`] borrows a registry and opens one [`Registration`] per
//! entry; the registration collects the optional name and flags and is
//! submitted by [`Registration::with`], which hands back the name the
//! registry assigned.
//!
//! # Example
//!
//! ```
//! use crucible_registry::{MapRegistry, Registrar};
//!
//! struct Clock {
//!     zone: &'static str,
//! }
//!
//! let mut registry = MapRegistry::new();
//! let mut registrar = Registrar::new(&mut registry);
//!
//! let name = registrar
//!     .register::<Clock>()
//!     .named("clock")
//!     .description("wall clock pinned to UTC")
//!     .with(|| Clock { zone: "UTC" })
//!     .unwrap();
//!
//! assert_eq!(name, "clock");
//! ```

use crate::registry::{Definition, Registry, RegistryError};
use std::marker::PhantomData;

/// Fluent front end over a mutable registry borrow.
#[derive(Debug)]
pub struct Registrar<'a, R: Registry> {
    registry: &'a mut R,
}

impl<'a, R: Registry> Registrar<'a, R> {
    /// Creates a registrar over the given registry.
    #[must_use]
    pub fn new(registry: &'a mut R) -> Self {
        Self { registry }
    }

    /// Opens a registration for instances of `T`.
    pub fn register<T: Send + Sync + 'static>(&mut self) -> Registration<'_, R, T> {
        Registration {
            registry: &mut *self.registry,
            name: None,
            lazy_init: false,
            primary: false,
            description: None,
            _bean: PhantomData,
        }
    }
}

/// One in-flight registration; submitted by [`Registration::with`].
#[must_use]
pub struct Registration<'a, R: Registry, T> {
    registry: &'a mut R,
    name: Option<String>,
    lazy_init: bool,
    primary: bool,
    description: Option<String>,
    _bean: PhantomData<fn() -> T>,
}

impl<R: Registry, T: Send + Sync + 'static> Registration<'_, R, T> {
    /// Sets an explicit name; without one the registry generates a name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Asks for lazy initialization.
    pub fn lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = lazy_init;
        self
    }

    /// Marks this entry as the primary candidate for its type.
    pub fn primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Attaches a human-readable description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Submits the registration with the given supplier closure.
    ///
    /// # Errors
    ///
    /// Returns whatever the registry raises, unchanged - typically a
    /// duplicate-name rejection.
    pub fn with<F>(self, supplier: F) -> Result<String, RegistryError>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let mut definition = Definition::new(supplier)
            .lazy_init(self.lazy_init)
            .primary(self.primary);
        if let Some(name) = self.name {
            definition = definition.named(name);
        }
        if let Some(description) = self.description {
            definition = definition.description(description);
        }
        self.registry.register(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MapRegistry;

    struct Repository {
        url: String,
    }

    struct Cache;

    #[test]
    fn test_registrar_round_trip() {
        let mut registry = MapRegistry::new();
        let mut registrar = Registrar::new(&mut registry);

        let name = registrar
            .register::<Repository>()
            .named("repo")
            .lazy_init(true)
            .with(|| Repository {
                url: "sqlite::memory:".into(),
            })
            .unwrap();
        assert_eq!(name, "repo");

        let definition = registry.definition("repo").unwrap();
        assert!(definition.is_lazy_init());
        let repo: Repository = registry.instantiate("repo").unwrap();
        assert_eq!(repo.url, "sqlite::memory:");
    }

    #[test]
    fn test_generated_name_returned() {
        let mut registry = MapRegistry::new();
        let mut registrar = Registrar::new(&mut registry);
        let name = registrar.register::<Cache>().with(|| Cache).unwrap();
        assert_eq!(name, "cache");
    }

    #[test]
    fn test_multiple_registrations_through_one_registrar() {
        let mut registry = MapRegistry::new();
        let mut registrar = Registrar::new(&mut registry);
        registrar.register::<Cache>().with(|| Cache).unwrap();
        registrar
            .register::<Repository>()
            .with(|| Repository { url: "x".into() })
            .unwrap();
        assert_eq!(registry.len(), 2);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["cache", "repository"]);
    }

    #[test]
    fn test_duplicate_name_error_passes_through() {
        let mut registry = MapRegistry::new();
        let mut registrar = Registrar::new(&mut registry);
        registrar
            .register::<Cache>()
            .named("shared")
            .with(|| Cache)
            .unwrap();
        let error = registrar
            .register::<Repository>()
            .named("shared")
            .with(|| Repository { url: "x".into() })
            .unwrap_err();
        assert!(matches!(error, RegistryError::DuplicateName(name) if name == "shared"));
    }
}
