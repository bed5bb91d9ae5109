//! # Crucible Registry
//!
//! Fluent registration sugar over an external definition registry: the
//! registry interface accepts a type, an optional explicit name, flags, and
//! a supplier closure, and answers with the name the entry was stored under.
//!
//! Instantiation order, injection, and scanning are the embedding
//! framework's business; this crate only shapes the registration call.

#![doc(html_root_url = "https://docs.rs/crucible-registry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod registrar;
mod registry;

pub use registrar::{Registrar, Registration};
pub use registry::{Definition, MapRegistry, Registry, RegistryError, Supplier};
