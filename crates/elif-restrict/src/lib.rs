//! # elif-restrict: Dependent-record delete restrictions for elif.rs
//!
//! Guards the deletion of a parent record while dependent records still
//! exist. Associations are declared once with a [`DependentPolicy`]; at
//! delete time the guard checks each restricted association in declaration
//! order and either allows the delete, asks the host to roll back its unit
//! of work, or fails with a [`BlockedDeletionError`] carrying a localized
//! summary and a short list of the blocking records.
//!
//! The host ORM is consumed through three narrow seams: a pre-delete hook
//! list ([`HookRegistrar`]), a transaction-bound query surface
//! ([`DependencySource`]) and an optional [`LocalizationProvider`].

pub mod config;
pub mod decision;
pub mod descriptor;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod hooks;
pub mod host;
pub mod message;
pub mod policy;
pub mod registry;
pub mod translations;

pub use config::*;
pub use decision::*;
pub use descriptor::*;
pub use error::*;
pub use evaluator::*;
pub use guard::*;
pub use hooks::*;
pub use host::*;
pub use message::*;
pub use policy::*;
pub use registry::*;
pub use translations::*;
