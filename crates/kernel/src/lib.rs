//! Core building blocks shared by every course-library crate: the module
//! trait, the module registry, and layered settings.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
