//! Module kernel: lifecycle trait, module registry and layered settings.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
