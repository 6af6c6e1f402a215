//! Bookshelf application library
//!
//! Application modules and the service bootstrap built on the bookshelf kernel.

pub mod bootstrap;
pub mod modules;
pub mod utils;

pub use bootstrap::{build_registry, run};
/// Re-export commonly used types
pub use modules::*;
