//! Model Registry
//!
//! Compiled models keyed by name. The registry is owned by the database
//! handle and shared with every plugin run against it.

mod model;
mod models;

pub use model::{collection_name, Model};
pub use models::{ModelRegistry, Registration};
