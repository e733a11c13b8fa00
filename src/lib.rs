//! Model Autoload
//!
//! Connects an axum server to MongoDB and registers the model schemas found
//! in a folder, exposing the connected handle as the server's `db` capability.

mod api;
pub mod autoload;
pub mod config;
pub mod db;
pub mod error;
pub mod registry;
pub mod schema;
pub mod server;

pub use autoload::{load_models, FileOutcome, LoadReport, ModelAutoloader};
pub use config::{AutoloadOptions, Config};
pub use db::Db;
pub use error::{AutoloadError, Result};
pub use server::{Server, DB_CAPABILITY};
