mod definition;
mod loader;

pub use definition::{FieldDefinition, FieldKind, FieldType, IndexSpec, SchemaDefinition};
pub use loader::{SchemaFile, SchemaLoader, SCHEMA_EXTENSION};
