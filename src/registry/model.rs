//! Compiled models

use crate::schema::{IndexSpec, SchemaDefinition, SchemaFile};
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A named, compiled handle over a schema definition
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub collection: String,
    pub schema: SchemaDefinition,
    pub indexes: Vec<IndexSpec>,
    pub checksum: String,
    pub source: Option<PathBuf>,
    pub registered_at: DateTime<Utc>,
}

impl Model {
    /// Compile a model from a definition, deriving the collection name from the model name
    pub fn new(name: &str, schema: SchemaDefinition) -> Self {
        Self {
            name: name.to_string(),
            collection: collection_name(name),
            indexes: schema.indexes(),
            schema,
            checksum: String::new(),
            source: None,
            registered_at: Utc::now(),
        }
    }

    pub fn from_file(file: SchemaFile) -> Self {
        let mut model = Self::new(&file.name, file.schema);
        if let Some(collection) = file.collection {
            model.collection = collection;
        }
        model.checksum = file.checksum;
        model.source = Some(file.path);
        model
    }

    /// `{ "$jsonSchema": ... }` document for a collection validator
    pub fn validator(&self) -> Document {
        doc! { "$jsonSchema": self.schema.json_schema() }
    }
}

/// Lower-case and pluralize a model name: `User` -> `users`, `Category` -> `categories`
pub fn collection_name(model: &str) -> String {
    let lower = model.to_lowercase();

    if lower.ends_with('s') {
        return lower;
    }

    if let Some(stem) = lower.strip_suffix('y') {
        let before = stem.chars().last();
        if before.map_or(false, |c| !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }

    if lower.ends_with("sh") || lower.ends_with("ch") || lower.ends_with('x') || lower.ends_with('z') {
        return format!("{}es", lower);
    }

    format!("{}s", lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_name() {
        assert_eq!(collection_name("User"), "users");
        assert_eq!(collection_name("Category"), "categories");
        assert_eq!(collection_name("Day"), "days");
        assert_eq!(collection_name("Box"), "boxes");
        assert_eq!(collection_name("Match"), "matches");
        assert_eq!(collection_name("News"), "news");
        assert_eq!(collection_name("BlogPost"), "blogposts");
    }

    #[test]
    fn test_from_file_applies_collection_override() {
        let schema = json!({ "email": { "type": "String", "unique": true } });
        let file = SchemaFile {
            name: "User".to_string(),
            collection: Some("people".to_string()),
            schema: SchemaDefinition::from_json(schema.as_object().unwrap()).unwrap(),
            path: PathBuf::from("/models/user.json"),
            checksum: "abc".to_string(),
        };

        let model = Model::from_file(file);
        assert_eq!(model.name, "User");
        assert_eq!(model.collection, "people");
        assert_eq!(model.indexes.len(), 1);
        assert_eq!(model.source, Some(PathBuf::from("/models/user.json")));
        assert!(model.validator().get_document("$jsonSchema").is_ok());
    }
}
