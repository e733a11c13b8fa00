//! Schema Definition
//!
//! Parses the `schema` object of a model file into a typed field tree.
//!
//! Accepted field forms:
//! ```json
//! {
//!   "email":   { "type": "String", "required": true, "unique": true },
//!   "age":     "Number",
//!   "tags":    ["String"],
//!   "profile": { "bio": "String", "joined": { "type": "Date", "index": -1 } }
//! }
//! ```

use crate::error::SchemaLoadError;
use bson::{doc, Bson, Document};
use mongodb::{options::IndexOptions, IndexModel};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    ObjectId,
    Buffer,
    Decimal128,
    Map,
    Mixed,
}

impl FieldType {
    fn parse(name: &str) -> Option<Self> {
        let parsed = match name.to_ascii_lowercase().as_str() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "boolean" | "bool" => FieldType::Boolean,
            "date" => FieldType::Date,
            "objectid" => FieldType::ObjectId,
            "buffer" => FieldType::Buffer,
            "decimal128" => FieldType::Decimal128,
            "map" => FieldType::Map,
            "mixed" => FieldType::Mixed,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::ObjectId => "ObjectId",
            FieldType::Buffer => "Buffer",
            FieldType::Decimal128 => "Decimal128",
            FieldType::Map => "Map",
            FieldType::Mixed => "Mixed",
        }
    }

    /// `bsonType` for the `$jsonSchema` validator. Mixed is unconstrained.
    fn bson_type(&self) -> Option<&'static str> {
        match self {
            FieldType::String => Some("string"),
            FieldType::Number => Some("number"),
            FieldType::Boolean => Some("bool"),
            FieldType::Date => Some("date"),
            FieldType::ObjectId => Some("objectId"),
            FieldType::Buffer => Some("binData"),
            FieldType::Decimal128 => Some("decimal"),
            FieldType::Map => Some("object"),
            FieldType::Mixed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(FieldType),
    Array(Box<FieldDefinition>),
    Document(SchemaDefinition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    /// Index direction, `1` or `-1`, when the field asks for a plain index
    pub index: Option<i32>,
    pub default: Option<Value>,
    pub enum_values: Vec<Bson>,
}

impl FieldDefinition {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            unique: false,
            index: None,
            default: None,
            enum_values: Vec::new(),
        }
    }

    /// Human readable type, e.g. `String`, `[Number]`, `Document`
    pub fn type_label(&self) -> String {
        match &self.kind {
            FieldKind::Scalar(t) => t.name().to_string(),
            FieldKind::Array(inner) => format!("[{}]", inner.type_label()),
            FieldKind::Document(_) => "Document".to_string(),
        }
    }

    fn json_schema(&self) -> Document {
        let mut schema = match &self.kind {
            FieldKind::Scalar(t) => match t.bson_type() {
                Some(bson_type) => doc! { "bsonType": bson_type },
                None => Document::new(),
            },
            FieldKind::Array(inner) => doc! {
                "bsonType": "array",
                "items": inner.json_schema(),
            },
            FieldKind::Document(nested) => nested.json_schema(),
        };

        if !self.enum_values.is_empty() {
            schema.insert("enum", self.enum_values.clone());
        }

        schema
    }
}

/// An ordered set of named fields. Member order follows the source object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDefinition {
    fields: Vec<(String, FieldDefinition)>,
}

/// Index derived from `unique` / `index` field options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: String,
    pub direction: i32,
    pub unique: bool,
}

impl IndexSpec {
    pub fn to_index_model(&self) -> IndexModel {
        let options = IndexOptions::builder()
            .unique(self.unique.then_some(true))
            .build();

        let mut keys = Document::new();
        keys.insert(self.field.clone(), self.direction);

        IndexModel::builder()
            .keys(keys)
            .options(options)
            .build()
    }
}

impl SchemaDefinition {
    pub fn from_json(object: &Map<String, Value>) -> Result<Self, SchemaLoadError> {
        parse_object(object, "")
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, def)| def)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a `$jsonSchema` body suitable for a collection validator
    pub fn json_schema(&self) -> Document {
        let mut properties = Document::new();
        let mut required = Vec::new();

        for (name, def) in &self.fields {
            properties.insert(name.clone(), def.json_schema());
            if def.required {
                required.push(Bson::String(name.clone()));
            }
        }

        let mut schema = doc! { "bsonType": "object", "properties": properties };
        if !required.is_empty() {
            schema.insert("required", required);
        }
        schema
    }

    /// Collect index specs from every field, using dotted paths for nested documents
    pub fn indexes(&self) -> Vec<IndexSpec> {
        let mut specs = Vec::new();
        collect_indexes(self, "", &mut specs);
        specs
    }
}

fn collect_indexes(schema: &SchemaDefinition, prefix: &str, specs: &mut Vec<IndexSpec>) {
    for (name, def) in &schema.fields {
        let path = join_path(prefix, name);
        collect_field_indexes(def, &path, specs);
    }
}

fn collect_field_indexes(def: &FieldDefinition, path: &str, specs: &mut Vec<IndexSpec>) {
    if def.unique {
        specs.push(IndexSpec {
            field: path.to_string(),
            direction: def.index.unwrap_or(1),
            unique: true,
        });
    } else if let Some(direction) = def.index {
        specs.push(IndexSpec {
            field: path.to_string(),
            direction,
            unique: false,
        });
    }

    match &def.kind {
        FieldKind::Array(inner) => collect_field_indexes(inner, path, specs),
        FieldKind::Document(nested) => collect_indexes(nested, path, specs),
        FieldKind::Scalar(_) => {}
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> SchemaLoadError {
    SchemaLoadError::InvalidSchema {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn parse_object(object: &Map<String, Value>, prefix: &str) -> Result<SchemaDefinition, SchemaLoadError> {
    let mut fields = Vec::with_capacity(object.len());

    for (name, value) in object {
        let path = join_path(prefix, name);
        if name.is_empty() || name.starts_with('$') || name.contains('.') {
            return Err(invalid(&path, "field names must be non-empty and must not start with '$' or contain '.'"));
        }
        fields.push((name.clone(), parse_field(value, &path)?));
    }

    Ok(SchemaDefinition { fields })
}

fn parse_field(value: &Value, path: &str) -> Result<FieldDefinition, SchemaLoadError> {
    match value {
        Value::Object(map) if map.contains_key("type") => parse_field_options(map, path),
        other => Ok(FieldDefinition::of(parse_kind(other, path)?)),
    }
}

fn parse_kind(value: &Value, path: &str) -> Result<FieldKind, SchemaLoadError> {
    match value {
        Value::String(name) if name.eq_ignore_ascii_case("array") => {
            Ok(FieldKind::Array(Box::new(FieldDefinition::of(FieldKind::Scalar(FieldType::Mixed)))))
        }
        Value::String(name) => FieldType::parse(name)
            .map(FieldKind::Scalar)
            .ok_or_else(|| invalid(path, format!("unknown type '{}'", name))),
        Value::Array(items) => match items.as_slice() {
            [] => Ok(FieldKind::Array(Box::new(FieldDefinition::of(FieldKind::Scalar(FieldType::Mixed))))),
            [item] => Ok(FieldKind::Array(Box::new(parse_field(item, path)?))),
            _ => Err(invalid(path, "array shorthand takes exactly one element definition")),
        },
        Value::Object(map) => Ok(FieldKind::Document(parse_object(map, path)?)),
        other => Err(invalid(path, format!("expected a type name, array or object, got {}", other))),
    }
}

fn parse_field_options(map: &Map<String, Value>, path: &str) -> Result<FieldDefinition, SchemaLoadError> {
    // Checked by the caller
    let type_value = &map["type"];
    let mut def = FieldDefinition::of(parse_kind(type_value, path)?);

    if let Some(required) = map.get("required") {
        def.required = required
            .as_bool()
            .ok_or_else(|| invalid(path, "'required' must be a boolean"))?;
    }

    if let Some(unique) = map.get("unique") {
        def.unique = unique
            .as_bool()
            .ok_or_else(|| invalid(path, "'unique' must be a boolean"))?;
    }

    if let Some(index) = map.get("index") {
        def.index = match index {
            Value::Bool(true) => Some(1),
            Value::Bool(false) => None,
            Value::Number(n) if n.as_i64() == Some(1) => Some(1),
            Value::Number(n) if n.as_i64() == Some(-1) => Some(-1),
            _ => return Err(invalid(path, "'index' must be a boolean, 1 or -1")),
        };
    }

    if let Some(default) = map.get("default") {
        def.default = Some(default.clone());
    }

    if let Some(values) = map.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| invalid(path, "'enum' must be an array"))?;
        def.enum_values = values
            .iter()
            .map(|v| bson::to_bson(v).map_err(|e| invalid(path, format!("invalid enum value: {}", e))))
            .collect::<Result<_, _>>()?;
    }

    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<SchemaDefinition, SchemaLoadError> {
        SchemaDefinition::from_json(value.as_object().unwrap())
    }

    #[test]
    fn test_shorthand_and_option_fields() {
        let schema = parse(json!({
            "email": { "type": "String", "required": true, "unique": true },
            "age": "Number",
            "active": { "type": "boolean", "default": true }
        }))
        .unwrap();

        assert_eq!(schema.len(), 3);
        let email = schema.field("email").unwrap();
        assert_eq!(email.kind, FieldKind::Scalar(FieldType::String));
        assert!(email.required);
        assert!(email.unique);

        assert_eq!(schema.field("age").unwrap().type_label(), "Number");
        assert_eq!(schema.field("active").unwrap().default, Some(json!(true)));
    }

    #[test]
    fn test_arrays_and_nested_documents() {
        let schema = parse(json!({
            "tags": ["String"],
            "anything": [],
            "profile": { "bio": "String", "joined": { "type": "Date", "index": -1 } }
        }))
        .unwrap();

        assert_eq!(schema.field("tags").unwrap().type_label(), "[String]");
        assert_eq!(schema.field("anything").unwrap().type_label(), "[Mixed]");

        let profile = schema.field("profile").unwrap();
        match &profile.kind {
            FieldKind::Document(nested) => {
                assert_eq!(nested.len(), 2);
                assert_eq!(nested.field("joined").unwrap().index, Some(-1));
            }
            other => panic!("expected nested document, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = parse(json!({ "age": "Integer" })).unwrap_err();
        match err {
            SchemaLoadError::InvalidSchema { field, reason } => {
                assert_eq!(field, "age");
                assert!(reason.contains("Integer"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let nested = parse(json!({ "profile": { "rank": { "type": "Rank" } } })).unwrap_err();
        assert!(matches!(nested, SchemaLoadError::InvalidSchema { ref field, .. } if field == "profile.rank"));
    }

    #[test]
    fn test_bad_options_are_rejected() {
        assert!(parse(json!({ "a": { "type": "String", "required": "yes" } })).is_err());
        assert!(parse(json!({ "a": { "type": "String", "index": 2 } })).is_err());
        assert!(parse(json!({ "a": ["String", "Number"] })).is_err());
        assert!(parse(json!({ "$where": "String" })).is_err());
        assert!(parse(json!({ "a": 42 })).is_err());
    }

    #[test]
    fn test_indexes_from_unique_and_index_options() {
        let schema = parse(json!({
            "email": { "type": "String", "unique": true },
            "createdAt": { "type": "Date", "index": true },
            "name": "String",
            "profile": { "handle": { "type": "String", "unique": true } }
        }))
        .unwrap();

        let mut indexes = schema.indexes();
        indexes.sort_by(|a, b| a.field.cmp(&b.field));

        assert_eq!(
            indexes,
            vec![
                IndexSpec { field: "createdAt".to_string(), direction: 1, unique: false },
                IndexSpec { field: "email".to_string(), direction: 1, unique: true },
                IndexSpec { field: "profile.handle".to_string(), direction: 1, unique: true },
            ]
        );

        let model = indexes[1].to_index_model();
        assert_eq!(model.keys, doc! { "email": 1 });
        assert_eq!(model.options.and_then(|o| o.unique), Some(true));
    }

    #[test]
    fn test_json_schema_validator() {
        let schema = parse(json!({
            "email": { "type": "String", "required": true },
            "role": { "type": "String", "enum": ["admin", "member"] },
            "tags": ["String"],
            "extra": "Mixed"
        }))
        .unwrap();

        let validator = schema.json_schema();
        assert_eq!(validator.get_str("bsonType").unwrap(), "object");
        assert_eq!(
            validator.get_array("required").unwrap(),
            &vec![Bson::String("email".to_string())]
        );

        let properties = validator.get_document("properties").unwrap();
        let role = properties.get_document("role").unwrap();
        assert_eq!(role.get_array("enum").unwrap().len(), 2);
        let tags = properties.get_document("tags").unwrap();
        assert_eq!(tags.get_str("bsonType").unwrap(), "array");
        assert_eq!(tags.get_document("items").unwrap().get_str("bsonType").unwrap(), "string");
        assert!(properties.get_document("extra").unwrap().is_empty());
    }
}
