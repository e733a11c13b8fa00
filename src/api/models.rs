//! Model API endpoints
//!
//! - GET /models - List registered models
//! - GET /models/:name - Describe one model, including its collection validator

use crate::db::Db;
use crate::error::{AutoloadError, Result};
use crate::registry::Model;
use axum::{
    extract::{Path, State},
    Json,
};
use bson::Bson;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub unique: bool,
}

#[derive(Serialize)]
pub struct IndexSummary {
    pub field: String,
    pub direction: i32,
    pub unique: bool,
}

#[derive(Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub collection: String,
    pub fields: Vec<FieldSummary>,
    pub indexes: Vec<IndexSummary>,
    pub checksum: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ModelDetail {
    #[serde(flatten)]
    pub summary: ModelSummary,
    pub validator: serde_json::Value,
}

impl From<&Model> for ModelSummary {
    fn from(model: &Model) -> Self {
        Self {
            name: model.name.clone(),
            collection: model.collection.clone(),
            fields: model
                .schema
                .fields()
                .map(|(name, def)| FieldSummary {
                    name: name.to_string(),
                    field_type: def.type_label(),
                    required: def.required,
                    unique: def.unique,
                })
                .collect(),
            indexes: model
                .indexes
                .iter()
                .map(|spec| IndexSummary {
                    field: spec.field.clone(),
                    direction: spec.direction,
                    unique: spec.unique,
                })
                .collect(),
            checksum: model.checksum.clone(),
            registered_at: model.registered_at,
        }
    }
}

pub async fn list_models(
    State((db, _)): State<(Arc<Db>, Instant)>,
) -> Json<Vec<ModelSummary>> {
    let models = db
        .models()
        .models()
        .iter()
        .map(|model| ModelSummary::from(model.as_ref()))
        .collect();

    Json(models)
}

pub async fn get_model(
    State((db, _)): State<(Arc<Db>, Instant)>,
    Path(name): Path<String>,
) -> Result<Json<ModelDetail>> {
    let model = db
        .model(&name)
        .ok_or(AutoloadError::ModelNotFound { name })?;

    Ok(Json(ModelDetail {
        summary: ModelSummary::from(model.as_ref()),
        validator: Bson::Document(model.validator()).into_relaxed_extjson(),
    }))
}
