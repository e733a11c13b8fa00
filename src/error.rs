use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoloadError {
    /// Driver error from connecting or pinging, passed through untouched.
    #[error(transparent)]
    Connection(#[from] mongodb::error::Error),

    #[error("Schema folder not found: {}. Please create the folder and add your model schemas.", path.display())]
    SchemaFolderNotFound { path: PathBuf },

    #[error("Schema folder {} could not be read: {source}", path.display())]
    SchemaFolderUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server already has a '{key}' capability attached")]
    CapabilityAlreadyAttached { key: &'static str },

    #[error("Server has no '{key}' capability attached")]
    CapabilityMissing { key: &'static str },

    #[error("Model not found: {name}")]
    ModelNotFound { name: String },

    #[error("Database operation failed: {cause}")]
    Database { cause: String },
}

/// Per-file failures while loading a schema module. Never fatal to the scan.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing {missing} export")]
    MissingExport { missing: &'static str },

    #[error("invalid schema for field '{field}': {reason}")]
    InvalidSchema { field: String, reason: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AutoloadError {
    fn code(&self) -> &'static str {
        match self {
            AutoloadError::Connection(_) => "connection_failed",
            AutoloadError::SchemaFolderNotFound { .. } => "schema_folder_not_found",
            AutoloadError::SchemaFolderUnreadable { .. } => "schema_folder_unreadable",
            AutoloadError::CapabilityAlreadyAttached { .. } => "capability_already_attached",
            AutoloadError::CapabilityMissing { .. } => "capability_missing",
            AutoloadError::ModelNotFound { .. } => "model_not_found",
            AutoloadError::Database { .. } => "database_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AutoloadError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            AutoloadError::Connection(_) | AutoloadError::Database { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AutoloadError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AutoloadError>;
