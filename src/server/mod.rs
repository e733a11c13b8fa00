//! Server host
//!
//! Holds the capability slot the autoloader fills and builds the HTTP router
//! around it.

use crate::api::{get_model, health_check, list_models};
use crate::db::Db;
use crate::error::{AutoloadError, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Key under which the connected database handle is exposed
pub const DB_CAPABILITY: &str = "db";

pub struct Server {
    db: Option<Arc<Db>>,
    started_at: Instant,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    pub fn new() -> Self {
        Self {
            db: None,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn ensure_db_slot_free(&self) -> Result<()> {
        if self.db.is_some() {
            return Err(AutoloadError::CapabilityAlreadyAttached { key: DB_CAPABILITY });
        }
        Ok(())
    }

    /// Attach the database handle. The slot can be filled once.
    pub fn decorate_db(&mut self, db: Db) -> Result<()> {
        self.ensure_db_slot_free()?;
        self.db = Some(Arc::new(db));
        debug!("Decorated server with '{}' capability", DB_CAPABILITY);
        Ok(())
    }

    pub fn db(&self) -> Option<Arc<Db>> {
        self.db.clone()
    }

    pub fn has_db(&self) -> bool {
        self.db.is_some()
    }

    /// Build the HTTP router over the attached database handle
    pub fn router(&self) -> Result<Router> {
        let db = self.db().ok_or(AutoloadError::CapabilityMissing { key: DB_CAPABILITY })?;

        let app = Router::new()
            .route("/health", get(health_check))
            .route("/models", get(list_models))
            .route("/models/:name", get(get_model))
            .layer(TraceLayer::new_for_http())
            .with_state((db, self.started_at));

        Ok(app)
    }
}
