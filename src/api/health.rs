use crate::db::Db;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: String,
    connected: bool,
    models: usize,
    uptime_seconds: u64,
}

pub async fn health_check(
    State((db, start_time)): State<(Arc<Db>, Instant)>,
) -> Json<HealthResponse> {
    let connected = db.ping().await.is_ok();

    Json(HealthResponse {
        status: if connected {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        database: db.name().to_string(),
        connected,
        models: db.models().len(),
        uptime_seconds: start_time.elapsed().as_secs(),
    })
}
