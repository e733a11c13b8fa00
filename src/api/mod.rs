mod health;
mod models;

pub use health::health_check;
pub use models::{get_model, list_models};
