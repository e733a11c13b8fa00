use crate::error::{AutoloadError, Result};
use crate::registry::{Model, ModelRegistry};
use bson::{doc, Document};
use mongodb::{Client, Collection, Database, IndexModel};
use std::sync::Arc;
use tracing::{info, warn};

/// Connected client plus the models registered against it
#[derive(Debug, Clone)]
pub struct Db {
    client: Client,
    database: Database,
    models: Arc<ModelRegistry>,
}

impl Db {
    pub fn new(client: Client, dbname: &str, models: Arc<ModelRegistry>) -> Self {
        let database = client.database(dbname);
        Self {
            client,
            database,
            models,
        }
    }

    /// Get the raw MongoDB client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn name(&self) -> &str {
        self.database.name()
    }

    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<Arc<Model>> {
        self.models.get(name)
    }

    /// Collection backing a registered model
    pub fn collection(&self, model: &str) -> Result<Collection<Document>> {
        let model = self.model(model).ok_or_else(|| AutoloadError::ModelNotFound {
            name: model.to_string(),
        })?;
        Ok(self.database.collection::<Document>(&model.collection))
    }

    pub async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AutoloadError::Database {
                cause: format!("Ping failed: {}", e),
            })?;
        Ok(())
    }

    /// Create the indexes declared by every registered model's schema.
    /// Returns the number of index specifications applied.
    pub async fn sync_indexes(&self) -> Result<usize> {
        let mut applied = 0;

        for model in self.models.models() {
            if model.indexes.is_empty() {
                continue;
            }

            let indexes: Vec<IndexModel> = model.indexes.iter().map(|spec| spec.to_index_model()).collect();
            let count = indexes.len();

            self.database
                .collection::<Document>(&model.collection)
                .create_indexes(indexes)
                .await
                .map_err(|e| {
                    warn!("Index creation failed for model {}: {}", model.name, e);
                    AutoloadError::Database {
                        cause: format!("Failed to create indexes for {}: {}", model.name, e),
                    }
                })?;

            info!("Synced {} index(es) on {} for model {}", count, model.collection, model.name);
            applied += count;
        }

        Ok(applied)
    }
}
