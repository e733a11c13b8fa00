//! Model Autoloader
//!
//! Connects to MongoDB, registers every model schema found in the configured
//! folder and attaches the connected handle to the server.
//!
//! Connection and missing-folder failures abort the bootstrap. Problems with
//! an individual schema file are logged and the scan moves on.

use crate::config::AutoloadOptions;
use crate::db::{Connect, Db, MongoConnector};
use crate::error::{Result, SchemaLoadError};
use crate::registry::{Model, ModelRegistry, Registration};
use crate::schema::SchemaLoader;
use crate::server::Server;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to a single schema file during the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Created { name: String },
    AlreadyExists { name: String },
    /// Missing `name` or `schema` export
    Malformed { reason: String },
    /// Unreadable file, invalid JSON or invalid schema definition
    Failed { error: String },
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub files: Vec<(PathBuf, FileOutcome)>,
}

impl LoadReport {
    /// Names of the models created by this scan, in scan order
    pub fn created(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                FileOutcome::Created { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn already_existing(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                FileOutcome::AlreadyExists { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Files that were skipped for a malformed export or a load failure
    pub fn skipped(&self) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|(_, outcome)| {
                matches!(outcome, FileOutcome::Malformed { .. } | FileOutcome::Failed { .. })
            })
            .map(|(path, _)| path.as_path())
            .collect()
    }
}

pub struct ModelAutoloader {
    options: AutoloadOptions,
    registry: Arc<ModelRegistry>,
}

impl ModelAutoloader {
    pub fn new(options: AutoloadOptions) -> Self {
        Self {
            options,
            registry: Arc::new(ModelRegistry::new()),
        }
    }

    /// Register into an existing registry instead of a fresh one
    pub fn with_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &AutoloadOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Run the bootstrap against a live MongoDB server
    pub async fn register(&self, server: &mut Server) -> Result<LoadReport> {
        self.register_with(server, &MongoConnector).await
    }

    pub async fn register_with<C>(&self, server: &mut Server, connector: &C) -> Result<LoadReport>
    where
        C: Connect + ?Sized,
    {
        server.ensure_db_slot_free()?;

        let uri = self.options.connection_uri();
        info!("Connecting to MongoDB at {}", self.options.redacted_uri());

        let client = match connector.connect(&uri, &self.options.dbname).await {
            Ok(client) => client,
            Err(e) => {
                error!("Error on MongoDB connection: {}", e);
                return Err(e.into());
            }
        };
        info!("MongoDB connected");

        let db = Db::new(client, &self.options.dbname, self.registry.clone());

        let models_path = self.options.models_path();
        let report = match load_models(&models_path, &self.registry) {
            Ok(report) => report,
            Err(e) => {
                error!("Error on model loading: {}", e);
                return Err(e);
            }
        };

        info!(
            "Model scan of {:?} finished: {} created, {} already registered, {} skipped",
            models_path,
            report.created().len(),
            report.already_existing().len(),
            report.skipped().len()
        );

        server.decorate_db(db)?;
        Ok(report)
    }
}

/// Scan `dir` and register every valid schema file into `registry`.
///
/// Only a missing or unreadable folder is an error; per-file problems are
/// recorded in the report.
pub fn load_models(dir: &Path, registry: &ModelRegistry) -> Result<LoadReport> {
    let loader = SchemaLoader::new(dir);
    let mut report = LoadReport::default();

    for path in loader.discover()? {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = match loader.load(&path) {
            Ok(file) => {
                let name = file.name.clone();
                match registry.insert_if_absent(Model::from_file(file)) {
                    Registration::Created => {
                        info!("Creating {} model", name);
                        FileOutcome::Created { name }
                    }
                    Registration::AlreadyExists => {
                        info!("Model {} already exists, skipping", name);
                        FileOutcome::AlreadyExists { name }
                    }
                }
            }
            Err(SchemaLoadError::MissingExport { missing }) => {
                warn!("Skipping {}: missing {} export", file_name, missing);
                FileOutcome::Malformed {
                    reason: format!("missing {} export", missing),
                }
            }
            Err(e) => {
                error!("Error loading schema from {}: {}", file_name, e);
                FileOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        report.files.push((path, outcome));
    }

    Ok(report)
}
