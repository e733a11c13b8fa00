use crate::registry::Model;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Outcome of [`ModelRegistry::insert_if_absent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyExists,
}

/// Name -> model map. A name is registered at most once; later inserts are no-ops.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: DashMap<String, Arc<Model>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_if_absent(&self, model: Model) -> Registration {
        match self.models.entry(model.name.clone()) {
            Entry::Occupied(_) => Registration::AlreadyExists,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(model));
                Registration::Created
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Model>> {
        self.models.get(name).map(|entry| entry.value().clone())
    }

    /// Registered model names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// All models, sorted by name
    pub fn models(&self) -> Vec<Arc<Model>> {
        let mut models: Vec<Arc<Model>> = self.models.iter().map(|e| e.value().clone()).collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
