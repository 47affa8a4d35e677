//! Shared server state.

use crate::config::ServeConfig;
use crate::error::Result;
use fare_model::{FarePipeline, TrackingStore};
use tokio::sync::RwLock;

/// A registered model version held in memory.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// Registered model name
    pub name: String,
    /// Registry version
    pub version: i64,
    /// Fitted pipeline
    pub pipeline: FarePipeline,
}

/// State shared by every handler.
#[derive(Debug, Default)]
pub struct AppState {
    model: RwLock<Option<LoadedModel>>,
}

impl AppState {
    /// State with no model; `/predict` answers 503 until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// State serving `model`.
    pub fn with_model(model: LoadedModel) -> Self {
        Self {
            model: RwLock::new(Some(model)),
        }
    }

    /// Load the version `config.model_alias` points at.
    pub fn from_registry(store: &TrackingStore, config: &ServeConfig) -> Result<Self> {
        let version = store.get_version_by_alias(&config.model_name, &config.model_alias)?;
        let pipeline = store.load_model(&config.model_name, &config.model_alias)?;

        tracing::info!(
            model = %config.model_name,
            version = version.version,
            alias = %config.model_alias,
            "Loaded model"
        );

        Ok(Self::with_model(LoadedModel {
            name: config.model_name.clone(),
            version: version.version,
            pipeline,
        }))
    }

    /// Replace the served model.
    pub async fn set_model(&self, model: LoadedModel) {
        *self.model.write().await = Some(model);
    }

    /// Name and version of the served model.
    pub async fn model_info(&self) -> Option<(String, i64)> {
        self.model
            .read()
            .await
            .as_ref()
            .map(|m| (m.name.clone(), m.version))
    }

    /// Run `f` against the served model, if any.
    pub async fn with_pipeline<T>(&self, f: impl FnOnce(&FarePipeline) -> T) -> Option<T> {
        self.model.read().await.as_ref().map(|m| f(&m.pipeline))
    }
}
