use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::analyzer::service::Analyzer;
use crate::analyzer::AnalyzerClient;
use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::meals::repo::{MealStore, PgMealStore};
use crate::storage::{Storage, StorageClient};

/// Shared application state. The storage gateway, vision analyzer and both
/// stores sit behind narrow trait objects so tests can swap them out.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub analyzer: Arc<dyn AnalyzerClient>,
    pub users: Arc<dyn UserStore>,
    pub meals: Arc<dyn MealStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;
        let analyzer = Arc::new(Analyzer::new(&config.vision)) as Arc<dyn AnalyzerClient>;
        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let meals = Arc::new(PgMealStore::new(db.clone())) as Arc<dyn MealStore>;

        Ok(Self {
            db,
            config,
            storage,
            analyzer,
            users,
            meals,
        })
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        analyzer: Arc<dyn AnalyzerClient>,
        users: Arc<dyn UserStore>,
        meals: Arc<dyn MealStore>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
            analyzer,
            users,
            meals,
        }
    }
}
