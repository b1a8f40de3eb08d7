use crate::catalog::{MovieCatalog, TmdbClient};
use crate::config::AppConfig;
use crate::storage::{FakeStorage, Storage, StorageClient};
use crate::translate::{DeeplClient, Translator};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = crate::db::connect(&config.database_url).await?;

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_secs))
            .build()?;
        let catalog = Arc::new(TmdbClient::new(http.clone(), &config.tmdb)) as Arc<dyn MovieCatalog>;
        let translator = Arc::new(DeeplClient::new(http, &config.deepl)) as Arc<dyn Translator>;

        Ok(Self {
            db,
            config,
            storage,
            catalog,
            translator,
        })
    }

    /// State whose pool never connects and whose remote clients point at a closed port.
    /// Swap pieces in with the `with_*` builders.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig::for_tests());

        let db = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(500))
            .connect_lazy(&config.database_url)
            .expect("lazy pool ok");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_secs))
            .build()
            .expect("http client ok");

        Self {
            db,
            storage: Arc::new(FakeStorage),
            catalog: Arc::new(TmdbClient::new(http.clone(), &config.tmdb)),
            translator: Arc::new(DeeplClient::new(http, &config.deepl)),
            config,
        }
    }

    pub fn with_db(mut self, db: PgPool) -> Self {
        self.db = db;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageClient>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn MovieCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }
}
