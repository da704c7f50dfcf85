pub mod modules;
pub mod schema;
pub mod shared;

use std::sync::Arc;

use modules::catalog::{
    application::{CatalogResolver, ResolverConfig, ScheduleConfig, ScheduleEngine},
    domain::{CacheStore, CatalogStore},
    infrastructure::{MemoryCacheStore, MemoryCatalogStore, PgCatalogStore},
};
use modules::provider::{JikanProvider, MetadataProvider};
use shared::{errors::AppResult, utils::logger, CatalogConfig, Database};

/// Wired resolution layer handed to request handlers
pub struct CatalogServices {
    pub resolver: Arc<CatalogResolver>,
    pub schedule: Arc<ScheduleEngine>,
    pub store: Arc<dyn CatalogStore>,
    pub cache: Arc<dyn CacheStore>,
}

impl CatalogServices {
    /// Load `.env`, start logging and build the services from the environment
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        logger::init_logger();
        let config = CatalogConfig::from_env()?;
        Self::build(&config)
    }

    /// Postgres-backed store when a database URL is configured, in-memory
    /// store otherwise. A configured but unreachable database is an error.
    pub fn build(config: &CatalogConfig) -> AppResult<Self> {
        let store: Arc<dyn CatalogStore> = match config.database_url.as_deref() {
            Some(url) => {
                let database = Arc::new(Database::connect(url)?);
                database.run_migrations()?;
                log::info!("Catalog store: PostgreSQL");
                Arc::new(PgCatalogStore::new(database))
            }
            None => {
                log::warn!("DATABASE_URL not set, catalog store is in-memory and will not persist");
                Arc::new(MemoryCatalogStore::new())
            }
        };

        let provider: Arc<dyn MetadataProvider> = Arc::new(JikanProvider::from_config(config)?);
        Ok(Self::with_components(config, store, provider))
    }

    /// Assemble from explicit components (tests, alternative stores)
    pub fn with_components(
        config: &CatalogConfig,
        store: Arc<dyn CatalogStore>,
        provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(config.cache_max_entries));

        let resolver = Arc::new(CatalogResolver::new(
            Arc::clone(&cache),
            Arc::clone(&store),
            provider,
            ResolverConfig::from(config),
        ));
        let schedule = Arc::new(ScheduleEngine::new(
            Arc::clone(&store),
            ScheduleConfig::from(config),
        ));

        log::info!(
            "Catalog services ready (cache capacity {}, upstream timeout {:?})",
            config.cache_max_entries,
            config.upstream_timeout
        );

        Self {
            resolver,
            schedule,
            store,
            cache,
        }
    }
}
