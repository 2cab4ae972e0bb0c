//! The process-wide, `Arc`-shared state assembled once at startup and handed to `actix-web` as
//! app data. Nothing here is a global singleton; a fresh `AppState` could be constructed per test.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::catalog::SqliteCatalogLoader;
use crate::config::RuntimeConfig;
use crate::dispatch::pool::HttpConnectionPool;
use crate::dispatch::DispatchRuntime;
use crate::registry::Registry;
use crate::shaping::ShapingEngine;

pub struct AppState {
    pub registry: Registry,
    pub cache: ResponseCache,
    pub shaping: ShapingEngine,
    pub dispatch: DispatchRuntime,
    pub catalog: SqliteCatalogLoader,
    pub config: RuntimeConfig,
}

impl AppState {
    pub fn new(config: RuntimeConfig, catalog: SqliteCatalogLoader) -> Arc<Self> {
        let pool = Arc::new(HttpConnectionPool::new(config.pool_idle_per_host, config.pool_idle_timeout));
        Arc::new(Self {
            registry: Registry::new(),
            cache: ResponseCache::new(config.cache_capacity, Duration::from_secs(config.cache_default_ttl_seconds)),
            shaping: ShapingEngine::new(),
            dispatch: DispatchRuntime::new(pool, config.breaker),
            catalog,
            config,
        })
    }
}
