//! Process configuration. The small set of scalars the teacher already manages through
//! `mini-config`'s enum-keyed store is kept that way; everything else (pool sizes, breaker
//! thresholds, cache TTLs, retry caps) is assembled once at startup from environment variables
//! with documented defaults.

use std::time::Duration;

use mini_config::Configure;

use crate::dispatch::breaker::BreakerConfig;

#[derive(Debug, Clone, Configure)]
pub enum Core {
    TCPAddress,
    SQLitePath,
}

pub fn init() {
    Core::TCPAddress.set("0.0.0.0:8080");
    Core::SQLitePath.set("/tmp/gwrs/data/core");
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub pool_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub breaker: BreakerConfig,
    pub health_interval: Duration,
    pub cache_capacity: usize,
    pub cache_default_ttl_seconds: u64,
    pub catalog_refresh_interval: Duration,
    pub admin_prefix: String,
    pub internal_bind: String,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            pool_idle_per_host: env_or("GATEWAY_POOL_IDLE_PER_HOST", 32usize),
            pool_idle_timeout: Duration::from_secs(env_or("GATEWAY_POOL_IDLE_TIMEOUT_SECONDS", 90u64)),
            breaker: BreakerConfig {
                failure_threshold: env_or("GATEWAY_BREAKER_FAILURE_THRESHOLD", 5u32),
                open_timeout: Duration::from_secs(env_or("GATEWAY_BREAKER_OPEN_TIMEOUT_SECONDS", 30u64)),
                max_half_open: env_or("GATEWAY_BREAKER_MAX_HALF_OPEN", 3u32),
                success_threshold: env_or("GATEWAY_BREAKER_SUCCESS_THRESHOLD", 3u32),
            },
            health_interval: Duration::from_secs(env_or("GATEWAY_HEALTH_INTERVAL_SECONDS", 15u64)),
            cache_capacity: env_or("GATEWAY_CACHE_CAPACITY", 10_000usize),
            cache_default_ttl_seconds: env_or("GATEWAY_CACHE_DEFAULT_TTL_SECONDS", 60u64),
            catalog_refresh_interval: Duration::from_secs(env_or("GATEWAY_CATALOG_REFRESH_SECONDS", 30u64)),
            admin_prefix: std::env::var("GATEWAY_ADMIN_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
            internal_bind: std::env::var("GATEWAY_INTERNAL_BIND").unwrap_or_else(|_| "127.0.0.1:8081".to_string()),
        }
    }
}
