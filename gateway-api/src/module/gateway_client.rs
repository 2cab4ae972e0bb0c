//! Thin client for the internal refresh hooks `gateway-core` exposes. After this process mutates
//! the catalog, it calls one of these so the in-memory registry and response cache converge
//! without a restart. A failed notification is logged and swallowed — the periodic catalog
//! refresh `gateway-core` runs on its own will eventually pick up the change.

use crate::config::Api;
use mini_config::Configure;

fn core_base_url() -> String {
    Api::CoreInternalUrl
        .get::<String>()
        .unwrap_or_else(|| "http://127.0.0.1:8081".to_string())
}

/// Notifies the gateway core that a single route's upstream changed and its cached entries
/// should be invalidated.
pub async fn notify_refresh_one(slug: &str) {
    let url = format!("{}/internal/refresh/{}", core_base_url(), slug);
    if let Err(e) = reqwest::Client::new().post(&url).send().await {
        log::warn!("failed to notify gateway core of refresh for '{}': {}", slug, e);
    }
}

/// Notifies the gateway core that the whole catalog should be reloaded. Used after upstream
/// mutations, since a single upstream can back many routes.
pub async fn notify_refresh_all() {
    let url = format!("{}/internal/refresh-all", core_base_url());
    if let Err(e) = reqwest::Client::new().post(&url).send().await {
        log::warn!("failed to notify gateway core of a full refresh: {}", e);
    }
}
