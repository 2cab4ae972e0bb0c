//! Periodic, advisory health probing. The circuit breaker remains authoritative for fast-fail;
//! this monitor only informs admission hints and diagnostics.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
    Unknown,
}

pub struct HealthMonitor {
    client: reqwest::Client,
    status: RwLock<HashMap<String, HealthStatus>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            status: RwLock::new(HashMap::new()),
        }
    }

    pub fn status_of(&self, base_url: &str) -> HealthStatus {
        self.status.read().get(base_url).copied().unwrap_or(HealthStatus::Unknown)
    }

    async fn probe_http(&self, base_url: &str) -> HealthStatus {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        match tokio::time::timeout(Duration::from_secs(5), self.client.get(&url).send()).await {
            Ok(Ok(resp)) if resp.status().is_success() => HealthStatus::Healthy,
            Ok(Ok(_)) => HealthStatus::Degraded,
            Ok(Err(_)) | Err(_) => HealthStatus::Unhealthy,
        }
    }

    /// Spawns the periodic probe loop. Returns a handle the caller can abort on shutdown.
    pub fn spawn(self: Arc<Self>, targets: Vec<String>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                for base_url in &targets {
                    let status = self.probe_http(base_url).await;
                    self.status.write().insert(base_url.clone(), status);
                }
            }
        })
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
