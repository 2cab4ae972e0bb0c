//! Connection pool keyed by `(base_url, tls_enabled)`. HTTP handles are `reqwest::Client`s;
//! gRPC handles are lazily-opened `tonic` channels. Both clone cheaply and share their
//! underlying connection pool, so the value stored here is the cheap handle, not a raw socket.

use std::time::Duration;

use dashmap::DashMap;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct PoolKey {
    pub base_url: String,
    pub tls_enabled: bool,
}

pub struct HttpConnectionPool {
    clients: DashMap<PoolKey, reqwest::Client>,
    idle_per_host: usize,
    idle_timeout: Duration,
}

impl HttpConnectionPool {
    pub fn new(idle_per_host: usize, idle_timeout: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            idle_per_host,
            idle_timeout,
        }
    }

    pub fn get_or_create(&self, key: &PoolKey) -> reqwest::Client {
        if let Some(existing) = self.clients.get(key) {
            return existing.clone();
        }
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(self.idle_per_host)
            .pool_idle_timeout(self.idle_timeout)
            .tcp_keepalive(Duration::from_secs(60));
        if key.tls_enabled {
            builder = builder.min_tls_version(reqwest::tls::Version::TLS_1_2);
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());
        self.clients.insert(key.clone(), client.clone());
        client
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}
