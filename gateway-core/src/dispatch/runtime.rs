//! C4: the dispatch runtime. Ties the connection pool, circuit breaker, health monitor, and
//! retry loop together behind one entry point: [`DispatchRuntime::dispatch`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use super::breaker::{Admission, BreakerConfig, CircuitBreaker};
use super::grpc_dispatch::GrpcDispatcher;
use super::health::HealthMonitor;
use super::http_dispatch::HttpDispatcher;
use super::pool::HttpConnectionPool;
use super::protocol::{DispatchResponse, ProtocolDispatcher};
use crate::error::DispatchError;
use crate::model::{Protocol, UpstreamConfig};
use crate::shaping::UpstreamRequest;

pub struct DispatchRuntime {
    http: HttpDispatcher,
    grpc: GrpcDispatcher,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    breaker_config: BreakerConfig,
    pub health: Arc<HealthMonitor>,
}

impl DispatchRuntime {
    pub fn new(pool: Arc<HttpConnectionPool>, breaker_config: BreakerConfig) -> Self {
        Self {
            http: HttpDispatcher::new(pool),
            grpc: GrpcDispatcher::new(),
            breakers: RwLock::new(HashMap::new()),
            breaker_config,
            health: Arc::new(HealthMonitor::new()),
        }
    }

    fn breaker_for(&self, base_url: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.read().get(base_url) {
            return existing.clone();
        }
        let mut write = self.breakers.write();
        write
            .entry(base_url.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.breaker_config)))
            .clone()
    }

    /// Dispatches `request` to `upstream`, retrying on transport errors and 5xx up to
    /// `request.max_retries` times with exponential backoff, honoring `cancel` throughout.
    pub async fn dispatch(
        &self,
        upstream: &UpstreamConfig,
        request: &UpstreamRequest,
        cancel: CancellationToken,
    ) -> Result<DispatchResponse, DispatchError> {
        let breaker = self.breaker_for(&upstream.base_url);
        let deadline = Instant::now() + request.timeout;

        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(DispatchError::Canceled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DispatchError::UpstreamTimeout);
            }

            if breaker.allow() == Admission::Denied {
                return Err(DispatchError::CircuitOpen(upstream.base_url.clone()));
            }

            let dispatcher: &dyn ProtocolDispatcher = match upstream.protocol {
                Protocol::Http => &self.http,
                Protocol::Grpc => &self.grpc,
            };

            let per_attempt_timeout = remaining.min(request.timeout);
            let result = dispatcher.invoke(upstream, request, per_attempt_timeout, &cancel).await;

            let (outcome_success, retryable) = match &result {
                Ok(resp) if resp.status < 500 => (true, false),
                Ok(_) => (false, true),
                Err(DispatchError::Canceled) => (false, false),
                Err(DispatchError::CircuitOpen(_)) => (false, false),
                Err(_) => (false, true),
            };
            breaker.record_outcome(outcome_success);

            if outcome_success || !retryable {
                return result;
            }

            if attempt >= request.max_retries {
                return result;
            }

            let backoff = request.retry_delay.saturating_mul(2u32.saturating_pow(attempt));
            let backoff = backoff.min(Duration::from_secs(30)).min(deadline.saturating_duration_since(Instant::now()));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DispatchError::Canceled),
                _ = tokio::time::sleep(backoff) => {}
            }
            attempt += 1;
        }
    }
}
