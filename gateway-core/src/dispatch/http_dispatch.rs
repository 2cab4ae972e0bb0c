//! HTTP leg of the protocol dispatch seam, backed by the pooled `reqwest::Client`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::pool::{HttpConnectionPool, PoolKey};
use super::protocol::{DispatchResponse, ProtocolDispatcher};
use crate::error::DispatchError;
use crate::model::{RouteMethod, UpstreamConfig};
use crate::shaping::UpstreamRequest;

pub struct HttpDispatcher {
    pool: Arc<HttpConnectionPool>,
}

impl HttpDispatcher {
    pub fn new(pool: Arc<HttpConnectionPool>) -> Self {
        Self { pool }
    }
}

fn to_reqwest_method(method: RouteMethod) -> Method {
    match method {
        RouteMethod::Get => Method::GET,
        RouteMethod::Post => Method::POST,
        RouteMethod::Put => Method::PUT,
        RouteMethod::Patch => Method::PATCH,
        RouteMethod::Delete => Method::DELETE,
        RouteMethod::Head => Method::HEAD,
        RouteMethod::Options => Method::OPTIONS,
        RouteMethod::Grpc => Method::POST,
    }
}

#[async_trait]
impl ProtocolDispatcher for HttpDispatcher {
    async fn invoke(
        &self,
        upstream: &UpstreamConfig,
        request: &UpstreamRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, DispatchError> {
        let key = PoolKey {
            base_url: upstream.base_url.clone(),
            tls_enabled: upstream.tls_enabled,
        };
        let client = self.pool.get_or_create(&key);

        let mut builder = client
            .request(to_reqwest_method(request.method), &request.url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_null() {
            builder = builder.json(&request.body);
        }

        let send_fut = builder.send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DispatchError::Canceled),
            result = send_fut => result,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(DispatchError::UpstreamTimeout),
            Err(e) => return Err(DispatchError::UpstreamUnavailable(e.to_string())),
        };

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body_fut = response.bytes();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DispatchError::Canceled),
            result = body_fut => result,
        };
        let body = body
            .map_err(|e| DispatchError::UpstreamUnavailable(e.to_string()))?
            .to_vec();

        Ok(DispatchResponse { status, body, headers })
    }
}
