//! The tagged-dispatch seam: one trait, two implementations, so the runtime never branches on
//! protocol itself.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::model::UpstreamConfig;
use crate::shaping::UpstreamRequest;

pub struct DispatchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

#[async_trait]
pub trait ProtocolDispatcher: Send + Sync {
    async fn invoke(
        &self,
        upstream: &UpstreamConfig,
        request: &UpstreamRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, DispatchError>;
}
