//! gRPC leg of the protocol dispatch seam. The wire method is resolved against a descriptor set
//! the admin surface stores per upstream (produced ahead of time by
//! `protoc --descriptor_set_out --include_imports`), not a live reflection RPC — `tonic-reflection`
//! ships no client, only the server side that exposes a gateway's own descriptors, so there is no
//! off-the-shelf way to pull a backend's schema at connect time. Keeping the descriptor with the
//! upstream config gets the same result a dynamic gateway needs: routes authored against arbitrary
//! backends without generating or linking Rust types for their proto.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Buf;
use dashmap::DashMap;
use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor};
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::transport::Channel;
use tokio_util::sync::CancellationToken;

use super::protocol::{DispatchResponse, ProtocolDispatcher};
use crate::error::DispatchError;
use crate::model::UpstreamConfig;
use crate::shaping::UpstreamRequest;

struct CachedChannel {
    channel: Channel,
    descriptors: DescriptorPool,
}

pub struct GrpcDispatcher {
    channels: DashMap<String, Arc<CachedChannel>>,
}

impl GrpcDispatcher {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    async fn channel_for(&self, upstream: &UpstreamConfig) -> Result<Arc<CachedChannel>, DispatchError> {
        if let Some(existing) = self.channels.get(&upstream.id) {
            return Ok(existing.clone());
        }
        let channel = Channel::from_shared(upstream.base_url.clone())
            .map_err(|e| DispatchError::Internal(e.to_string()))?
            .connect()
            .await
            .map_err(|e| DispatchError::UpstreamUnavailable(e.to_string()))?;

        let descriptors = load_descriptor_pool(upstream).map_err(DispatchError::Internal)?;

        let cached = Arc::new(CachedChannel { channel, descriptors });
        self.channels.insert(upstream.id.clone(), cached.clone());
        Ok(cached)
    }
}

impl Default for GrpcDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes the upstream's stored `FileDescriptorSet` into a queryable pool. Authored once per
/// upstream (base64, so it fits the same JSON-column catalog every other config lives in) rather
/// than fetched live, since there is no real reflection client to fetch it with.
fn load_descriptor_pool(upstream: &UpstreamConfig) -> Result<DescriptorPool, String> {
    let encoded = upstream
        .grpc_descriptor_set
        .as_ref()
        .ok_or_else(|| "grpc upstream missing grpc_descriptor_set".to_string())?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| format!("grpc_descriptor_set is not valid base64: {e}"))?;
    DescriptorPool::decode(bytes.as_slice()).map_err(|e| format!("invalid FileDescriptorSet: {e}"))
}

/// A `tonic::codec::Codec` over `prost_reflect::DynamicMessage`. `tonic::codec::ProstCodec` can't
/// be reused here: it requires `Self::Decode: Default`, and `DynamicMessage` can't implement
/// `Default` without a descriptor to build an empty message from. The decoder instead carries the
/// method's output descriptor explicitly.
#[derive(Clone)]
struct DynamicCodec {
    output: MessageDescriptor,
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;
    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder {
            output: self.output.clone(),
        }
    }
}

struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = tonic::Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode(dst)
            .map_err(|e| tonic::Status::internal(format!("failed to encode grpc request: {e}")))
    }
}

struct DynamicDecoder {
    output: MessageDescriptor,
}

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = tonic::Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        if !src.has_remaining() {
            return Ok(None);
        }
        let message = DynamicMessage::decode(self.output.clone(), src)
            .map_err(|e| tonic::Status::internal(format!("failed to decode grpc response: {e}")))?;
        Ok(Some(message))
    }
}

#[async_trait]
impl ProtocolDispatcher for GrpcDispatcher {
    async fn invoke(
        &self,
        upstream: &UpstreamConfig,
        request: &UpstreamRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<DispatchResponse, DispatchError> {
        let cached = self.channel_for(upstream).await?;

        let service = upstream
            .grpc_service
            .as_ref()
            .ok_or_else(|| DispatchError::Internal("grpc upstream missing grpc_service".to_string()))?;
        let method_name = request
            .url
            .rsplit('/')
            .next()
            .ok_or_else(|| DispatchError::Internal("grpc route missing method segment".to_string()))?;

        let method_desc = cached
            .descriptors
            .get_service_by_name(service)
            .and_then(|svc| svc.methods().find(|m| m.name() == method_name))
            .ok_or_else(|| DispatchError::Internal(format!("unknown grpc method {service}/{method_name}")))?;

        let input = DynamicMessage::deserialize(method_desc.input(), request.body.clone())
            .map_err(|e| DispatchError::Internal(format!("request body doesn't match {method_name}'s input message: {e}")))?;

        let path = format!("/{service}/{method_name}");
        let codec = DynamicCodec { output: method_desc.output() };
        let mut grpc_client = tonic::client::Grpc::new(cached.channel.clone());

        let call_fut = grpc_client.unary(
            tonic::Request::new(input),
            path.parse().map_err(|_| DispatchError::Internal("invalid grpc path".to_string()))?,
            codec,
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DispatchError::Canceled),
            result = tokio::time::timeout(timeout, call_fut) => result,
        };

        let response = match response {
            Ok(Ok(r)) => r,
            Ok(Err(status)) => {
                return Err(DispatchError::UpstreamStatus {
                    status: 200,
                    body: status.message().as_bytes().to_vec(),
                })
            }
            Err(_) => return Err(DispatchError::UpstreamTimeout),
        };

        let message = response.into_inner();
        let json_body = serde_json::to_vec(&message).unwrap_or_default();

        Ok(DispatchResponse {
            status: 200,
            body: json_body,
            headers: HashMap::new(),
        })
    }
}
