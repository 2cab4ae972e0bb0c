//! # Upstream Data Models
//!
//! The admin-surface view of an upstream backend: the named target a route dispatches to.
//! Mirrors the shape `gateway-core` loads from the same `upstream_configs` table, expressed as
//! its own types since the two binaries don't share a library crate — the JSON columns are the
//! contract between them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Grpc,
}

impl ToString for Protocol {
    fn to_string(&self) -> String {
        match self {
            Protocol::Http => "http".to_string(),
            Protocol::Grpc => "grpc".to_string(),
        }
    }
}

impl From<String> for Protocol {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "grpc" => Protocol::Grpc,
            _ => Protocol::Http,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyPlacement {
    Header,
    Query,
}

/// The auth scheme the gateway attaches to requests forwarded to this upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpstreamAuth {
    None,
    Basic { user: String, pass: String },
    Bearer { token: String },
    ApiKey { key: String, value: String, placement: ApiKeyPlacement },
}

impl Default for UpstreamAuth {
    fn default() -> Self {
        UpstreamAuth::None
    }
}

/// A named backend a route can dispatch to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub id: String,
    pub name: String,
    pub protocol: Protocol,
    pub base_url: String,
    pub tls_enabled: bool,
    #[serde(default)]
    pub grpc_service: Option<String>,
    /// Base64-encoded `FileDescriptorSet` for `grpc_service`, produced by
    /// `protoc --descriptor_set_out --include_imports`. Required for a gRPC upstream to be
    /// dispatchable — `gateway-core` has no other way to learn the service's message shape.
    #[serde(default)]
    pub grpc_descriptor_set: Option<String>,
    #[serde(default)]
    pub auth: UpstreamAuth,
    pub is_active: bool,
}

/// Request DTO for creating or replacing an upstream. An absent `id` means "create new".
#[derive(Debug, Deserialize)]
pub struct UpstreamRequest {
    pub id: Option<String>,
    pub name: String,
    pub protocol: Protocol,
    pub base_url: String,
    #[serde(default)]
    pub tls_enabled: bool,
    #[serde(default)]
    pub grpc_service: Option<String>,
    #[serde(default)]
    pub grpc_descriptor_set: Option<String>,
    #[serde(default)]
    pub auth: UpstreamAuth,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: String,
}
