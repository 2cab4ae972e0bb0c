//! Shared data model for the route catalog: the types the registry, the shaping engine,
//! and the SQLite catalog loader all agree on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The HTTP verb a route is bound to, or the gRPC marker.
///
/// Kept as an enum rather than a bare string so "is this an HTTP route or a gRPC route" is a
/// type-level fact instead of a naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Not an HTTP verb; the route dispatches over gRPC instead.
    Grpc,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Patch => "PATCH",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Head => "HEAD",
            RouteMethod::Options => "OPTIONS",
            RouteMethod::Grpc => "GRPC",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "GRPC" => Some(Self::Grpc),
            _ => None,
        }
    }

    /// The trie bucket a route is actually dispatched under. gRPC rides HTTP/2 POST framing on
    /// the wire, so a route authored with `Grpc` here would never match an inbound request's
    /// method (which is always a real HTTP verb) if it were keyed literally — it's normalized
    /// into the `Post` bucket instead. `RouteConfig::protocol` is the independent axis that
    /// actually selects the gRPC dispatcher; this method exists only to make route lookup agree
    /// with it.
    pub fn dispatch_bucket(self) -> Self {
        match self {
            RouteMethod::Grpc => RouteMethod::Post,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Grpc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Date,
    Null,
}

impl Default for DataType {
    fn default() -> Self {
        DataType::String
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    None,
    Base64,
    BasicAuth,
    Urlencode,
    Jwt,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::None
    }
}

/// Per-type validation rules carried on a [`VariableSpec`]. Every field is optional; only the
/// ones relevant to the variable's `data_type` are expected to be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub min_items: Option<usize>,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub url: bool,
    #[serde(default)]
    pub uuid: bool,
    #[serde(default)]
    pub date: bool,
    #[serde(default)]
    pub ip: bool,
    #[serde(default)]
    pub numeric: bool,
    #[serde(default)]
    pub alpha: bool,
    #[serde(default)]
    pub alphanumeric: bool,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub one_of: Option<Vec<String>>,
}

/// The binding contract for one `{{name}}` template placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    /// A literal value or a template expression. Empty string means "bind from the inbound
    /// request at the position this variable is referenced".
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub validations: ValidationRules,
    #[serde(default)]
    pub validation_messages: HashMap<String, String>,
    #[serde(default)]
    pub custom_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyPlacement {
    Header,
    Query,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpstreamAuth {
    None,
    Basic { user: String, pass: String },
    Bearer { token: String },
    ApiKey {
        key: String,
        value: String,
        placement: ApiKeyPlacement,
    },
}

impl Default for UpstreamAuth {
    fn default() -> Self {
        UpstreamAuth::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub id: String,
    pub name: String,
    pub protocol: Protocol,
    pub base_url: String,
    pub tls_enabled: bool,
    #[serde(default)]
    pub grpc_service: Option<String>,
    /// Base64-encoded `FileDescriptorSet` (as produced by `protoc --descriptor_set_out
    /// --include_imports`) for the service named in `grpc_service`. Authored once per upstream so
    /// the gRPC dispatcher never needs compiled Rust types for the backend's proto — the dynamic
    /// message shape comes from this descriptor instead of a live reflection call.
    #[serde(default)]
    pub grpc_descriptor_set: Option<String>,
    #[serde(default)]
    pub auth: UpstreamAuth,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    #[serde(default)]
    pub methods: Vec<RouteMethod>,
}

/// A single dispatchable route, as authored by the admin surface and consumed by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub slug: String,
    pub method: RouteMethod,
    /// `/`-separated path template; segments are literal, `{name}` parameters, or `*` wildcard.
    pub uri: String,
    pub protocol: Protocol,
    pub upstream_id: String,
    #[serde(default)]
    pub headers: serde_json::Value,
    #[serde(default)]
    pub query: serde_json::Value,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub variables: HashMap<String, VariableSpec>,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    #[serde(default)]
    pub response_manipulation: Option<String>,
    #[serde(default)]
    pub cache: CachePolicy,
}

impl RouteConfig {
    pub fn max_retries_clamped(&self) -> u32 {
        self.max_retries.min(10)
    }

    pub fn retry_delay_clamped(&self) -> u64 {
        self.retry_delay_seconds.min(300)
    }
}
