//! # Route Data Models
//!
//! The admin-surface view of a dispatchable route, mirroring the `route_configs` table the
//! gateway core's registry loads from. Flexible fields (templates, variable specs, cache policy)
//! round-trip as JSON text columns, same as the upstream side.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use crate::api::upstreams::models::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Grpc,
}

impl ToString for RouteMethod {
    fn to_string(&self) -> String {
        match self {
            RouteMethod::Get => "GET".to_string(),
            RouteMethod::Post => "POST".to_string(),
            RouteMethod::Put => "PUT".to_string(),
            RouteMethod::Patch => "PATCH".to_string(),
            RouteMethod::Delete => "DELETE".to_string(),
            RouteMethod::Head => "HEAD".to_string(),
            RouteMethod::Options => "OPTIONS".to_string(),
            RouteMethod::Grpc => "GRPC".to_string(),
        }
    }
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
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableSpec {
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    #[serde(default)]
    pub methods: Vec<RouteMethod>,
}

/// A single dispatchable route as authored through the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub slug: String,
    pub method: RouteMethod,
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

/// Request DTO for creating or replacing a route. `slug` doubles as the primary key — saving an
/// existing slug replaces the record atomically, matching the registry's install-on-refresh
/// lifecycle.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub slug: String,
    pub method: RouteMethod,
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
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub retry_delay_seconds: u64,
    #[serde(default)]
    pub response_manipulation: Option<String>,
    #[serde(default)]
    pub cache: CachePolicy,
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub slug: String,
}
