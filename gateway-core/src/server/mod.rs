//! The boundary adapters: the inbound HTTP handler that drives a request through C2 → C5 → C3 →
//! C4, and the internal admin-mutation-hook receiver.

pub mod handler;
pub mod internal;

use std::collections::HashMap;

use serde_json::Value;

use crate::model::RouteMethod;

/// The request as seen at the edge, normalized into the shape the shaping engine expects.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: RouteMethod,
    pub path_params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Value,
    pub client_ip: String,
    pub user_agent: String,
    pub request_id: String,
    pub current_user: Option<String>,
}
