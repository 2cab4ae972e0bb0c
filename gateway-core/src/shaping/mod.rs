//! C3: the shaping engine. Converts an inbound request plus a `RouteConfig` into a fully formed
//! upstream request, and optionally rewrites the upstream's response on the way back out.

mod coerce;
mod encode;
pub mod template;
mod validation;
mod variables;

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::ShapingError;
use crate::model::{Protocol, RouteConfig, RouteMethod, UpstreamAuth, UpstreamConfig};
use crate::server::InboundRequest;

/// A fully shaped request ready for dispatch.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: RouteMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Value,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

pub struct ShapingEngine;

impl ShapingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Builds the upstream request. `caller_remaining` is the time left on the caller's overall
    /// deadline; the per-attempt timeout is the smaller of that and the route's own timeout.
    pub fn shape(
        &self,
        route: &RouteConfig,
        upstream: &UpstreamConfig,
        inbound: &InboundRequest,
        caller_remaining: Duration,
    ) -> Result<UpstreamRequest, ShapingError> {
        let ctx = variables::resolve_all(route, inbound)?;

        let url_value = template::substitute(&Value::String(build_url_template(route, inbound)), &ctx);
        let mut url = value_as_string(&url_value);

        let query_value = template::substitute(&route.query, &ctx);
        let query = flatten_to_strings(&query_value);
        if !query.is_empty() {
            let qs = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
                .collect::<Vec<_>>()
                .join("&");
            let sep = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{sep}{qs}");
        }

        let headers_value = template::substitute(&route.headers, &ctx);
        let mut headers = flatten_to_strings(&headers_value);
        apply_upstream_auth(&mut headers, &mut url, &upstream.auth);

        let body = match route.protocol {
            Protocol::Http => {
                let rendered = template::substitute(&route.body, &ctx);
                if is_empty_template(&route.body) {
                    inbound.body.clone()
                } else {
                    merge_json(rendered, inbound.body.clone())
                }
            }
            Protocol::Grpc => template::substitute(&route.body, &ctx),
        };

        let timeout = Duration::from_secs(route.timeout_seconds).min(caller_remaining);

        Ok(UpstreamRequest {
            method: route.method,
            url,
            headers,
            query,
            body,
            timeout,
            max_retries: route.max_retries_clamped(),
            retry_delay: Duration::from_secs(route.retry_delay_clamped()),
        })
    }

    /// Applies `response_manipulation`, if declared, to a decoded JSON response body. Returns the
    /// body untouched when there is no template, the status isn't one the manipulation applies
    /// to, or the body isn't JSON.
    pub fn manipulate_response(
        &self,
        route: &RouteConfig,
        status: u16,
        body: &[u8],
    ) -> Vec<u8> {
        let Some(tmpl) = &route.response_manipulation else {
            return body.to_vec();
        };
        if !matches!(status, 200 | 201) {
            return body.to_vec();
        }
        let Ok(decoded) = serde_json::from_slice::<Value>(body) else {
            return body.to_vec();
        };
        match template::manipulate(tmpl, &decoded) {
            Ok(rewritten) => serde_json::to_vec(&rewritten).unwrap_or_else(|_| body.to_vec()),
            Err(e) => {
                tracing::warn!(slug = %route.slug, error = %e, "response manipulation failed, passing body through");
                body.to_vec()
            }
        }
    }
}

impl Default for ShapingEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn build_url_template(route: &RouteConfig, inbound: &InboundRequest) -> String {
    let mut path = route.uri.clone();
    for (name, value) in &inbound.path_params {
        path = path.replace(&format!("{{{name}}}"), value);
        path = path.replace('*', value);
    }
    path
}

fn value_as_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_to_strings(v: &Value) -> HashMap<String, String> {
    match v {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), value_as_string(v)))
            .collect(),
        _ => HashMap::new(),
    }
}

fn is_empty_template(v: &Value) -> bool {
    matches!(v, Value::Null) || matches!(v, Value::Object(m) if m.is_empty())
}

fn merge_json(template_rendered: Value, inbound_body: Value) -> Value {
    match (template_rendered, inbound_body) {
        (Value::Object(mut t), Value::Object(i)) => {
            for (k, v) in i {
                t.entry(k).or_insert(v);
            }
            Value::Object(t)
        }
        (t, _) => t,
    }
}

fn apply_upstream_auth(headers: &mut HashMap<String, String>, url: &mut String, auth: &UpstreamAuth) {
    match auth {
        UpstreamAuth::None => {}
        UpstreamAuth::Basic { user, pass } => {
            use base64::Engine;
            let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
            headers.insert("Authorization".to_string(), format!("Basic {token}"));
        }
        UpstreamAuth::Bearer { token } => {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        UpstreamAuth::ApiKey { key, value, placement } => match placement {
            crate::model::ApiKeyPlacement::Header => {
                headers.insert(key.clone(), value.clone());
            }
            crate::model::ApiKeyPlacement::Query => {
                let sep = if url.contains('?') { '&' } else { '?' };
                url.push_str(&format!("{sep}{}={}", urlencode(key), urlencode(value)));
            }
        },
    }
}

fn urlencode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CachePolicy, DataType, Encoding, ValidationRules, VariableSpec};
    use std::collections::HashMap as Map;

    fn base_route() -> RouteConfig {
        RouteConfig {
            slug: "get-user".to_string(),
            method: RouteMethod::Get,
            uri: "/users/{id}".to_string(),
            protocol: Protocol::Http,
            upstream_id: "up-1".to_string(),
            headers: serde_json::json!({}),
            query: serde_json::json!({}),
            body: serde_json::json!({}),
            variables: Map::new(),
            timeout_seconds: 10,
            max_retries: 2,
            retry_delay_seconds: 1,
            response_manipulation: None,
            cache: CachePolicy::default(),
        }
    }

    fn base_upstream() -> UpstreamConfig {
        UpstreamConfig {
            id: "up-1".to_string(),
            name: "svc".to_string(),
            protocol: Protocol::Http,
            base_url: "http://backend.local".to_string(),
            tls_enabled: false,
            grpc_service: None,
            grpc_descriptor_set: None,
            auth: UpstreamAuth::None,
            is_active: true,
        }
    }

    fn base_inbound() -> InboundRequest {
        InboundRequest {
            method: RouteMethod::Get,
            path_params: [("id".to_string(), "42".to_string())].into_iter().collect(),
            query: Map::new(),
            headers: Map::new(),
            body: Value::Null,
            client_ip: "127.0.0.1".to_string(),
            user_agent: "test".to_string(),
            request_id: "req-1".to_string(),
            current_user: None,
        }
    }

    #[test]
    fn shapes_url_from_path_param() {
        let route = base_route();
        let upstream = base_upstream();
        let mut inbound = base_inbound();
        let route = RouteConfig {
            uri: format!("{}{}", upstream.base_url, route.uri),
            ..route
        };
        inbound.path_params.insert("id".to_string(), "42".to_string());
        let req = ShapingEngine::new()
            .shape(&route, &upstream, &inbound, Duration::from_secs(30))
            .unwrap();
        assert_eq!(req.url, "http://backend.local/users/42");
    }

    #[test]
    fn required_variable_missing_fails_validation() {
        let mut route = base_route();
        let mut vars = Map::new();
        vars.insert(
            "email".to_string(),
            VariableSpec {
                value: String::new(),
                data_type: DataType::String,
                encoding: Encoding::None,
                is_required: true,
                validations: ValidationRules::default(),
                validation_messages: Map::new(),
                custom_message: None,
            },
        );
        route.variables = vars;
        let upstream = base_upstream();
        let inbound = base_inbound();
        let err = ShapingEngine::new().shape(&route, &upstream, &inbound, Duration::from_secs(30));
        assert!(matches!(err, Err(ShapingError::ValidationFailed(_))));
    }

    #[test]
    fn basic_auth_header_injected_last() {
        let route = base_route();
        let mut upstream = base_upstream();
        upstream.auth = UpstreamAuth::Basic {
            user: "svc".to_string(),
            pass: "secret".to_string(),
        };
        let route = RouteConfig { uri: format!("{}{}", upstream.base_url, route.uri), ..route };
        let inbound = base_inbound();
        let req = ShapingEngine::new()
            .shape(&route, &upstream, &inbound, Duration::from_secs(30))
            .unwrap();
        assert!(req.headers.get("Authorization").unwrap().starts_with("Basic "));
    }
}
