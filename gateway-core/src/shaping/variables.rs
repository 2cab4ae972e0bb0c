//! Variable resolution: binds each declared [`VariableSpec`] from a template expression or from
//! the inbound request, coerces it to its declared type, validates it, and applies its encoding.

use std::collections::HashMap;

use serde_json::Value;

use super::{coerce, encode, template, validation};
use crate::error::{FieldError, ShapingError};
use crate::model::RouteConfig;
use crate::server::InboundRequest;

/// Ambient values every template may reference regardless of what the route declares.
pub fn ambient_context(inbound: &InboundRequest) -> HashMap<String, Value> {
    let mut ctx = HashMap::new();
    ctx.insert(
        "current_date".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    ctx.insert("request_id".to_string(), Value::String(inbound.request_id.clone()));
    ctx.insert("trace_id".to_string(), Value::String(inbound.request_id.clone()));
    ctx.insert(
        "correlation_id".to_string(),
        Value::String(inbound.request_id.clone()),
    );
    if let Some(user) = &inbound.current_user {
        ctx.insert("current_user".to_string(), Value::String(user.clone()));
    }
    ctx.insert("client_ip".to_string(), Value::String(inbound.client_ip.clone()));
    ctx.insert("user_agent".to_string(), Value::String(inbound.user_agent.clone()));
    ctx
}

/// Where a declared variable's placeholder was found in the route's own config, used to bind it
/// from the matching part of the inbound request rather than guessing off a fixed precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Url,
    Header,
    Query,
    Body,
    /// Declared but never referenced by `{{name}}` anywhere in the route's templates.
    Unreferenced,
}

/// Scans `route`'s URL, header, query, and body templates (in that order) for the first one that
/// references `{{name}}`, per the binding rule: "URL template → path params then inbound query;
/// header template → inbound headers; query template → inbound query; body template → inbound
/// body at the same key."
fn locate(route: &RouteConfig, name: &str) -> Location {
    if template::references(&Value::String(route.uri.clone()), name) {
        Location::Url
    } else if template::references(&route.headers, name) {
        Location::Header
    } else if template::references(&route.query, name) {
        Location::Query
    } else if template::references(&route.body, name) {
        Location::Body
    } else {
        Location::Unreferenced
    }
}

/// Resolves every declared variable, returning the fully resolved/coerced/encoded context. If any
/// variable fails validation, all errors are collected and returned together rather than failing
/// on the first one.
///
/// Variables are processed in a fixed, name-sorted order rather than the `HashMap`'s own
/// (randomized) iteration order, so that a `value` template referencing another declared variable
/// resolves to the same thing on every call with the same inputs.
pub fn resolve_all(
    route: &RouteConfig,
    inbound: &InboundRequest,
) -> Result<HashMap<String, Value>, ShapingError> {
    let ambient = ambient_context(inbound);
    let mut resolved: HashMap<String, Value> = ambient.clone();
    let mut field_errors: HashMap<String, Vec<FieldError>> = HashMap::new();

    let mut names: Vec<&String> = route.variables.keys().collect();
    names.sort();

    for name in names {
        let spec = &route.variables[name];
        let raw = if !spec.value.trim().is_empty() {
            let rendered = template::substitute(&Value::String(spec.value.clone()), &resolved);
            match rendered {
                Value::String(s) => s,
                other => other.to_string(),
            }
        } else {
            bind_from_location(name, locate(route, name), inbound, &ambient)
        };

        if spec.is_required && raw.is_empty() {
            field_errors.entry(name.clone()).or_default().push(FieldError {
                code: "required".to_string(),
                message: spec
                    .custom_message
                    .clone()
                    .unwrap_or_else(|| format!("{name} is required")),
            });
            continue;
        }

        let coerced = coerce::coerce(&raw, &spec.data_type);
        let errors = validation::validate(name, &coerced, &spec.validations);
        if !errors.is_empty() {
            field_errors.entry(name.clone()).or_insert_with(Vec::new).extend(errors);
            continue;
        }

        let encoded = encode::apply(coerced, &spec.encoding);
        resolved.insert(name.clone(), encoded);
    }

    if !field_errors.is_empty() {
        return Err(ShapingError::ValidationFailed(field_errors));
    }

    Ok(resolved)
}

/// Binds a variable with an empty `value` from the inbound request location its placeholder was
/// found at. Falls back through the ambient context, and finally the full path→query→header→body
/// precedence for a variable that isn't referenced anywhere in the route's own templates.
fn bind_from_location(
    name: &str,
    location: Location,
    inbound: &InboundRequest,
    ambient: &HashMap<String, Value>,
) -> String {
    let from_inbound = match location {
        Location::Url => inbound
            .path_params
            .get(name)
            .or_else(|| inbound.query.get(name))
            .cloned(),
        Location::Header => inbound.headers.get(name).cloned(),
        Location::Query => inbound.query.get(name).cloned(),
        Location::Body => inbound.body.get(name).map(stringify),
        Location::Unreferenced => inbound
            .path_params
            .get(name)
            .or_else(|| inbound.query.get(name))
            .or_else(|| inbound.headers.get(name))
            .cloned()
            .or_else(|| inbound.body.get(name).map(stringify)),
    };

    from_inbound
        .or_else(|| ambient.get(name).map(stringify))
        .unwrap_or_default()
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CachePolicy, Protocol, RouteMethod, VariableSpec};

    fn inbound() -> InboundRequest {
        InboundRequest {
            method: RouteMethod::Get,
            path_params: HashMap::from([("id".to_string(), "42".to_string())]),
            query: HashMap::from([("q".to_string(), "search-term".to_string())]),
            headers: HashMap::from([("x-tenant".to_string(), "acme".to_string())]),
            body: Value::Null,
            client_ip: "127.0.0.1".to_string(),
            user_agent: "test-agent".to_string(),
            request_id: "req-1".to_string(),
            current_user: None,
        }
    }

    fn route_with(
        uri: &str,
        headers: Value,
        query: Value,
        body: Value,
        variables: HashMap<String, VariableSpec>,
    ) -> RouteConfig {
        RouteConfig {
            slug: "r".to_string(),
            method: RouteMethod::Get,
            uri: uri.to_string(),
            protocol: Protocol::Http,
            upstream_id: "up-1".to_string(),
            headers,
            query,
            body,
            variables,
            timeout_seconds: 5,
            max_retries: 0,
            retry_delay_seconds: 0,
            response_manipulation: None,
            cache: CachePolicy::default(),
        }
    }

    fn unbound_var() -> VariableSpec {
        VariableSpec {
            value: String::new(),
            data_type: Default::default(),
            encoding: Default::default(),
            is_required: false,
            validations: Default::default(),
            validation_messages: HashMap::new(),
            custom_message: None,
        }
    }

    #[test]
    fn binds_from_the_url_when_the_placeholder_is_in_the_uri() {
        let route = route_with(
            "/users/{{id}}",
            serde_json::json!({}),
            serde_json::json!({}),
            serde_json::json!({}),
            HashMap::from([("id".to_string(), unbound_var())]),
        );
        let ctx = resolve_all(&route, &inbound()).unwrap();
        assert_eq!(ctx.get("id"), Some(&Value::String("42".to_string())));
    }

    #[test]
    fn binds_from_headers_when_the_placeholder_is_in_a_header_template() {
        let route = route_with(
            "/search",
            serde_json::json!({"X-Tenant": "{{x-tenant}}"}),
            serde_json::json!({}),
            serde_json::json!({}),
            HashMap::from([("x-tenant".to_string(), unbound_var())]),
        );
        let ctx = resolve_all(&route, &inbound()).unwrap();
        assert_eq!(ctx.get("x-tenant"), Some(&Value::String("acme".to_string())));
    }

    #[test]
    fn binds_from_query_even_when_a_same_named_header_exists() {
        let route = route_with(
            "/search",
            serde_json::json!({}),
            serde_json::json!({"q": "{{q}}"}),
            serde_json::json!({}),
            HashMap::from([("q".to_string(), unbound_var())]),
        );
        let ctx = resolve_all(&route, &inbound()).unwrap();
        assert_eq!(ctx.get("q"), Some(&Value::String("search-term".to_string())));
    }

    #[test]
    fn resolution_order_is_stable_across_runs() {
        let mut vars = HashMap::new();
        vars.insert(
            "greeting".to_string(),
            VariableSpec { value: "hi {{name}}".to_string(), ..unbound_var() },
        );
        vars.insert(
            "name".to_string(),
            VariableSpec { value: "Ada".to_string(), ..unbound_var() },
        );
        let route = route_with(
            "/hello",
            serde_json::json!({}),
            serde_json::json!({}),
            serde_json::json!({}),
            vars,
        );
        // "greeting" sorts before "name", but the point is that every run with these exact
        // inputs produces the exact same output, not that forward references resolve.
        let first = resolve_all(&route, &inbound()).unwrap();
        let second = resolve_all(&route, &inbound()).unwrap();
        assert_eq!(first.get("greeting"), second.get("greeting"));
    }
}
