//! The single dynamic handler: every request not under the admin prefix lands here and is
//! driven through C2 → C5 → C3 → C4 in that order (see module overview).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpRequest, HttpResponse};
use tokio_util::sync::CancellationToken;

use crate::cache::{self, CacheKeyInput, CachedResponse};
use crate::error::GatewayError;
use crate::model::RouteMethod;
use crate::registry::MatchOutcome;
use crate::state::AppState;

use super::InboundRequest;

const HEADER_WHITELIST: &[&str] = &["accept", "content-type", "x-request-id"];

pub async fn dynamic_handler(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    match handle(&req, body, &state).await {
        Ok(resp) => resp,
        Err(e) => error_response(e),
    }
}

async fn handle(
    req: &HttpRequest,
    body: web::Bytes,
    state: &Arc<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let method = RouteMethod::from_str_loose(req.method().as_str()).ok_or(GatewayError::MethodNotAllowed)?;
    let path = req.path();

    let outcome = state.registry.lookup(method, path);
    let (entry, params) = match outcome {
        MatchOutcome::Matched { entry, params } => (entry, params),
        MatchOutcome::NotFound => return Err(GatewayError::NotFound),
        MatchOutcome::MethodNotAllowed => return Err(GatewayError::MethodNotAllowed),
    };
    let route = entry.route.clone();

    let upstream = state
        .registry
        .upstream(&route.upstream_id)
        .ok_or_else(|| GatewayError::Internal(format!("upstream {} missing at dispatch time", route.upstream_id)))?;

    let inbound = build_inbound(req, &body, method, params.into_iter().collect());

    let whitelisted_headers: HashMap<String, String> = inbound
        .headers
        .iter()
        .filter(|(k, _)| HEADER_WHITELIST.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let cache_key = cache::derive_key(&CacheKeyInput {
        slug: &route.slug,
        query: &inbound.query,
        whitelisted_headers: &whitelisted_headers,
        body: &inbound.body,
        path_params: &inbound.path_params,
    });

    let cacheable = cache::is_cacheable(&route.cache, method, 200, body.len());

    if cacheable {
        if let Some(cached) = state.cache.get(&cache_key) {
            return Ok(render_cached(cached));
        }
    }

    if cacheable {
        if let Some(mut rx) = state.cache.begin_inflight(&cache_key) {
            let _ = rx.recv().await;
            if let Some(cached) = state.cache.get(&cache_key) {
                return Ok(render_cached(cached));
            }
        }
    }

    let result = dispatch_and_shape(state, &route, &upstream, &inbound).await;

    if cacheable {
        state.cache.finish_inflight(&cache_key);
    }

    let (status, response_body, headers) = result?;

    if cacheable && cache::is_cacheable(&route.cache, method, status, response_body.len()) {
        let ttl = route
            .cache
            .ttl_seconds
            .filter(|t| *t > 0)
            .map(Duration::from_secs)
            .unwrap_or(state.cache.default_ttl);
        state.cache.put(
            cache_key,
            &route.slug,
            CachedResponse {
                status,
                body: response_body.clone(),
                headers: headers.clone(),
                stored_at: std::time::Instant::now(),
                ttl,
            },
        );
    }

    Ok(render(status, response_body, headers))
}

async fn dispatch_and_shape(
    state: &Arc<AppState>,
    route: &crate::model::RouteConfig,
    upstream: &crate::model::UpstreamConfig,
    inbound: &InboundRequest,
) -> Result<(u16, Vec<u8>, HashMap<String, String>), GatewayError> {
    let shaped = state
        .shaping
        .shape(route, upstream, inbound, Duration::from_secs(route.timeout_seconds))?;

    let cancel = CancellationToken::new();
    let response = state.dispatch.dispatch(upstream, &shaped, cancel).await?;

    let body = state.shaping.manipulate_response(route, response.status, &response.body);
    Ok((response.status, body, response.headers))
}

fn build_inbound(
    req: &HttpRequest,
    body: &web::Bytes,
    method: RouteMethod,
    path_params: HashMap<String, String>,
) -> InboundRequest {
    let query: HashMap<String, String> = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(|q| q.into_inner())
        .unwrap_or_default();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_lowercase(), v.to_string())))
        .collect();

    let body_value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(body).unwrap_or(serde_json::Value::Null)
    };

    let request_id = headers
        .get("x-request-id")
        .cloned()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    let user_agent = headers.get("user-agent").cloned().unwrap_or_default();

    InboundRequest {
        method,
        path_params,
        query,
        headers,
        body: body_value,
        client_ip,
        user_agent,
        request_id,
        current_user: None,
    }
}

fn render(status: u16, body: Vec<u8>, headers: HashMap<String, String>) -> HttpResponse {
    let mut builder = HttpResponse::build(
        actix_web::http::StatusCode::from_u16(status).unwrap_or(actix_web::http::StatusCode::OK),
    );
    for (k, v) in headers {
        if let (Ok(name), Ok(value)) = (
            actix_web::http::header::HeaderName::try_from(k),
            actix_web::http::header::HeaderValue::try_from(v),
        ) {
            builder.insert_header((name, value));
        }
    }
    builder.body(body)
}

fn render_cached(cached: CachedResponse) -> HttpResponse {
    render(cached.status, cached.body, cached.headers)
}

fn error_response(err: GatewayError) -> HttpResponse {
    let status = err.status_code();
    let body = match &err {
        GatewayError::Shaping(crate::error::ShapingError::ValidationFailed(errors)) => {
            serde_json::json!({"message": "Unprocessable Entity", "errors": errors})
        }
        other => serde_json::json!({"message": other.to_string()}),
    };
    HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR))
        .json(body)
}
