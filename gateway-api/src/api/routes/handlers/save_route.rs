use actix_web::{post, web, HttpRequest, HttpResponse, Responder};

use crate::api::users::helper::{is_staff_or_admin, ClaimsFromRequest};
use crate::module::database::get_connection;
use crate::module::gateway_client;

use crate::api::routes::models::RouteConfig;
use crate::api::routes::queries::{route_exists, save_route};
use crate::api::upstreams::queries::upstream_exists;

// Create or replace a route — staff and admins only
#[post("")]
pub async fn init(req: HttpRequest, body: web::Json<crate::api::routes::models::RouteRequest>) -> impl Responder {
    let claims = match req.get_claims() {
        Some(claims) => claims,
        None => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to get user authentication"})),
    };
    if !is_staff_or_admin(&claims.role) {
        return HttpResponse::Forbidden().json(serde_json::json!({"error": "Only staff and administrators can manage routes"}));
    }

    let body = body.into_inner();

    if body.max_retries > 10 {
        return HttpResponse::UnprocessableEntity().json(serde_json::json!({"error": "max_retries must be between 0 and 10"}));
    }
    if body.retry_delay_seconds > 300 {
        return HttpResponse::UnprocessableEntity().json(serde_json::json!({"error": "retry_delay_seconds must be between 0 and 300"}));
    }

    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    match upstream_exists(&db, &body.upstream_id) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::UnprocessableEntity().json(serde_json::json!({"error": "upstream_id does not reference an existing upstream"}));
        }
        Err(err) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    }

    let is_update = match route_exists(&db, &body.slug) {
        Ok(exists) => exists,
        Err(err) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    };

    let route = RouteConfig {
        slug: body.slug.clone(),
        method: body.method,
        uri: body.uri,
        protocol: body.protocol,
        upstream_id: body.upstream_id,
        headers: body.headers,
        query: body.query,
        body: body.body,
        variables: body.variables,
        timeout_seconds: body.timeout_seconds,
        max_retries: body.max_retries,
        retry_delay_seconds: body.retry_delay_seconds,
        response_manipulation: body.response_manipulation,
        cache: body.cache,
    };

    if let Err(err) = save_route(&db, &route) {
        return HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Failed to save route: {}", err)}));
    }

    gateway_client::notify_refresh_one(&route.slug).await;

    if is_update {
        HttpResponse::Ok().json(route)
    } else {
        HttpResponse::Created().json(route)
    }
}
