use actix_web::{post, web, HttpRequest, HttpResponse, Responder};

use crate::api::users::helper::{is_staff_or_admin, ClaimsFromRequest};
use crate::module::database::get_connection;
use crate::module::gateway_client;

use crate::api::upstreams::models::UpstreamConfig;
use crate::api::upstreams::queries::{save_upstream, upstream_exists};

// Create or replace an upstream — staff and admins only
#[post("")]
pub async fn init(req: HttpRequest, body: web::Json<crate::api::upstreams::models::UpstreamRequest>) -> impl Responder {
    let claims = match req.get_claims() {
        Some(claims) => claims,
        None => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to get user authentication"})),
    };
    if !is_staff_or_admin(&claims.role) {
        return HttpResponse::Forbidden().json(serde_json::json!({"error": "Only staff and administrators can manage upstreams"}));
    }

    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    let body = body.into_inner();
    let id = body.id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let is_update = match upstream_exists(&db, &id) {
        Ok(exists) => exists,
        Err(err) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    };

    let upstream = UpstreamConfig {
        id: id.clone(),
        name: body.name,
        protocol: body.protocol,
        base_url: body.base_url,
        tls_enabled: body.tls_enabled,
        grpc_service: body.grpc_service,
        grpc_descriptor_set: body.grpc_descriptor_set,
        auth: body.auth,
        is_active: body.is_active,
    };

    if let Err(err) = save_upstream(&db, &upstream) {
        return HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Failed to save upstream: {}", err)}));
    }

    gateway_client::notify_refresh_all().await;

    if is_update {
        HttpResponse::Ok().json(upstream)
    } else {
        HttpResponse::Created().json(upstream)
    }
}
