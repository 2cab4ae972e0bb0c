//! Internal admin-mutation-hook receiver. `gateway-api` calls these after a catalog mutation;
//! they are not part of the public dynamic surface and are expected to be bound to a loopback
//! address only (see `RuntimeConfig::internal_bind`).

use std::sync::Arc;

use actix_web::{post, web, HttpResponse};

use crate::state::AppState;

#[post("/refresh/{slug}")]
async fn refresh_one(path: web::Path<String>, state: web::Data<Arc<AppState>>) -> HttpResponse {
    let slug = path.into_inner();
    match state.registry.refresh_one(&slug, &state.catalog).await {
        Ok(()) => {
            state.cache.invalidate_slug(&slug);
            HttpResponse::Ok().json(serde_json::json!({"message": "refreshed", "slug": slug}))
        }
        Err(e) => {
            tracing::warn!(slug = %slug, error = %e, "refresh_one failed");
            HttpResponse::InternalServerError().json(serde_json::json!({"message": e}))
        }
    }
}

#[post("/refresh-all")]
async fn refresh_all(state: web::Data<Arc<AppState>>) -> HttpResponse {
    match state.registry.refresh_all(&state.catalog).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"message": "refreshed", "count": state.registry.count()})),
        Err(e) => {
            tracing::warn!(error = %e, "refresh_all failed");
            HttpResponse::InternalServerError().json(serde_json::json!({"message": e}))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/internal").service(refresh_one).service(refresh_all));
}
