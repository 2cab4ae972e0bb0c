use actix_web::{delete, web, HttpRequest, HttpResponse, Responder};

use crate::api::users::helper::{is_staff_or_admin, ClaimsFromRequest};
use crate::module::database::get_connection;
use crate::module::gateway_client;

use crate::api::upstreams::queries::{delete_upstream, upstream_in_use};

// Delete an upstream — refused while any route still references it
#[delete("/{upstream_id}")]
pub async fn init(req: HttpRequest, path: web::Path<String>) -> impl Responder {
    let claims = match req.get_claims() {
        Some(claims) => claims,
        None => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to get user authentication"})),
    };
    if !is_staff_or_admin(&claims.role) {
        return HttpResponse::Forbidden().json(serde_json::json!({"error": "Only staff and administrators can manage upstreams"}));
    }

    let upstream_id = path.into_inner();

    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    match upstream_in_use(&db, &upstream_id) {
        Ok(true) => {
            return HttpResponse::Conflict().json(serde_json::json!({"error": "Upstream is still referenced by one or more routes"}));
        }
        Ok(false) => {}
        Err(err) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    }

    match delete_upstream(&db, &upstream_id) {
        Ok(0) => HttpResponse::NotFound().json(serde_json::json!({"error": "Upstream not found"})),
        Ok(_) => {
            gateway_client::notify_refresh_all().await;
            HttpResponse::Ok().json(serde_json::json!({"message": "Upstream successfully deleted"}))
        }
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Failed to delete upstream: {}", err)})),
    }
}
