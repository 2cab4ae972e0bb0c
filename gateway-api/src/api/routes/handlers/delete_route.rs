use actix_web::{delete, web, HttpRequest, HttpResponse, Responder};

use crate::api::users::helper::{is_staff_or_admin, ClaimsFromRequest};
use crate::module::database::get_connection;
use crate::module::gateway_client;

use crate::api::routes::queries::delete_route;

// Delete a route — staff and admins only
#[delete("/{slug}")]
pub async fn init(req: HttpRequest, path: web::Path<String>) -> impl Responder {
    let claims = match req.get_claims() {
        Some(claims) => claims,
        None => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to get user authentication"})),
    };
    if !is_staff_or_admin(&claims.role) {
        return HttpResponse::Forbidden().json(serde_json::json!({"error": "Only staff and administrators can manage routes"}));
    }

    let slug = path.into_inner();

    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    match delete_route(&db, &slug) {
        Ok(0) => HttpResponse::NotFound().json(serde_json::json!({"error": "Route not found"})),
        Ok(_) => {
            gateway_client::notify_refresh_one(&slug).await;
            HttpResponse::Ok().json(serde_json::json!({"message": "Route successfully deleted"}))
        }
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Failed to delete route: {}", err)})),
    }
}
