use actix_web::{get, web, HttpResponse, Responder};

use crate::module::database::get_connection;

use crate::api::routes::queries::get_route;

// Fetch a single route by slug
#[get("/{slug}")]
pub async fn init(path: web::Path<String>) -> impl Responder {
    let slug = path.into_inner();

    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    match get_route(&db, &slug) {
        Ok(Some(route)) => HttpResponse::Ok().json(route),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({"error": "Route not found"})),
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    }
}
