use actix_web::{get, HttpResponse, Responder};

use crate::module::database::get_connection;

use crate::api::routes::queries::list_routes;

// List all configured routes
#[get("")]
pub async fn init() -> impl Responder {
    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    match list_routes(&db) {
        Ok(routes) => HttpResponse::Ok().json(routes),
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    }
}
