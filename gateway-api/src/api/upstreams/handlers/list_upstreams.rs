use actix_web::{get, HttpResponse, Responder};

use crate::module::database::get_connection;

use crate::api::upstreams::queries::list_upstreams;

// List all configured upstreams
#[get("")]
pub async fn init() -> impl Responder {
    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    match list_upstreams(&db) {
        Ok(upstreams) => HttpResponse::Ok().json(upstreams),
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    }
}
