use actix_web::{get, web, HttpResponse, Responder};

use crate::module::database::get_connection;

use crate::api::upstreams::queries::get_upstream;

// Fetch a single upstream by id
#[get("/{upstream_id}")]
pub async fn init(path: web::Path<String>) -> impl Responder {
    let upstream_id = path.into_inner();

    let db = match get_connection() {
        Ok(db) => db,
        Err(_) => return HttpResponse::InternalServerError().json(serde_json::json!({"error": "Failed to connect to database"})),
    };

    match get_upstream(&db, &upstream_id) {
        Ok(Some(upstream)) => HttpResponse::Ok().json(upstream),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({"error": "Upstream not found"})),
        Err(err) => HttpResponse::InternalServerError().json(serde_json::json!({"error": format!("Database error: {}", err)})),
    }
}
