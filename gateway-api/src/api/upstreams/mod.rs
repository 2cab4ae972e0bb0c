//! # Upstream Management API Module
//!
//! CRUD endpoints over the `upstream_configs` table that the gateway core's route registry
//! reads from. Every mutation notifies the core over its internal refresh hook so the in-memory
//! registry converges without a restart.
//!
//! Listing and fetching a single upstream is open to any authenticated user; creating, replacing,
//! and deleting are restricted to staff and admins, matching the user module's role split.

mod handlers;
pub mod models;
pub mod queries;

use actix_web::web;

use super::users::helper::JwtAuth;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/upstreams")
            .wrap(JwtAuth::new())
            .service(handlers::list_upstreams::init)
            .service(handlers::get_upstream::init)
            .service(handlers::save_upstream::init)
            .service(handlers::delete_upstream::init),
    );
}

pub fn init_database() -> Result<(), crate::module::database::DatabaseError> {
    queries::init_database()
}
