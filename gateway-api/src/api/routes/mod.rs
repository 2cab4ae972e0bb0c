//! # Route Management API Module
//!
//! CRUD endpoints over the `route_configs` table. A route's `slug` is its primary key and its
//! public identity — saving under an existing slug replaces the route atomically, mirroring how
//! the registry installs a fresh snapshot on every refresh rather than patching one in place.
//!
//! Reads are open to any authenticated user; writes are restricted to staff and admins.

mod handlers;
pub mod models;
pub mod queries;

use actix_web::web;

use super::users::helper::JwtAuth;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/routes")
            .wrap(JwtAuth::new())
            .service(handlers::list_routes::init)
            .service(handlers::get_route::init)
            .service(handlers::save_route::init)
            .service(handlers::delete_route::init),
    );
}

pub fn init_database() -> Result<(), crate::module::database::DatabaseError> {
    queries::init_database()
}
