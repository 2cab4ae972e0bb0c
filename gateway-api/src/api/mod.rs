//! # API Module
//!
//! This module contains the RESTful API endpoints and handlers for the gateway admin surface.
//! It organizes the API into logical modules for different functionality domains: user
//! management, and catalog management (routes and their upstreams) for the gateway core's
//! route registry.
//!
//! ## Module Structure
//!
//! The API is organized into the following submodules:
//!
//! - `users`: User management, authentication, and authorization
//! - `routes`: CRUD over dispatchable routes
//! - `upstreams`: CRUD over the backends routes dispatch to
//!
//! ## API Configuration
//!
//! All API endpoints are mounted under the `/api/v1` prefix and follow RESTful conventions.
//! Authentication is applied per-scope through JWT middleware, with specific permissions
//! enforced at the individual endpoint level.

pub mod routes;
pub mod upstreams;
pub mod users;

use actix_web::web;
use users::init_database;

/// Configure and mount all API routes for the application.
///
/// This function is called during application startup to register all API routes
/// and middleware with the Actix Web service configuration. It initializes the admin
/// databases and mounts all API endpoints under the `/api/v1` prefix.
///
/// # Arguments
///
/// * `cfg` - A mutable reference to the Actix Web service configuration
///
/// # Example
///
/// ```rust
/// // Inside main.rs or similar file
/// App::new()
///     .configure(api::configure)
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    if let Err(e) = init_database() {
        eprintln!("Error initializing users database: {}", e);
    }
    if let Err(e) = upstreams::init_database() {
        eprintln!("Error initializing upstreams database: {}", e);
    }
    if let Err(e) = routes::init_database() {
        eprintln!("Error initializing routes database: {}", e);
    }

    cfg.service(
        web::scope("/api/v1")
            .configure(users::configure)
            .configure(upstreams::configure)
            .configure(routes::configure),
    );
}
