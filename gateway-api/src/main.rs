//! # Gateway API
//!
//! The admin surface for the gateway: user accounts, and CRUD over the routes and upstreams
//! that the gateway core's route registry loads from the same SQLite catalog. Every mutation
//! notifies the core over its internal refresh hooks so the live registry converges without a
//! restart (see `module::gateway_client`).
//!
//! ## Architecture
//!
//! - **Actix Web**: HTTP server framework for the REST surface
//! - **SQLite**: persistent storage for users, routes, and upstreams, shared with the core
//! - **JWT Authentication**: role-based access control (admin, staff, user)
//! - **CORS**: configurable cross-origin request support
//!
//! ## Network
//!
//! By default, the service listens on `127.0.0.1:30099`. This can be overridden through the
//! `--ip` and `--port` command line flags.

mod api;
mod config;
mod module;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, App, HttpServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()));
    env_logger::init();
    config::init();

    let matches = clap::Command::new("Gateway API")
        .version("0.1.0")
        .about("Admin surface for managing the gateway's routes, upstreams, and users")
        .arg(
            clap::Arg::new("ip")
                .long("ip")
                .help("IP address to bind the server to")
                .value_name("IP")
                .default_value("0.0.0.0"),
        )
        .arg(
            clap::Arg::new("port")
                .long("port")
                .help("Port number to bind the server to")
                .value_name("PORT")
                .default_value("30099")
                .value_parser(clap::value_parser!(u16)),
        )
        .get_matches();

    let ip = matches.get_one::<String>("ip").unwrap();
    let port = matches.get_one::<u16>("port").unwrap();
    let bind_address = format!("{}:{}", ip, port);

    log::info!("Starting gateway admin API on {}...", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(api::configure)
    })
    .bind(&bind_address)?
    .workers(2)
    .run()
    .await?;

    Ok(())
}
