//! # Gateway Core
//!
//! The dispatch core of the gateway: route registry, request shaping, protocol dispatch, and
//! response caching behind a single dynamic HTTP surface.
//!
//! ## Architecture
//!
//! - **registry**: the route trie and the atomically-refreshed catalog snapshot
//! - **shaping**: template rendering, variable resolution, validation, response manipulation
//! - **dispatch**: pooled connections, circuit breaker, health monitor, retry loop
//! - **cache**: fingerprinted response cache with TTL and invalidation
//! - **server**: the actix-web boundary adapters (dynamic handler + internal refresh hooks)
//!
//! ## Communication
//!
//! The catalog lives in SQLite and is owned by the admin surface (`gateway-api`); this process
//! only reads it. After an admin mutation, `gateway-api` calls this process's `/internal/refresh`
//! endpoints so the in-memory registry and cache stay converged without a restart.

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use mini_config::Configure;

mod cache;
mod catalog;
mod config;
mod dispatch;
mod error;
mod model;
mod registry;
mod server;
mod shaping;
mod state;

use config::{Core, RuntimeConfig};
use state::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));
    env_logger::init();

    config::init();
    let runtime_config = RuntimeConfig::from_env();

    eprintln!("[----] Starting gateway core...");

    let sqlite_path: String = Core::SQLitePath
        .get::<String>()
        .unwrap_or_else(|| "/tmp/gwrs/data/core".to_string());
    let catalog = catalog::SqliteCatalogLoader::open(PathBuf::from(sqlite_path))
        .expect("failed to open catalog database");

    let state = AppState::new(runtime_config.clone(), catalog);

    eprintln!("[----] Loading route catalog...");
    if let Err(e) = state.registry.refresh_all(&state.catalog).await {
        log::warn!("initial catalog load failed: {e}");
    }
    log::info!("loaded {} routes", state.registry.count());

    spawn_background_tasks(state.clone(), &runtime_config);

    {
        let running = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let running_clone = running.clone();
        ctrlc::set_handler(move || {
            eprintln!("\n[----] SIGINT received, shutting down...");
            running_clone.store(false, std::sync::atomic::Ordering::SeqCst);
        })
        .expect("error setting Ctrl-C handler");
    }

    let bind_addr: String = Core::TCPAddress.get::<String>().unwrap_or_else(|| "0.0.0.0:8080".to_string());
    eprintln!("[----] Starting dynamic dispatch surface on {bind_addr}...");
    eprintln!("[----] Starting internal refresh surface on {}...", runtime_config.internal_bind);

    let public_state = state.clone();
    let public_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(public_state.clone()))
            .default_service(web::route().to(server::handler::dynamic_handler))
    })
    .workers(num_cpus::get().max(2))
    .bind(&bind_addr)?
    .run();

    let internal_state = state.clone();
    let internal_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(internal_state.clone()))
            .configure(server::internal::configure)
    })
    .workers(2)
    .bind(&runtime_config.internal_bind)?
    .run();

    tokio::try_join!(public_server, internal_server)?;
    Ok(())
}

fn spawn_background_tasks(state: Arc<AppState>, config: &RuntimeConfig) {
    let health_targets: Vec<String> = state
        .registry
        .list_slugs()
        .iter()
        .filter_map(|slug| state.registry.get_by_slug(slug))
        .filter_map(|route| state.registry.upstream(&route.upstream_id))
        .map(|u| u.base_url.clone())
        .collect();
    state.dispatch.health.clone().spawn(health_targets, config.health_interval);

    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            ticker.tick().await;
            sweep_state.cache.sweep_expired();
        }
    });

    let refresh_state = state.clone();
    let refresh_interval = config.catalog_refresh_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(refresh_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = refresh_state.registry.refresh_all(&refresh_state.catalog).await {
                log::warn!("periodic catalog refresh failed: {e}");
            }
        }
    });
}
