//! Query helpers backing the route CRUD handlers.

use crate::module::database::{get_connection, Database, DatabaseError};

use super::models::{Protocol, RouteConfig, RouteMethod};

/// Creates the `route_configs` table if it doesn't already exist.
pub fn init_database() -> Result<(), DatabaseError> {
    let db = get_connection()?;
    db.execute(
        "CREATE TABLE IF NOT EXISTS route_configs (
            slug TEXT PRIMARY KEY,
            method TEXT NOT NULL,
            uri TEXT NOT NULL,
            protocol TEXT NOT NULL,
            upstream_id TEXT NOT NULL REFERENCES upstream_configs(id),
            headers_json TEXT NOT NULL,
            query_json TEXT NOT NULL,
            body_json TEXT NOT NULL,
            variables_json TEXT NOT NULL,
            timeout_seconds INTEGER NOT NULL,
            max_retries INTEGER NOT NULL,
            retry_delay_seconds INTEGER NOT NULL,
            response_manipulation TEXT,
            cache_json TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn row_to_route(
    slug: String,
    method: String,
    uri: String,
    protocol: String,
    upstream_id: String,
    headers_json: String,
    query_json: String,
    body_json: String,
    variables_json: String,
    timeout_seconds: i64,
    max_retries: i64,
    retry_delay_seconds: i64,
    response_manipulation: Option<String>,
    cache_json: String,
) -> Option<RouteConfig> {
    let method = match method.to_uppercase().as_str() {
        "GET" => RouteMethod::Get,
        "POST" => RouteMethod::Post,
        "PUT" => RouteMethod::Put,
        "PATCH" => RouteMethod::Patch,
        "DELETE" => RouteMethod::Delete,
        "HEAD" => RouteMethod::Head,
        "OPTIONS" => RouteMethod::Options,
        "GRPC" => RouteMethod::Grpc,
        _ => return None,
    };
    Some(RouteConfig {
        slug,
        method,
        uri,
        protocol: Protocol::from(protocol),
        upstream_id,
        headers: serde_json::from_str(&headers_json).ok()?,
        query: serde_json::from_str(&query_json).ok()?,
        body: serde_json::from_str(&body_json).ok()?,
        variables: serde_json::from_str(&variables_json).ok()?,
        timeout_seconds: timeout_seconds.max(0) as u64,
        max_retries: max_retries.max(0) as u32,
        retry_delay_seconds: retry_delay_seconds.max(0) as u64,
        response_manipulation,
        cache: serde_json::from_str(&cache_json).ok()?,
    })
}

const SELECT_COLUMNS: &str = "slug, method, uri, protocol, upstream_id, headers_json, query_json, body_json, \
     variables_json, timeout_seconds, max_retries, retry_delay_seconds, response_manipulation, cache_json";

type RouteRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    Option<String>,
    String,
);

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<RouteRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
    ))
}

pub fn list_routes(db: &Database) -> Result<Vec<RouteConfig>, DatabaseError> {
    let rows = db.query(&format!("SELECT {SELECT_COLUMNS} FROM route_configs"), [], map_row)?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            row_to_route(
                r.0, r.1, r.2, r.3, r.4, r.5, r.6, r.7, r.8, r.9, r.10, r.11, r.12, r.13,
            )
        })
        .collect())
}

pub fn get_route(db: &Database, slug: &str) -> Result<Option<RouteConfig>, DatabaseError> {
    let row = db.query_one(
        &format!("SELECT {SELECT_COLUMNS} FROM route_configs WHERE slug = ?"),
        [slug],
        map_row,
    )?;
    Ok(row.and_then(|r| {
        row_to_route(
            r.0, r.1, r.2, r.3, r.4, r.5, r.6, r.7, r.8, r.9, r.10, r.11, r.12, r.13,
        )
    }))
}

pub fn route_exists(db: &Database, slug: &str) -> Result<bool, DatabaseError> {
    Ok(db
        .query_one("SELECT slug FROM route_configs WHERE slug = ?", [slug], |row| row.get::<_, String>(0))?
        .is_some())
}

pub fn save_route(db: &Database, route: &RouteConfig) -> Result<(), DatabaseError> {
    let to_json = |v: &serde_json::Value| serde_json::to_string(v).unwrap_or_else(|_| "null".to_string());
    let headers_json = to_json(&route.headers);
    let query_json = to_json(&route.query);
    let body_json = to_json(&route.body);
    let variables_json = serde_json::to_string(&route.variables).unwrap_or_else(|_| "{}".to_string());
    let cache_json = serde_json::to_string(&route.cache).unwrap_or_else(|_| "{}".to_string());

    db.execute(
        "INSERT OR REPLACE INTO route_configs
            (slug, method, uri, protocol, upstream_id, headers_json, query_json, body_json,
             variables_json, timeout_seconds, max_retries, retry_delay_seconds,
             response_manipulation, cache_json)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            route.slug,
            route.method.to_string(),
            route.uri,
            route.protocol.to_string(),
            route.upstream_id,
            headers_json,
            query_json,
            body_json,
            variables_json,
            route.timeout_seconds as i64,
            route.max_retries as i64,
            route.retry_delay_seconds as i64,
            route.response_manipulation,
            cache_json,
        ],
    )?;
    Ok(())
}

pub fn delete_route(db: &Database, slug: &str) -> Result<usize, DatabaseError> {
    db.execute("DELETE FROM route_configs WHERE slug = ?", [slug])
}
