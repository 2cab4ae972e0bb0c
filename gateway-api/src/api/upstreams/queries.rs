//! Query helpers backing the upstream CRUD handlers. Kept separate from the handlers so the SQL
//! stays in one place and the handlers read as pure HTTP plumbing.

use crate::module::database::{get_connection, Database, DatabaseError};

use super::models::{Protocol, UpstreamAuth, UpstreamConfig};

/// Creates the `upstream_configs` table if it doesn't already exist.
pub fn init_database() -> Result<(), DatabaseError> {
    let db = get_connection()?;
    db.execute(
        "CREATE TABLE IF NOT EXISTS upstream_configs (
            id TEXT PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            protocol TEXT NOT NULL,
            base_url TEXT NOT NULL,
            tls_enabled INTEGER NOT NULL,
            grpc_service TEXT,
            grpc_descriptor_set TEXT,
            auth_json TEXT NOT NULL,
            is_active INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn row_to_upstream(
    id: String,
    name: String,
    protocol: String,
    base_url: String,
    tls_enabled: bool,
    grpc_service: Option<String>,
    grpc_descriptor_set: Option<String>,
    auth_json: String,
    is_active: bool,
) -> Option<UpstreamConfig> {
    let auth: UpstreamAuth = serde_json::from_str(&auth_json).ok()?;
    Some(UpstreamConfig {
        id,
        name,
        protocol: Protocol::from(protocol),
        base_url,
        tls_enabled,
        grpc_service,
        grpc_descriptor_set,
        auth,
        is_active,
    })
}

pub fn list_upstreams(db: &Database) -> Result<Vec<UpstreamConfig>, DatabaseError> {
    let rows = db.query(
        "SELECT id, name, protocol, base_url, tls_enabled, grpc_service, grpc_descriptor_set, \
         auth_json, is_active FROM upstream_configs",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, bool>(8)?,
            ))
        },
    )?;
    Ok(rows
        .into_iter()
        .filter_map(
            |(id, name, protocol, base_url, tls_enabled, grpc_service, grpc_descriptor_set, auth_json, is_active)| {
                row_to_upstream(
                    id,
                    name,
                    protocol,
                    base_url,
                    tls_enabled,
                    grpc_service,
                    grpc_descriptor_set,
                    auth_json,
                    is_active,
                )
            },
        )
        .collect())
}

pub fn get_upstream(db: &Database, id: &str) -> Result<Option<UpstreamConfig>, DatabaseError> {
    let row = db.query_one(
        "SELECT id, name, protocol, base_url, tls_enabled, grpc_service, grpc_descriptor_set, \
         auth_json, is_active FROM upstream_configs WHERE id = ?",
        [id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, bool>(8)?,
            ))
        },
    )?;
    Ok(row.and_then(
        |(id, name, protocol, base_url, tls_enabled, grpc_service, grpc_descriptor_set, auth_json, is_active)| {
            row_to_upstream(
                id,
                name,
                protocol,
                base_url,
                tls_enabled,
                grpc_service,
                grpc_descriptor_set,
                auth_json,
                is_active,
            )
        },
    ))
}

pub fn upstream_exists(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    Ok(db
        .query_one("SELECT id FROM upstream_configs WHERE id = ?", [id], |row| row.get::<_, String>(0))?
        .is_some())
}

/// Inserts or replaces an upstream row. `INSERT OR REPLACE` keys on the primary key, matching the
/// "updates replace the record atomically" lifecycle rule routes and upstreams share.
pub fn save_upstream(db: &Database, upstream: &UpstreamConfig) -> Result<(), DatabaseError> {
    let auth_json = serde_json::to_string(&upstream.auth).map_err(|e| DatabaseError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))?;
    db.execute(
        "INSERT OR REPLACE INTO upstream_configs
            (id, name, protocol, base_url, tls_enabled, grpc_service, grpc_descriptor_set, auth_json, is_active)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            upstream.id,
            upstream.name,
            upstream.protocol.to_string(),
            upstream.base_url,
            upstream.tls_enabled,
            upstream.grpc_service,
            upstream.grpc_descriptor_set,
            auth_json,
            upstream.is_active,
        ],
    )?;
    Ok(())
}

pub fn delete_upstream(db: &Database, id: &str) -> Result<usize, DatabaseError> {
    db.execute("DELETE FROM upstream_configs WHERE id = ?", [id])
}

/// True if any active route still references this upstream — used to refuse deletes that would
/// otherwise silently drop routes out of the registry on next refresh.
pub fn upstream_in_use(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    Ok(db
        .query_one("SELECT slug FROM route_configs WHERE upstream_id = ?", [id], |row| row.get::<_, String>(0))?
        .is_some())
}
