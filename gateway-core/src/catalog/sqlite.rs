//! Loads the route catalog from the same SQLite database the admin surface writes to. `rusqlite`
//! is synchronous, so every call runs on a blocking thread pool task.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection;

use super::{CatalogError, CatalogLoader};
use crate::model::{RouteConfig, RouteMethod, UpstreamConfig};

pub struct SqliteCatalogLoader {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCatalogLoader {
    pub fn open(path: PathBuf) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::Storage(e.to_string()))?;
        }
        let connection = Connection::open(path).map_err(|e| CatalogError::Storage(e.to_string()))?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn load_sync(
        connection: &Connection,
    ) -> Result<(Vec<RouteConfig>, Vec<UpstreamConfig>), CatalogError> {
        let mut upstream_stmt = connection
            .prepare(
                "SELECT id, name, protocol, base_url, tls_enabled, grpc_service, grpc_descriptor_set, \
                 auth_json, is_active FROM upstream_configs",
            )
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        let upstreams = upstream_stmt
            .query_map([], |row| {
                let protocol_str: String = row.get(2)?;
                let auth_json: String = row.get(7)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    protocol_str,
                    row.get::<_, String>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    auth_json,
                    row.get::<_, bool>(8)?,
                ))
            })
            .map_err(|e| CatalogError::Storage(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::Storage(e.to_string()))?
            .into_iter()
            .filter_map(
                |(id, name, protocol, base_url, tls_enabled, grpc_service, grpc_descriptor_set, auth_json, is_active)| {
                    let protocol = serde_json::from_value(serde_json::Value::String(protocol)).ok()?;
                    let auth = serde_json::from_str(&auth_json).ok()?;
                    Some(UpstreamConfig {
                        id,
                        name,
                        protocol,
                        base_url,
                        tls_enabled,
                        grpc_service,
                        grpc_descriptor_set,
                        auth,
                        is_active,
                    })
                },
            )
            .collect::<Vec<_>>();

        let mut route_stmt = connection
            .prepare(
                "SELECT slug, method, uri, protocol, upstream_id, headers_json, query_json, body_json, \
                 variables_json, timeout_seconds, max_retries, retry_delay_seconds, \
                 response_manipulation, cache_json FROM route_configs",
            )
            .map_err(|e| CatalogError::Storage(e.to_string()))?;
        let routes = route_stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, i64>(9)?,
                    row.get::<_, i64>(10)?,
                    row.get::<_, i64>(11)?,
                    row.get::<_, Option<String>>(12)?,
                    row.get::<_, String>(13)?,
                ))
            })
            .map_err(|e| CatalogError::Storage(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::Storage(e.to_string()))?
            .into_iter()
            .filter_map(
                |(
                    slug,
                    method,
                    uri,
                    protocol,
                    upstream_id,
                    headers_json,
                    query_json,
                    body_json,
                    variables_json,
                    timeout_seconds,
                    max_retries,
                    retry_delay_seconds,
                    response_manipulation,
                    cache_json,
                )| {
                    let method = RouteMethod::from_str_loose(&method)?;
                    let protocol = serde_json::from_value(serde_json::Value::String(protocol)).ok()?;
                    let headers = serde_json::from_str(&headers_json).ok()?;
                    let query = serde_json::from_str(&query_json).ok()?;
                    let body = serde_json::from_str(&body_json).ok()?;
                    let variables = serde_json::from_str(&variables_json).ok()?;
                    let cache = serde_json::from_str(&cache_json).ok()?;
                    Some(RouteConfig {
                        slug,
                        method,
                        uri,
                        protocol,
                        upstream_id,
                        headers,
                        query,
                        body,
                        variables,
                        timeout_seconds: timeout_seconds.max(0) as u64,
                        max_retries: max_retries.max(0) as u32,
                        retry_delay_seconds: retry_delay_seconds.max(0) as u64,
                        response_manipulation,
                        cache,
                    })
                },
            )
            .collect::<Vec<_>>();

        Ok((routes, upstreams))
    }
}

#[async_trait]
impl CatalogLoader for SqliteCatalogLoader {
    async fn load_all(&self) -> Result<(Vec<RouteConfig>, Vec<UpstreamConfig>), CatalogError> {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connection.lock();
            SqliteCatalogLoader::load_sync(&conn)
        })
        .await
        .map_err(|e| CatalogError::Storage(e.to_string()))?
    }
}
