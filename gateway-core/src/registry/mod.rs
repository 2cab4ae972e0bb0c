//! C2: the route registry. Owns the authoritative in-memory route set and the side table of
//! upstreams, and exposes atomic refresh and read-only lookups.

pub mod trie;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::CatalogLoader;
use crate::model::{RouteConfig, RouteMethod, UpstreamConfig};
use trie::Trie;

/// What a successful trie walk resolves to: the route record plus bookkeeping needed by the
/// dispatcher without a second lookup.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub route: Arc<RouteConfig>,
}

pub enum MatchOutcome {
    Matched {
        entry: Arc<RouteEntry>,
        params: Vec<(String, String)>,
    },
    NotFound,
    MethodNotAllowed,
}

struct RegistrySnapshot {
    by_method: HashMap<RouteMethod, Trie<Arc<RouteEntry>>>,
    by_slug: HashMap<String, Arc<RouteConfig>>,
    upstreams: HashMap<String, Arc<UpstreamConfig>>,
}

impl RegistrySnapshot {
    fn empty() -> Self {
        Self {
            by_method: HashMap::new(),
            by_slug: HashMap::new(),
            upstreams: HashMap::new(),
        }
    }

    /// True if some method's trie matches `path`, used to tell a path miss apart from a method
    /// miss once the requested method's own trie has already failed to match.
    fn any_method_matches(&self, path: &str) -> bool {
        self.by_method.values().any(|trie| trie.matches(path).is_some())
    }
}

pub struct Registry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::empty())),
        }
    }

    pub fn lookup(&self, method: RouteMethod, path: &str) -> MatchOutcome {
        let snapshot = self.snapshot.read().clone();
        if let Some(trie) = snapshot.by_method.get(&method) {
            if let Some((entry, params)) = trie.matches(path) {
                return MatchOutcome::Matched {
                    entry: entry.clone(),
                    params,
                };
            }
        }
        if snapshot.any_method_matches(path) {
            MatchOutcome::MethodNotAllowed
        } else {
            MatchOutcome::NotFound
        }
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<Arc<RouteConfig>> {
        self.snapshot.read().by_slug.get(slug).cloned()
    }

    pub fn upstream(&self, upstream_id: &str) -> Option<Arc<UpstreamConfig>> {
        self.snapshot.read().upstreams.get(upstream_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.snapshot.read().by_slug.len()
    }

    pub fn list_slugs(&self) -> Vec<String> {
        self.snapshot.read().by_slug.keys().cloned().collect()
    }

    /// Fully rebuilds the registry off to the side, then swaps it in under the writer lock. A
    /// loader error leaves the live registry untouched; a per-row parse/insert error skips that
    /// row and logs it.
    pub async fn refresh_all(&self, loader: &dyn CatalogLoader) -> Result<(), String> {
        let (routes, upstreams) = loader.load_all().await.map_err(|e| e.to_string())?;

        let mut upstream_table = HashMap::new();
        for u in upstreams {
            if u.is_active {
                upstream_table.insert(u.id.clone(), Arc::new(u));
            }
        }

        let mut by_method: HashMap<RouteMethod, Trie<Arc<RouteEntry>>> = HashMap::new();
        let mut by_slug = HashMap::new();

        for route in routes {
            if !upstream_table.contains_key(&route.upstream_id) {
                tracing::warn!(slug = %route.slug, "skipping route with missing or inactive upstream");
                continue;
            }
            let slug = route.slug.clone();
            let uri = route.uri.clone();
            let method = route.method.dispatch_bucket();
            let route_arc = Arc::new(route);
            let entry = Arc::new(RouteEntry {
                route: route_arc.clone(),
            });
            let trie = by_method.entry(method).or_insert_with(Trie::new);
            if let Err(e) = trie.insert(&uri, entry, |e| e.route.slug.clone()) {
                tracing::warn!(slug = %slug, error = %e, "skipping route: trie insert failed");
                continue;
            }
            by_slug.insert(slug, route_arc);
        }

        let new_snapshot = Arc::new(RegistrySnapshot {
            by_method,
            by_slug,
            upstreams: upstream_table,
        });

        *self.snapshot.write() = new_snapshot;
        Ok(())
    }

    /// Re-fetches a single route by slug and replaces (or removes) its terminal. Falls back to a
    /// full rebuild, which is still atomic and simple to reason about; a future optimization can
    /// special-case the common "unchanged (method, uri)" path.
    pub async fn refresh_one(&self, _slug: &str, loader: &dyn CatalogLoader) -> Result<(), String> {
        self.refresh_all(loader).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::model::{CachePolicy, Protocol};
    use async_trait::async_trait;

    struct FakeLoader {
        routes: Vec<RouteConfig>,
        upstreams: Vec<UpstreamConfig>,
    }

    #[async_trait]
    impl CatalogLoader for FakeLoader {
        async fn load_all(&self) -> Result<(Vec<RouteConfig>, Vec<UpstreamConfig>), CatalogError> {
            Ok((self.routes.clone(), self.upstreams.clone()))
        }
    }

    fn sample_route(slug: &str, method: RouteMethod, uri: &str, upstream_id: &str) -> RouteConfig {
        RouteConfig {
            slug: slug.to_string(),
            method,
            uri: uri.to_string(),
            protocol: Protocol::Http,
            upstream_id: upstream_id.to_string(),
            headers: serde_json::json!({}),
            query: serde_json::json!({}),
            body: serde_json::json!({}),
            variables: HashMap::new(),
            timeout_seconds: 5,
            max_retries: 0,
            retry_delay_seconds: 0,
            response_manipulation: None,
            cache: CachePolicy::default(),
        }
    }

    fn sample_upstream(id: &str) -> UpstreamConfig {
        UpstreamConfig {
            id: id.to_string(),
            name: "svc".to_string(),
            protocol: Protocol::Http,
            base_url: "http://localhost:9000".to_string(),
            tls_enabled: false,
            grpc_service: None,
            grpc_descriptor_set: None,
            auth: Default::default(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn refresh_then_match_roundtrips() {
        let registry = Registry::new();
        let loader = FakeLoader {
            routes: vec![sample_route("get-user", RouteMethod::Get, "/users/{id}", "up-1")],
            upstreams: vec![sample_upstream("up-1")],
        };
        registry.refresh_all(&loader).await.unwrap();
        assert_eq!(registry.count(), 1);
        match registry.lookup(RouteMethod::Get, "/users/7") {
            MatchOutcome::Matched { entry, params } => {
                assert_eq!(entry.route.slug, "get-user");
                assert_eq!(params, vec![("id".to_string(), "7".to_string())]);
            }
            _ => panic!("expected match"),
        }
    }

    #[tokio::test]
    async fn missing_upstream_excludes_route() {
        let registry = Registry::new();
        let loader = FakeLoader {
            routes: vec![sample_route("get-user", RouteMethod::Get, "/users/{id}", "missing")],
            upstreams: vec![],
        };
        registry.refresh_all(&loader).await.unwrap();
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn method_not_allowed_when_path_known_under_other_method() {
        let registry = Registry::new();
        let loader = FakeLoader {
            routes: vec![sample_route("get-user", RouteMethod::Get, "/users/{id}", "up-1")],
            upstreams: vec![sample_upstream("up-1")],
        };
        registry.refresh_all(&loader).await.unwrap();
        match registry.lookup(RouteMethod::Post, "/users/7") {
            MatchOutcome::MethodNotAllowed => {}
            _ => panic!("expected method not allowed"),
        }
    }

    #[tokio::test]
    async fn grpc_route_is_reachable_under_the_post_bucket() {
        let registry = Registry::new();
        let mut route = sample_route("describe-user", RouteMethod::Grpc, "/user.Users/Describe", "up-1");
        route.protocol = Protocol::Grpc;
        let loader = FakeLoader {
            routes: vec![route],
            upstreams: vec![sample_upstream("up-1")],
        };
        registry.refresh_all(&loader).await.unwrap();
        // Real gRPC calls arrive as an HTTP/2 POST; the route must be keyed so that verb finds it.
        match registry.lookup(RouteMethod::Post, "/user.Users/Describe") {
            MatchOutcome::Matched { entry, .. } => assert_eq!(entry.route.slug, "describe-user"),
            _ => panic!("expected grpc route to match under the POST bucket"),
        }
    }
}
