//! Fingerprint cache keys: a SHA-256 digest over a canonical serialization of everything that
//! distinguishes two cacheable requests to the same route.

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(pub String);

pub struct CacheKeyInput<'a> {
    pub slug: &'a str,
    pub query: &'a std::collections::HashMap<String, String>,
    pub whitelisted_headers: &'a std::collections::HashMap<String, String>,
    pub body: &'a serde_json::Value,
    pub path_params: &'a std::collections::HashMap<String, String>,
}

pub fn derive(input: &CacheKeyInput) -> CacheKey {
    let mut query: Vec<_> = input.query.iter().collect();
    query.sort_by(|a, b| a.0.cmp(b.0));

    let mut headers: Vec<_> = input.whitelisted_headers.iter().collect();
    headers.sort_by(|a, b| a.0.cmp(b.0));

    let mut params: Vec<_> = input.path_params.iter().collect();
    params.sort_by(|a, b| a.0.cmp(b.0));

    let canonical_body = canonicalize(input.body);

    let mut hasher = Sha256::new();
    hasher.update(input.slug.as_bytes());
    hasher.update(b"\0");
    for (k, v) in query {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }
    hasher.update(b"\0");
    for (k, v) in headers {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }
    hasher.update(b"\0");
    hasher.update(canonical_body.as_bytes());
    hasher.update(b"\0");
    for (k, v) in params {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }

    let digest = hasher.finalize();
    CacheKey(format!("{}:{}", input.slug, hex::encode(digest)))
}

/// Serializes a JSON value with object keys sorted, so the cache key is stable regardless of the
/// insertion order the caller's JSON happened to use.
fn canonicalize(value: &serde_json::Value) -> String {
    fn sort(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                let mut sorted: std::collections::BTreeMap<String, serde_json::Value> = Default::default();
                for (k, v) in map {
                    sorted.insert(k.clone(), sort(v));
                }
                serde_json::to_value(sorted).unwrap_or(serde_json::Value::Null)
            }
            serde_json::Value::Array(arr) => serde_json::Value::Array(arr.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn key_is_stable_under_map_insertion_order() {
        let mut q1 = HashMap::new();
        q1.insert("b".to_string(), "2".to_string());
        q1.insert("a".to_string(), "1".to_string());
        let mut q2 = HashMap::new();
        q2.insert("a".to_string(), "1".to_string());
        q2.insert("b".to_string(), "2".to_string());

        let empty = HashMap::new();
        let body = serde_json::json!({});

        let k1 = derive(&CacheKeyInput {
            slug: "get-user",
            query: &q1,
            whitelisted_headers: &empty,
            body: &body,
            path_params: &empty,
        });
        let k2 = derive(&CacheKeyInput {
            slug: "get-user",
            query: &q2,
            whitelisted_headers: &empty,
            body: &body,
            path_params: &empty,
        });
        assert_eq!(k1, k2);
    }

    #[test]
    fn different_slug_different_key() {
        let empty = HashMap::new();
        let body = serde_json::json!(null);
        let k1 = derive(&CacheKeyInput {
            slug: "a",
            query: &empty,
            whitelisted_headers: &empty,
            body: &body,
            path_params: &empty,
        });
        let k2 = derive(&CacheKeyInput {
            slug: "b",
            query: &empty,
            whitelisted_headers: &empty,
            body: &body,
            path_params: &empty,
        });
        assert_ne!(k1, k2);
    }
}
