//! C1: the segment trie. One trie per HTTP method; matching walks segments left to right and
//! prefers literal children over parameter children over the wildcard child.

use std::collections::HashMap;

use crate::error::TrieError;

#[derive(Debug)]
pub struct TrieNode<T> {
    literal_children: HashMap<String, TrieNode<T>>,
    param_child: Option<(String, Box<TrieNode<T>>)>,
    wildcard_child: Option<Box<TrieNode<T>>>,
    terminal: Option<T>,
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        Self {
            literal_children: HashMap::new(),
            param_child: None,
            wildcard_child: None,
            terminal: None,
        }
    }
}

/// Splits a URI pattern or a concrete path into non-empty segments, ignoring a leading or
/// trailing slash.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[derive(Debug)]
pub struct Trie<T> {
    root: TrieNode<T>,
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self {
            root: TrieNode::default(),
        }
    }
}

impl<T> Trie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `payload` at `pattern`. Fails if a parameter name conflicts with one already
    /// registered at the same position, or if the terminal is already occupied.
    pub fn insert(
        &mut self,
        pattern: &str,
        payload: T,
        terminal_label: impl Fn(&T) -> String,
    ) -> Result<(), TrieError> {
        let segments = split_segments(pattern);
        let mut node = &mut self.root;
        for seg in segments {
            if seg == "*" {
                if node.wildcard_child.is_none() {
                    node.wildcard_child = Some(Box::new(TrieNode::default()));
                }
                node = node.wildcard_child.as_mut().unwrap();
            } else if let Some(name) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                match &node.param_child {
                    Some((existing, _)) if existing != name => {
                        return Err(TrieError::ConflictingParam {
                            existing: existing.clone(),
                            new: name.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        node.param_child = Some((name.to_string(), Box::new(TrieNode::default())));
                    }
                }
                node = &mut node.param_child.as_mut().unwrap().1;
            } else {
                node = node
                    .literal_children
                    .entry(seg.to_string())
                    .or_insert_with(TrieNode::default);
            }
        }
        if let Some(existing) = &node.terminal {
            return Err(TrieError::DuplicateTerminal(terminal_label(existing)));
        }
        node.terminal = Some(payload);
        Ok(())
    }

    /// Walks `path`, returning the terminal payload and the bound parameters, or `None` on miss.
    pub fn matches(&self, path: &str) -> Option<(&T, Vec<(String, String)>)> {
        let segments = split_segments(path);
        let mut params = Vec::new();
        Self::walk(&self.root, &segments, &mut params).map(|t| (t, params))
    }

    fn walk<'a>(
        node: &'a TrieNode<T>,
        remaining: &[&str],
        params: &mut Vec<(String, String)>,
    ) -> Option<&'a T> {
        if remaining.is_empty() {
            return node.terminal.as_ref();
        }
        let seg = remaining[0];
        let rest = &remaining[1..];

        if let Some(child) = node.literal_children.get(seg) {
            let snapshot = params.len();
            if let Some(found) = Self::walk(child, rest, params) {
                return Some(found);
            }
            params.truncate(snapshot);
        }

        if let Some((name, child)) = &node.param_child {
            let snapshot = params.len();
            params.push((name.clone(), seg.to_string()));
            if let Some(found) = Self::walk(child, rest, params) {
                return Some(found);
            }
            params.truncate(snapshot);
        }

        if let Some(child) = &node.wildcard_child {
            let snapshot = params.len();
            if let Some(found) = Self::walk(child, rest, params) {
                return Some(found);
            }
            params.truncate(snapshot);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        let mut trie: Trie<String> = Trie::new();
        trie.insert("/users/list", "list-users".to_string(), |t| t.clone())
            .unwrap();
        let (slug, params) = trie.matches("/users/list").unwrap();
        assert_eq!(slug, "list-users");
        assert!(params.is_empty());
    }

    #[test]
    fn parameter_extraction() {
        let mut trie: Trie<String> = Trie::new();
        trie.insert("/users/{id}", "get-user".to_string(), |t| t.clone())
            .unwrap();
        let (slug, params) = trie.matches("/users/42").unwrap();
        assert_eq!(slug, "get-user");
        assert_eq!(params, vec![("id".to_string(), "42".to_string())]);
    }

    #[test]
    fn literal_beats_parameter() {
        let mut trie: Trie<String> = Trie::new();
        trie.insert("/users/{id}", "get-user".to_string(), |t| t.clone())
            .unwrap();
        trie.insert("/users/me", "get-self".to_string(), |t| t.clone())
            .unwrap();
        let (slug, params) = trie.matches("/users/me").unwrap();
        assert_eq!(slug, "get-self");
        assert!(params.is_empty());
    }

    #[test]
    fn parameter_beats_wildcard() {
        let mut trie: Trie<String> = Trie::new();
        trie.insert("/files/*", "catch-all".to_string(), |t| t.clone())
            .unwrap();
        trie.insert("/files/{name}", "named".to_string(), |t| t.clone())
            .unwrap();
        let (slug, _) = trie.matches("/files/report.pdf").unwrap();
        assert_eq!(slug, "named");
    }

    #[test]
    fn conflicting_param_name_rejected() {
        let mut trie: Trie<String> = Trie::new();
        trie.insert("/a/{id}", "one".to_string(), |t| t.clone())
            .unwrap();
        let err = trie.insert("/a/{slug}", "two".to_string(), |t| t.clone());
        assert!(matches!(err, Err(TrieError::ConflictingParam { .. })));
    }

    #[test]
    fn no_match_is_none() {
        let trie: Trie<String> = Trie::new();
        assert!(trie.matches("/nothing").is_none());
    }
}
