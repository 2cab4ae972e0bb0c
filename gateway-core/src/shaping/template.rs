//! Two renderers sharing one `{{name}}` placeholder grammar: [`substitute`] is the cheap
//! substituter used for URLs/headers/query/body, and [`manipulate`] is the fuller expression
//! renderer used for `response_manipulation`, which additionally understands dotted-path field
//! access and `|`-piped functions against a decoded JSON tree.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap());

/// Substitutes `{{name}}` placeholders found anywhere inside `template` using `ctx`. A bare
/// `"{{name}}"` whole-string template substitutes the typed value directly (preserving
/// object/array/number/bool shape); a mixed template substitutes the string form. A placeholder
/// with no entry in `ctx` is left as the literal `{{name}}`.
pub fn substitute(template: &Value, ctx: &HashMap<String, Value>) -> Value {
    match template {
        Value::String(s) => substitute_str(s, ctx),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, ctx)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| substitute(v, ctx)).collect()),
        other => other.clone(),
    }
}

fn substitute_str(s: &str, ctx: &HashMap<String, Value>) -> Value {
    if let Some(caps) = PLACEHOLDER.captures(s) {
        if caps.get(0).map(|m| m.as_str()) == Some(s.trim()) && s.trim() == s {
            let name = caps.get(1).unwrap().as_str();
            if let Some(v) = ctx.get(name) {
                return v.clone();
            }
            return Value::String(s.to_string());
        }
    }
    let rendered = PLACEHOLDER.replace_all(s, |caps: &regex::Captures| {
        let name = caps.get(1).unwrap().as_str();
        match ctx.get(name) {
            Some(Value::String(v)) => v.clone(),
            Some(other) => other.to_string(),
            None => caps.get(0).unwrap().as_str().to_string(),
        }
    });
    Value::String(rendered.into_owned())
}

/// True if `{{name}}` (whitespace inside the braces tolerated) appears anywhere in `template`.
/// Used to infer which part of a route's config a variable is bound from, rather than guessing
/// off a fixed precedence over the inbound request.
pub(crate) fn references(template: &Value, name: &str) -> bool {
    match template {
        Value::String(s) => PLACEHOLDER
            .captures_iter(s)
            .any(|c| c.get(1).map(|m| m.as_str()) == Some(name)),
        Value::Object(map) => map.values().any(|v| references(v, name)),
        Value::Array(arr) => arr.iter().any(|v| references(v, name)),
        _ => false,
    }
}

/// Renders `template` against `data_root`, resolving dotted-path field access and a small set of
/// piped functions (`upper`, `lower`, `default(x)`, `join(sep)`). The rendered text is expected
/// to parse as JSON once fully substituted.
pub fn manipulate(template: &str, data_root: &Value) -> Result<Value, String> {
    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
        let expr = caps.get(1).unwrap().as_str();
        render_expr(expr, data_root)
    });
    serde_json::from_str(rendered.as_ref())
        .map_err(|e| format!("rendered manipulation template is not valid JSON: {e}"))
}

fn render_expr(expr: &str, data_root: &Value) -> String {
    let mut parts = expr.split('|').map(str::trim);
    let path = parts.next().unwrap_or("");
    let mut value = resolve_path(path, data_root).unwrap_or(Value::Null);
    for pipe in parts {
        value = apply_pipe(pipe, value);
    }
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn resolve_path<'a>(path: &str, root: &'a Value) -> Option<Value> {
    let mut current = root.clone();
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        current = if let Ok(idx) = segment.parse::<usize>() {
            current.get(idx)?.clone()
        } else {
            current.get(segment)?.clone()
        };
    }
    Some(current)
}

fn apply_pipe(pipe: &str, value: Value) -> Value {
    let as_str = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if pipe == "upper" {
        return Value::String(as_str(&value).to_uppercase());
    }
    if pipe == "lower" {
        return Value::String(as_str(&value).to_lowercase());
    }
    if let Some(arg) = pipe.strip_prefix("default(").and_then(|s| s.strip_suffix(')')) {
        if value.is_null() {
            return Value::String(arg.trim_matches('"').to_string());
        }
        return value;
    }
    if let Some(sep) = pipe.strip_prefix("join(").and_then(|s| s.strip_suffix(')')) {
        if let Value::Array(items) = &value {
            let sep = sep.trim_matches('"');
            let joined = items
                .iter()
                .map(|v| as_str(v))
                .collect::<Vec<_>>()
                .join(sep);
            return Value::String(joined);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_string_placeholder_preserves_type() {
        let mut ctx = HashMap::new();
        ctx.insert("age".to_string(), json!(30));
        let out = substitute(&json!("{{age}}"), &ctx);
        assert_eq!(out, json!(30));
    }

    #[test]
    fn mixed_string_placeholder_is_stringified() {
        let mut ctx = HashMap::new();
        ctx.insert("name".to_string(), json!("Ada"));
        let out = substitute(&json!("Hello {{name}}"), &ctx);
        assert_eq!(out, json!("Hello Ada"));
    }

    #[test]
    fn unresolved_placeholder_left_literal() {
        let ctx = HashMap::new();
        let out = substitute(&json!("{{missing}}"), &ctx);
        assert_eq!(out, json!("{{missing}}"));
    }

    #[test]
    fn manipulate_dotted_path_and_pipe() {
        let data = json!({"user": {"name": "ada"}});
        let out = manipulate(r#"{"greeting": "{{user.name | upper}}"}"#, &data).unwrap();
        assert_eq!(out, json!({"greeting": "ADA"}));
    }

    #[test]
    fn references_finds_placeholder_nested_in_object() {
        let tmpl = json!({"Authorization": "Bearer {{token}}", "x-other": "{{other}}"});
        assert!(references(&tmpl, "token"));
        assert!(!references(&tmpl, "missing"));
    }
}
