//! Per-field validation rules evaluated against a resolved (but not yet encoded) variable value.

use serde_json::Value;

use crate::error::FieldError;
use crate::model::ValidationRules;
use crate::shaping::coerce::normalize_date;

pub fn validate(name: &str, value: &Value, rules: &ValidationRules) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let as_str = value.as_str();

    if let (Some(min), Some(s)) = (rules.min, as_str) {
        if (s.len() as f64) < min {
            errors.push(err(name, "min_length", format!("must be at least {min} characters")));
        }
    }
    if let (Some(max), Some(s)) = (rules.max, as_str) {
        if (s.len() as f64) > max {
            errors.push(err(name, "max_length", format!("must be at most {max} characters")));
        }
    }
    if let (Some(min), Value::Number(n)) = (rules.min, value) {
        if n.as_f64().unwrap_or(0.0) < min {
            errors.push(err(name, "min_value", format!("must be >= {min}")));
        }
    }
    if let (Some(max), Value::Number(n)) = (rules.max, value) {
        if n.as_f64().unwrap_or(0.0) > max {
            errors.push(err(name, "max_value", format!("must be <= {max}")));
        }
    }
    if let (Some(min_items), Value::Array(a)) = (rules.min_items, value) {
        if a.len() < min_items {
            errors.push(err(name, "min_items", format!("must have at least {min_items} items")));
        }
    }
    if let (Some(max_items), Value::Array(a)) = (rules.max_items, value) {
        if a.len() > max_items {
            errors.push(err(name, "max_items", format!("must have at most {max_items} items")));
        }
    }
    if rules.email {
        if !as_str.map(looks_like_email).unwrap_or(false) {
            errors.push(err(name, "email", "must be a valid email address".into()));
        }
    }
    if rules.url {
        if !as_str.map(|s| s.starts_with("http://") || s.starts_with("https://")).unwrap_or(false) {
            errors.push(err(name, "url", "must be a valid URL".into()));
        }
    }
    if rules.uuid {
        if !as_str.map(looks_like_uuid).unwrap_or(false) {
            errors.push(err(name, "uuid", "must be a valid UUID".into()));
        }
    }
    if rules.date {
        if !as_str.map(|s| normalize_date(s).is_some()).unwrap_or(false) {
            errors.push(err(name, "date", "must be a valid date (YYYY-MM-DD or RFC3339)".into()));
        }
    }
    if rules.ip {
        if !as_str
            .map(|s| s.parse::<std::net::IpAddr>().is_ok())
            .unwrap_or(false)
        {
            errors.push(err(name, "ip", "must be a valid IP address".into()));
        }
    }
    if rules.numeric {
        if !as_str.map(|s| s.chars().all(|c| c.is_ascii_digit())).unwrap_or(false) {
            errors.push(err(name, "numeric", "must contain only digits".into()));
        }
    }
    if rules.alpha {
        if !as_str.map(|s| s.chars().all(|c| c.is_ascii_alphabetic())).unwrap_or(false) {
            errors.push(err(name, "alpha", "must contain only letters".into()));
        }
    }
    if rules.alphanumeric {
        if !as_str.map(|s| s.chars().all(|c| c.is_ascii_alphanumeric())).unwrap_or(false) {
            errors.push(err(name, "alphanumeric", "must contain only letters and digits".into()));
        }
    }
    if let Some(pattern) = &rules.pattern {
        let matches = regex::Regex::new(pattern)
            .ok()
            .zip(as_str)
            .map(|(re, s)| re.is_match(s))
            .unwrap_or(false);
        if !matches {
            errors.push(err(name, "pattern", format!("must match pattern {pattern}")));
        }
    }
    if let Some(allowed) = &rules.one_of {
        if !as_str.map(|s| allowed.iter().any(|a| a == s)).unwrap_or(false) {
            errors.push(err(name, "one_of", format!("must be one of {}", allowed.join(", "))));
        }
    }

    errors
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else { return false };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn looks_like_uuid(s: &str) -> bool {
    uuid::Uuid::parse_str(s).is_ok()
}

fn err(_field: &str, code: &str, message: String) -> FieldError {
    FieldError {
        code: code.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_email_rejects_garbage() {
        let rules = ValidationRules { email: true, ..Default::default() };
        let errors = validate("contact", &Value::String("not-an-email".into()), &rules);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "email");
    }

    #[test]
    fn valid_email_passes() {
        let rules = ValidationRules { email: true, ..Default::default() };
        let errors = validate("contact", &Value::String("a@b.com".into()), &rules);
        assert!(errors.is_empty());
    }

    #[test]
    fn min_max_length() {
        let rules = ValidationRules { min: Some(3.0), max: Some(5.0), ..Default::default() };
        assert_eq!(validate("n", &Value::String("ab".into()), &rules).len(), 1);
        assert_eq!(validate("n", &Value::String("abcdef".into()), &rules).len(), 1);
        assert_eq!(validate("n", &Value::String("abcd".into()), &rules).len(), 0);
    }

    #[test]
    fn date_rule_rejects_garbage_and_accepts_plain_and_rfc3339() {
        let rules = ValidationRules { date: true, ..Default::default() };
        let errors = validate("born", &Value::String("not-a-date".into()), &rules);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "date");
        assert!(validate("born", &Value::String("2024-01-15".into()), &rules).is_empty());
        assert!(validate("born", &Value::String("2024-01-15T00:00:00Z".into()), &rules).is_empty());
    }
}
