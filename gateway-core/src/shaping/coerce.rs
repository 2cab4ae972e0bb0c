//! Type coercion for resolved variable values, per the `data_type` declared on a `VariableSpec`.
//! Invalid input fails closed to the type's zero value rather than erroring the whole request.

use serde_json::Value;

use crate::model::DataType;

pub fn coerce(raw: &str, data_type: &DataType) -> Value {
    match data_type {
        DataType::String => Value::String(raw.to_string()),
        DataType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::from(0)),
        DataType::Number => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::from(0)),
        DataType::Boolean => Value::Bool(matches!(
            raw.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        )),
        DataType::Object => serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Default::default())),
        DataType::Array => serde_json::from_str(raw).unwrap_or_else(|_| Value::Array(Vec::new())),
        DataType::Date => normalize_date(raw)
            .map(Value::String)
            .unwrap_or(Value::Null),
        DataType::Null => Value::Null,
    }
}

/// Accepts `YYYY-MM-DD` or RFC3339 and normalizes to RFC3339.
pub(crate) fn normalize_date(raw: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0)?;
        return Some(chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(dt, chrono::Utc).to_rfc3339());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_fails_closed_to_zero() {
        assert_eq!(coerce("not-a-number", &DataType::Integer), Value::from(0));
        assert_eq!(coerce("42", &DataType::Integer), Value::from(42));
    }

    #[test]
    fn boolean_variants() {
        assert_eq!(coerce("yes", &DataType::Boolean), Value::Bool(true));
        assert_eq!(coerce("no", &DataType::Boolean), Value::Bool(false));
        assert_eq!(coerce("", &DataType::Boolean), Value::Bool(false));
    }

    #[test]
    fn date_from_plain_date() {
        let v = coerce("2024-01-15", &DataType::Date);
        assert!(v.as_str().unwrap().starts_with("2024-01-15"));
    }
}
