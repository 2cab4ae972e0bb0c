//! Encoding transforms applied to a resolved, coerced variable value.

use base64::Engine;
use serde_json::Value;

use crate::model::Encoding;

pub fn apply(value: Value, encoding: &Encoding) -> Value {
    match encoding {
        Encoding::None => value,
        Encoding::Base64 => Value::String(
            base64::engine::general_purpose::STANDARD.encode(value_to_bytes(&value)),
        ),
        Encoding::BasicAuth => {
            let raw = value_as_string(&value);
            let encoded = base64::engine::general_purpose::STANDARD.encode(raw.as_bytes());
            Value::String(format!("Basic {encoded}"))
        }
        Encoding::Urlencode => Value::String(
            percent_encoding::utf8_percent_encode(&value_as_string(&value), percent_encoding::NON_ALPHANUMERIC)
                .to_string(),
        ),
        // A JWT-encoded variable is expected to already carry a signed token as its literal
        // value; there is nothing further to transform here.
        Encoding::Jwt => value,
    }
}

fn value_to_bytes(value: &Value) -> Vec<u8> {
    value_as_string(value).into_bytes()
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
