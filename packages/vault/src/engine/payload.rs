//! Write payload schema
//!
//! Request data arrives as loosely typed JSON. It is checked here, once,
//! before any key is generated or any storage is touched.

use super::config::EngineConfig;
use super::id::EngineId;
use crate::error::{VaultError, VaultResult};
use serde_json::Value;

/// Default allowed subject, issuer and audience
pub const DEFAULT_PRINCIPAL: &str = "vault";

/// Default token lifetime in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Longest accepted token lifetime in seconds
pub const MAX_TTL_SECS: u64 = i32::MAX as u64;

const FIELD_SUBJECTS: &str = "allowed_subjects";
const FIELD_ISSUER: &str = "issuer";
const FIELD_AUDIENCE: &str = "audience";
const FIELD_TTL: &str = "ttl";

/// Validated fields of a create/update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfigPayload {
    /// Identities allowed to read the engine
    pub allowed_subjects: Vec<String>,
    /// Token issuer
    pub issuer: String,
    /// Token audience
    pub audience: String,
    /// Token lifetime in seconds
    pub ttl: u64,
}

impl Default for EngineConfigPayload {
    fn default() -> Self {
        Self {
            allowed_subjects: vec![DEFAULT_PRINCIPAL.to_string()],
            issuer: DEFAULT_PRINCIPAL.to_string(),
            audience: DEFAULT_PRINCIPAL.to_string(),
            ttl: DEFAULT_TTL_SECS,
        }
    }
}

impl EngineConfigPayload {
    /// Build a payload from typed values
    pub fn new<S: Into<String>>(
        allowed_subjects: impl IntoIterator<Item = S>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl: u64,
    ) -> VaultResult<Self> {
        if ttl > MAX_TTL_SECS {
            return Err(VaultError::validation(
                FIELD_TTL,
                format!("must not exceed {MAX_TTL_SECS} seconds"),
            ));
        }
        Ok(Self {
            allowed_subjects: allowed_subjects.into_iter().map(Into::into).collect(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl,
        })
    }

    /// Validate raw request data
    ///
    /// Field names are matched case-insensitively and `expiration` is
    /// accepted for `ttl`. Absent or null fields take their defaults.
    pub fn from_value(data: &Value) -> VaultResult<Self> {
        let fields = match data {
            Value::Object(fields) => fields,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(VaultError::validation(
                    "payload",
                    format!("expected an object, got {}", type_name(other)),
                ));
            }
        };

        let mut payload = Self::default();
        let mut seen: Vec<&'static str> = Vec::with_capacity(4);

        for (name, value) in fields {
            let field = canonical_field(name)
                .ok_or_else(|| VaultError::validation(name.as_str(), "unknown field"))?;

            if seen.contains(&field) {
                return Err(VaultError::validation(field, "specified more than once"));
            }
            seen.push(field);

            if value.is_null() {
                continue;
            }

            match field {
                FIELD_SUBJECTS => payload.allowed_subjects = parse_subjects(value)?,
                FIELD_ISSUER => payload.issuer = parse_string(FIELD_ISSUER, value)?,
                FIELD_AUDIENCE => payload.audience = parse_string(FIELD_AUDIENCE, value)?,
                _ => payload.ttl = parse_ttl(value)?,
            }
        }

        Ok(payload)
    }

    /// Attach the payload to an engine id
    pub fn into_config(self, id: &EngineId) -> EngineConfig {
        EngineConfig {
            id: id.clone(),
            allowed_subjects: self.allowed_subjects,
            issuer: self.issuer,
            audience: self.audience,
            ttl: self.ttl,
        }
    }
}

fn canonical_field(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        FIELD_SUBJECTS => Some(FIELD_SUBJECTS),
        FIELD_ISSUER => Some(FIELD_ISSUER),
        FIELD_AUDIENCE => Some(FIELD_AUDIENCE),
        FIELD_TTL | "expiration" => Some(FIELD_TTL),
        _ => None,
    }
}

fn parse_subjects(value: &Value) -> VaultResult<Vec<String>> {
    match value {
        Value::String(joined) => Ok(joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(VaultError::validation(
                    FIELD_SUBJECTS,
                    format!("entry {i} must be a string, got {}", type_name(other)),
                )),
            })
            .collect(),
        other => Err(VaultError::validation(
            FIELD_SUBJECTS,
            format!(
                "must be a list of strings or a comma-separated string, got {}",
                type_name(other)
            ),
        )),
    }
}

fn parse_string(field: &'static str, value: &Value) -> VaultResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        VaultError::validation(field, format!("must be a string, got {}", type_name(value)))
    })
}

fn parse_ttl(value: &Value) -> VaultResult<u64> {
    let ttl = match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            VaultError::validation(FIELD_TTL, format!("must be a non-negative integer, got {n}"))
        })?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VaultError::validation(
                    FIELD_TTL,
                    format!("must be a non-negative integer, got '{s}'"),
                ));
            }
            s.parse::<u64>().map_err(|_| {
                VaultError::validation(FIELD_TTL, format!("must not exceed {MAX_TTL_SECS} seconds"))
            })?
        }
        other => {
            return Err(VaultError::validation(
                FIELD_TTL,
                format!("must be an integer, got {}", type_name(other)),
            ));
        }
    };

    if ttl > MAX_TTL_SECS {
        return Err(VaultError::validation(
            FIELD_TTL,
            format!("must not exceed {MAX_TTL_SECS} seconds"),
        ));
    }
    Ok(ttl)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_of(err: VaultError) -> String {
        match err {
            VaultError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let payload = EngineConfigPayload::from_value(&json!({})).unwrap();
        assert_eq!(payload, EngineConfigPayload::default());
        assert_eq!(payload.allowed_subjects, vec!["vault"]);
        assert_eq!(payload.ttl, 3600);

        assert_eq!(
            EngineConfigPayload::from_value(&Value::Null).unwrap(),
            EngineConfigPayload::default()
        );
    }

    #[test]
    fn test_full_payload() {
        let payload = EngineConfigPayload::from_value(&json!({
            "allowed_subjects": ["bob", "alice"],
            "issuer": "https://issuer.example",
            "audience": "payments",
            "ttl": 60
        }))
        .unwrap();
        assert_eq!(payload.allowed_subjects, vec!["bob", "alice"]);
        assert_eq!(payload.issuer, "https://issuer.example");
        assert_eq!(payload.audience, "payments");
        assert_eq!(payload.ttl, 60);
    }

    #[test]
    fn test_case_insensitive_names_and_expiration_alias() {
        let payload = EngineConfigPayload::from_value(&json!({
            "AllOWED_subjects": "bob, carol ,,",
            "Issuer": "i",
            "EXPIRATION": "120"
        }))
        .unwrap();
        assert_eq!(payload.allowed_subjects, vec!["bob", "carol"]);
        assert_eq!(payload.issuer, "i");
        assert_eq!(payload.ttl, 120);
    }

    #[test]
    fn test_type_mismatch_names_field() {
        let cases = [
            (json!({"allowed_subjects": 5}), "allowed_subjects"),
            (json!({"allowed_subjects": ["ok", 1]}), "allowed_subjects"),
            (json!({"issuer": 1}), "issuer"),
            (json!({"audience": ["a"]}), "audience"),
            (json!({"ttl": "abc"}), "ttl"),
            (json!({"ttl": -1}), "ttl"),
            (json!({"ttl": 1.5}), "ttl"),
            (json!({"ttl": true}), "ttl"),
            (json!({"ttl": 3_000_000_000u64}), "ttl"),
            (json!({"colour": "red"}), "colour"),
            (json!({"ttl": 1, "expiration": 2}), "ttl"),
        ];
        for (data, field) in cases {
            let err = EngineConfigPayload::from_value(&data).unwrap_err();
            assert_eq!(field_of(err), field, "payload {data}");
        }
    }

    #[test]
    fn test_non_object_payload() {
        let err = EngineConfigPayload::from_value(&json!(["bob"])).unwrap_err();
        assert_eq!(field_of(err), "payload");
    }

    #[test]
    fn test_new_caps_ttl() {
        assert!(EngineConfigPayload::new(["bob"], "i", "a", MAX_TTL_SECS).is_ok());
        assert!(EngineConfigPayload::new(["bob"], "i", "a", MAX_TTL_SECS + 1).is_err());
    }

    #[test]
    fn test_into_config() {
        let id = EngineId::new("payments").unwrap();
        let config = EngineConfigPayload::default().into_config(&id);
        assert_eq!(config.id, id);
        assert_eq!(config.issuer, "vault");
    }
}
