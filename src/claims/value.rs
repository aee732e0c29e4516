// src/claims/value.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A flat claims bag as carried in a token payload, keyed by claim name or claim URI.
pub type ClaimMap = BTreeMap<String, ClaimValue>;

/// The value of a single claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<ClaimValue>),
    Map(ClaimMap),
}

impl ClaimValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// `true` for values that carry no information: null, `false`, zero,
    /// the empty string and empty lists or maps.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Number(n) => n.as_f64() == Some(0.0),
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
        }
    }
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => {
                let rendered = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_values_map_onto_the_closed_union() {
        let claims: ClaimMap = serde_json::from_value(json!({
            "iss": "https://api.byu.edu",
            "exp": 1489768173,
            "nothing": null,
            "flag": true,
            "aud": ["a", "b"],
            "nested": { "inner": "value" }
        }))
        .unwrap();

        assert_eq!(claims["iss"], ClaimValue::from("https://api.byu.edu"));
        assert_eq!(claims["exp"].as_i64(), Some(1489768173));
        assert_eq!(claims["nothing"], ClaimValue::Null);
        assert_eq!(claims["flag"], ClaimValue::Bool(true));
        assert_eq!(
            claims["aud"],
            ClaimValue::List(vec![ClaimValue::from("a"), ClaimValue::from("b")])
        );
        match &claims["nested"] {
            ClaimValue::Map(inner) => assert_eq!(inner["inner"].as_str(), Some("value")),
            other => panic!("expected a map, got {other:?}"),
        }
    }

    #[test]
    fn blank_values() {
        assert!(ClaimValue::Null.is_blank());
        assert!(ClaimValue::from("").is_blank());
        assert!(ClaimValue::from(0).is_blank());
        assert!(!ClaimValue::from(" ").is_blank());
        assert!(!ClaimValue::from(1489768173).is_blank());
    }

    #[test]
    fn display_renders_strings_bare() {
        assert_eq!(ClaimValue::from("https://api.byu.edu").to_string(), "https://api.byu.edu");
        assert_eq!(ClaimValue::from(42).to_string(), "42");
        assert_eq!(ClaimValue::Null.to_string(), "null");
    }
}
