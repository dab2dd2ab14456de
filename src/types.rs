//! Core types for the record facade.

use crate::error::RecordError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of hex characters in a row identifier.
pub const IDENTIFIER_LEN: usize = 32;

/// Storage format for date-time field values.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format for date field values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unique key of a row (128 bits, rendered as 32 lowercase hex characters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(pub [u8; 16]);

impl Identifier {
    /// Derive an identifier from arbitrary seed bytes.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Identifier(bytes)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string. Only the canonical lowercase form is accepted.
    pub fn from_hex(s: &str) -> Option<Self> {
        if !Self::is_eligible(s) {
            return None;
        }
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 16] = bytes.try_into().ok()?;
        Some(Identifier(arr))
    }

    /// Whether `s` has the surface syntax of an identifier.
    pub fn is_eligible(s: &str) -> bool {
        s.len() == IDENTIFIER_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// One entry of an append-only journal field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub value: String,
    pub created: Timestamp,
}

/// Typed representation of a field value, for types that have one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RichValue {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl RichValue {
    /// Parse a raw stored value according to a schema type tag.
    ///
    /// Returns `None` for types without a richer representation and for
    /// values that do not parse.
    pub fn parse(internal_type: &str, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match internal_type {
            "glide_date_time" | "due_date" => NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
                .ok()
                .map(RichValue::DateTime),
            "glide_date" => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .map(RichValue::Date),
            "integer" | "longint" => raw.parse().ok().map(RichValue::Integer),
            "decimal" | "float" => raw.parse().ok().map(RichValue::Decimal),
            "boolean" => match raw {
                "true" | "1" => Some(RichValue::Boolean(true)),
                "false" | "0" => Some(RichValue::Boolean(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// What a label lookup refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelQuery {
    /// The table label in singular form.
    Table,
    /// The table label in plural form.
    TablePlural,
    /// The label of one field.
    Field(String),
}

impl From<bool> for LabelQuery {
    fn from(plural: bool) -> Self {
        if plural {
            LabelQuery::TablePlural
        } else {
            LabelQuery::Table
        }
    }
}

impl From<&str> for LabelQuery {
    fn from(field: &str) -> Self {
        LabelQuery::Field(field.to_string())
    }
}

impl From<String> for LabelQuery {
    fn from(field: String) -> Self {
        LabelQuery::Field(field)
    }
}

impl TryFrom<&serde_json::Value> for LabelQuery {
    type Error = RecordError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(plural) => Ok((*plural).into()),
            serde_json::Value::String(field) => Ok(field.as_str().into()),
            other => Err(RecordError::validation(
                "RecordFacade::label",
                format!("label argument must be a boolean or a field name, got {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_roundtrip() {
        let id = Identifier::from_seed(b"task:1");
        let hex = id.to_hex();
        assert_eq!(hex.len(), IDENTIFIER_LEN);
        assert_eq!(Identifier::from_hex(&hex), Some(id));
    }

    #[test]
    fn test_identifier_rejects_uppercase_and_length() {
        assert!(!Identifier::is_eligible("B3AF7471C31A6A90108C78EDD40131AA"));
        assert!(!Identifier::is_eligible("b3af7471"));
        assert!(!Identifier::is_eligible("z3af7471c31a6a90108c78edd40131aa"));
        assert!(Identifier::is_eligible("b3af7471c31a6a90108c78edd40131aa"));
    }

    #[test]
    fn test_rich_value_parse() {
        assert_eq!(
            RichValue::parse("glide_date", "2024-02-29"),
            Some(RichValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(RichValue::parse("integer", " 42 "), Some(RichValue::Integer(42)));
        assert_eq!(RichValue::parse("boolean", "1"), Some(RichValue::Boolean(true)));
        assert_eq!(RichValue::parse("string", "hello"), None);
        assert_eq!(RichValue::parse("glide_date_time", ""), None);
        assert_eq!(RichValue::parse("glide_date_time", "yesterday"), None);
    }

    #[test]
    fn test_label_query_from_json() {
        assert_eq!(
            LabelQuery::try_from(&json!(true)).unwrap(),
            LabelQuery::TablePlural
        );
        assert_eq!(
            LabelQuery::try_from(&json!("name")).unwrap(),
            LabelQuery::Field("name".into())
        );
        assert!(LabelQuery::try_from(&json!(42)).is_err());
        assert!(LabelQuery::try_from(&json!(null)).is_err());
    }
}
