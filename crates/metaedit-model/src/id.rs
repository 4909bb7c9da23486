//! Record identifiers.
//!
//! A [`ModelId`] addresses one record across providers and has a canonical
//! string form used by request parameters and the clipboard:
//!
//! - integer ids are written bare: `tl_page::42`
//! - string ids are written as JSON strings: `tl_news::"intro-2024"`

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char as pchar, digit1},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{pair, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;

/// The id of a record within its provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Convert a property value into an id. Only integers and strings qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }

    /// `0` (or `"0"`) addresses the virtual tree root in paste requests.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(i) => *i == 0,
            Self::Str(s) => s == "0",
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Identity of a record: `(provider name, id)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId {
    provider: String,
    id: RecordId,
}

impl ModelId {
    pub fn new(provider: impl Into<String>, id: impl Into<RecordId>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Canonical `provider::id` form.
    pub fn serialized(&self) -> String {
        match &self.id {
            RecordId::Int(i) => format!("{}::{i}", self.provider),
            RecordId::Str(s) => format!("{}::{}", self.provider, Value::from(s.as_str())),
        }
    }

    pub fn from_serialized(text: &str) -> Result<Self, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidModelId {
            raw: text.to_string(),
            reason: reason.to_string(),
        };

        let (rest, provider) =
            provider_prefix(text).map_err(|_| invalid("expected `<provider>::<id>`"))?;
        if provider.is_empty() {
            return Err(invalid("provider name is empty"));
        }

        if let Ok((_, int)) = all_consuming(integer_id)(rest) {
            return Ok(Self::new(provider, int));
        }
        match serde_json::from_str::<String>(rest) {
            Ok(s) => Ok(Self::new(provider, RecordId::Str(s))),
            Err(_) => Err(invalid("id must be an integer or a JSON string")),
        }
    }
}

fn provider_prefix(input: &str) -> IResult<&str, &str> {
    terminated(take_until("::"), tag("::"))(input)
}

fn integer_id(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(alt((pchar('-'), pchar('+')))), digit1)), |s: &str| {
        s.parse::<i64>()
    })(input)
}

impl Display for ModelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialized())
    }
}

impl FromStr for ModelId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_serialized(s)
    }
}

impl Serialize for ModelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.serialized())
    }
}

impl<'de> Deserialize<'de> for ModelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_serialized(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_serialize_bare() {
        let id = ModelId::new("tl_page", 42);
        assert_eq!(id.serialized(), "tl_page::42");
        assert_eq!(ModelId::from_serialized("tl_page::42").unwrap(), id);
    }

    #[test]
    fn string_ids_serialize_as_json_strings() {
        let id = ModelId::new("tl_news", "intro::2024");
        assert_eq!(id.serialized(), "tl_news::\"intro::2024\"");
        assert_eq!(ModelId::from_serialized(&id.serialized()).unwrap(), id);
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["tl_page", "::1", "tl_page::abc", "tl_page::"] {
            let err = ModelId::from_serialized(raw).expect_err(raw);
            assert!(matches!(err, ModelError::InvalidModelId { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn zero_is_the_root_sentinel() {
        assert!(ModelId::from_serialized("tl_page::0").unwrap().id().is_zero());
        assert!(RecordId::from("0").is_zero());
        assert!(!RecordId::from(7).is_zero());
    }

    #[test]
    fn model_id_serde_uses_canonical_string() {
        let id = ModelId::new("tl_page", 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"tl_page::3\"");
        let back: ModelId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
