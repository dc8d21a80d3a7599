//! Opaque record identity shared by residents and packages.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier assigned by the persistence backend.
///
/// The local backend issues UUID v4 strings. The remote backend issues
/// whatever the server returns, so numeric ids are accepted on read and
/// kept in their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Issues a fresh locally unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns `true` when the id is blank after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => Self::from(value),
            RawId::Number(value) => Self::from(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RecordId;

    #[test]
    fn deserializes_numeric_and_text_ids() {
        let numeric: RecordId = serde_json::from_str("42").unwrap();
        let text: RecordId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "abc");
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }
}
