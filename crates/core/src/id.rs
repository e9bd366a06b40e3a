//! Document identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Opaque identifier of a document inside a collection.
///
/// Identifiers are assigned by the store on creation and never change. Callers
/// must not interpret their contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh identifier.
    ///
    /// Uses UUIDv7 (time-ordered) in its simple form. Prefer passing IDs
    /// explicitly in tests for determinism.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::invalid_id("DocumentId: empty"));
        }
        if s.contains('/') {
            return Err(DomainError::invalid_id(format!(
                "DocumentId: '{s}' contains a path separator"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn parse_rejects_empty_and_paths() {
        assert!(matches!("".parse::<DocumentId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("a/b".parse::<DocumentId>(), Err(DomainError::InvalidId(_))));
        let id: DocumentId = "item-1".parse().unwrap();
        assert_eq!(id.to_string(), "item-1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id: DocumentId = "abc".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn deserialize_applies_parse_rules() {
        let id: DocumentId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert!(serde_json::from_str::<DocumentId>("\"\"").is_err());
        assert!(serde_json::from_str::<DocumentId>("\"a/b\"").is_err());
    }
}
