//! Strongly-typed identifier wrappers to prevent accidental misuse of strings.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque handle the plugin host assigns to one button instance.
///
/// Uses `Arc<str>` internally so cloning into every broadcast is an atomic
/// increment instead of a heap allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextId(Arc<str>);

impl ContextId {
    /// Create a new ContextId from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContextId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContextId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for ContextId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ContextId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Serialize for ContextId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContextId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ContextId::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_id_roundtrips_as_plain_string() {
        let id = ContextId::from("A1B2C3");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"A1B2C3\"");
        let back: ContextId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn context_id_compares_with_str() {
        let id = ContextId::new("ctx");
        assert_eq!(id, "ctx");
        assert_eq!(id.to_string(), "ctx");
    }
}
