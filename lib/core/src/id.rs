//! Strongly-typed ID types for domain entities.
//!
//! Identifiers are issued by the hosted backend, not by this workspace, so
//! they are kept opaque: a non-empty string. Some backend tables use integer
//! keys and others UUIDs; both deserialize into the same wrapper and always
//! serialize back out as a string.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Wire form accepted for any backend identifier.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

/// Macro to generate a strongly-typed wrapper around an opaque backend ID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Returns the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "identifier is empty".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                match RawId::deserialize(deserializer)? {
                    RawId::Text(text) => text.parse().map_err(serde::de::Error::custom),
                    RawId::Number(number) => Ok(Self(number.to_string())),
                }
            }
        }
    };
}

define_id!(
    /// Unique identifier for an authenticated user, as issued by the session store.
    UserId
);

define_id!(
    /// Unique identifier for an enrolled student.
    StudentId
);

define_id!(
    /// Unique identifier for a membership plan.
    PlanId
);

define_id!(
    /// Unique identifier for a class group (a recurring training slot).
    ClassGroupId
);

define_id!(
    /// Unique identifier for a scheduled trial class.
    TrialClassId
);

define_id!(
    /// Unique identifier for a recorded monthly payment.
    PaymentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let id: UserId = "  8d0c3a7e-5b1f-4a55-9c1e-2f0f7c1d9a01 ".parse().expect("should parse");
        assert_eq!(id.as_str(), "8d0c3a7e-5b1f-4a55-9c1e-2f0f7c1d9a01");
    }

    #[test]
    fn parse_rejects_empty() {
        let result: Result<StudentId, _> = "   ".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "StudentId");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn deserialize_accepts_integer_keys() {
        let id: PlanId = serde_json::from_str("42").expect("deserialize");
        assert_eq!(id.as_str(), "42");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"42\"");
    }

    #[test]
    fn deserialize_rejects_empty_string() {
        let result: Result<ClassGroupId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn id_hash() {
        use std::collections::HashSet;

        let a: TrialClassId = "1".parse().expect("parse");
        let b: TrialClassId = "2".parse().expect("parse");

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        set.insert(a);

        assert_eq!(set.len(), 2);
    }
}
