//! Identifier newtypes for catalog entities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, InvalidInputError};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id, rejecting values that cannot be used as a path segment.
            pub fn new(s: impl Into<String>) -> Result<Self, Error> {
                let s = s.into();
                validate_segment(&s)?;
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

opaque_id!(
    /// Server-assigned product identifier.
    ProductId
);

opaque_id!(
    /// Server-assigned user identifier.
    UserId
);

fn validate_segment(s: &str) -> Result<(), Error> {
    let reason = if s.is_empty() {
        "must not be empty"
    } else if s.len() > 128 {
        "must be at most 128 characters"
    } else if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        "must contain only ASCII alphanumerics, '-' or '_'"
    } else {
        return Ok(());
    };

    Err(InvalidInputError::Id {
        value: s.to_string(),
        reason: reason.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_and_numeric_ids() {
        assert!(ProductId::new("3f2b9c1e-7a4d-4e0b-9b51-2c6f0f1d8a77").is_ok());
        assert!(UserId::new("1042").is_ok());
    }

    #[test]
    fn rejects_path_breaking_ids() {
        assert!(ProductId::new("").is_err());
        assert!(ProductId::new("../admin").is_err());
        assert!(UserId::new("a/b").is_err());
    }

    #[test]
    fn ids_deserialize_from_plain_strings() {
        let id: ProductId = serde_json::from_str("\"p-1\"").unwrap();
        assert_eq!(id.as_str(), "p-1");
    }
}
