//! Core identifier types for livecontrol.
//!
//! Hubs, shockers and users are all identified by UUIDs. Each gets its own
//! newtype so a shocker id can never be passed where a hub id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The string is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The byte slice has the wrong length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create the identifier from a UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Create the identifier from raw UUID bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(uuid::Uuid::from_bytes(bytes))
            }

            /// Parse the identifier from a byte slice, as stored in index keys.
            ///
            /// # Errors
            ///
            /// Returns an error if the slice is not exactly 16 bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
                let arr: [u8; 16] = bytes.try_into().map_err(|_| IdError::InvalidLength {
                    expected: 16,
                    got: bytes.len(),
                })?;
                Ok(Self::from_bytes(arr))
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Return the bytes of the UUID.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }
    };
}

uuid_id!(
    /// Identifier of a hub, the physical gateway device holding a live connection.
    HubId
);

uuid_id!(
    /// Identifier of a shocker, a single actuator attached to a hub.
    ShockerId
);

uuid_id!(
    /// Identifier of a user account. Hubs are owned by users.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_id_parse_and_display() {
        let s = "6d2f8b0e-3c1a-4f5e-9b7d-0a1b2c3d4e5f";
        let id: HubId = s.parse().unwrap();
        assert_eq!(id.to_string(), s);
        assert_eq!(format!("{id:?}"), format!("HubId({s})"));
    }

    #[test]
    fn invalid_uuid_rejected() {
        assert_eq!("not-a-uuid".parse::<ShockerId>(), Err(IdError::InvalidUuid));
    }

    #[test]
    fn from_slice_checks_length() {
        let id = ShockerId::generate();
        assert_eq!(ShockerId::from_slice(id.as_bytes()).unwrap(), id);
        assert_eq!(
            ShockerId::from_slice(&[0u8; 4]),
            Err(IdError::InvalidLength {
                expected: 16,
                got: 4
            })
        );
    }

    #[test]
    fn serde_uses_string_form() {
        let id = UserId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(HubId::generate(), HubId::generate());
    }
}
