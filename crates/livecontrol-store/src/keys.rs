//! Key encoding for `RocksDB`.
//!
//! All ids are 16-byte UUIDs, so composite keys are fixed-width and support
//! prefix scans.

use livecontrol_core::{HubId, IdError, ShockerId};

/// Encode a hub key.
#[must_use]
pub fn hub_key(hub_id: &HubId) -> Vec<u8> {
    hub_id.as_bytes().to_vec()
}

/// Encode a shocker key.
#[must_use]
pub fn shocker_key(shocker_id: &ShockerId) -> Vec<u8> {
    shocker_id.as_bytes().to_vec()
}

/// Encode a hub-shocker index key: `hub_id || shocker_id`.
#[must_use]
pub fn hub_shocker_key(hub_id: &HubId, shocker_id: &ShockerId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(hub_id.as_bytes());
    key.extend_from_slice(shocker_id.as_bytes());
    key
}

/// Encode a hub prefix for scanning all shockers of a hub.
#[must_use]
pub fn hub_prefix(hub_id: &HubId) -> Vec<u8> {
    hub_id.as_bytes().to_vec()
}

/// Extract the shocker ID from a hub-shocker key.
///
/// # Errors
///
/// Returns an error if the key is not exactly 32 bytes.
pub fn extract_shocker_id(key: &[u8]) -> Result<ShockerId, IdError> {
    if key.len() != 32 {
        return Err(IdError::InvalidLength {
            expected: 32,
            got: key.len(),
        });
    }
    ShockerId::from_slice(&key[16..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_shocker_key_roundtrip() {
        let hub_id = HubId::from_bytes([1u8; 16]);
        let shocker_id = ShockerId::from_bytes([2u8; 16]);

        let key = hub_shocker_key(&hub_id, &shocker_id);
        assert_eq!(key.len(), 32);
        assert!(key.starts_with(&hub_prefix(&hub_id)));
        assert_eq!(extract_shocker_id(&key).unwrap(), shocker_id);
    }

    #[test]
    fn short_key_rejected() {
        assert!(extract_shocker_id(&[0u8; 20]).is_err());
    }
}
