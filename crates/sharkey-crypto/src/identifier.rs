//! Share identifier layout (share format v1)
//!
//! ```text
//! [0..8)   creation time, big-endian u64 seconds since the Unix epoch
//! [8..16)  random bytes
//! ```
//!
//! Every share of one split carries the same identifier. It binds a share
//! set together; it is not a secret and not a security boundary.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::{rngs::OsRng, RngCore};
use sharkey_core::{SharkeyError, SharkeyResult};
use subtle::ConstantTimeEq;

use crate::IDENTIFIER_SIZE;

const TIMESTAMP_SIZE: usize = 8;

#[derive(Clone, Copy)]
pub struct ShareIdentifier {
    bytes: [u8; IDENTIFIER_SIZE],
}

impl ShareIdentifier {
    /// Stamp a new identifier with `created_at` and 8 fresh random bytes.
    ///
    /// Times before the epoch are recorded as 0.
    pub fn new(created_at: SystemTime) -> Self {
        let secs = created_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut bytes = [0u8; IDENTIFIER_SIZE];
        bytes[..TIMESTAMP_SIZE].copy_from_slice(&secs.to_be_bytes());
        OsRng.fill_bytes(&mut bytes[TIMESTAMP_SIZE..]);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; IDENTIFIER_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> SharkeyResult<Self> {
        if bytes.len() != IDENTIFIER_SIZE {
            return Err(SharkeyError::Format(format!(
                "identifier must have a length of {IDENTIFIER_SIZE} bytes (got {})",
                bytes.len()
            )));
        }
        let mut out = [0u8; IDENTIFIER_SIZE];
        out.copy_from_slice(bytes);
        Ok(Self { bytes: out })
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_SIZE] {
        &self.bytes
    }

    pub fn created_at_secs(&self) -> u64 {
        let mut secs = [0u8; TIMESTAMP_SIZE];
        secs.copy_from_slice(&self.bytes[..TIMESTAMP_SIZE]);
        u64::from_be_bytes(secs)
    }

    pub fn created_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.created_at_secs())
    }
}

/// Read the creation time out of a raw identifier.
pub fn identifier_timestamp(bytes: &[u8]) -> SharkeyResult<SystemTime> {
    ShareIdentifier::from_slice(bytes).map(|id| id.created_at())
}

impl PartialEq for ShareIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for ShareIdentifier {}

impl std::fmt::Debug for ShareIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareIdentifier")
            .field("created_at_secs", &self.created_at_secs())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharkey_core::ErrorKind;

    #[test]
    fn test_timestamp_roundtrip() {
        let created = UNIX_EPOCH + Duration::from_secs(1_683_000_000);
        let id = ShareIdentifier::new(created);

        assert_eq!(id.created_at(), created);
        assert_eq!(identifier_timestamp(id.as_bytes()).unwrap(), created);
    }

    #[test]
    fn test_big_endian_layout() {
        let id = ShareIdentifier::new(UNIX_EPOCH + Duration::from_secs(0x0102_0304));
        assert_eq!(&id.as_bytes()[..8], &[0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_subsecond_precision_dropped() {
        let created = UNIX_EPOCH + Duration::from_millis(1_683_000_000_999);
        let id = ShareIdentifier::new(created);
        assert_eq!(id.created_at_secs(), 1_683_000_000);
    }

    #[test]
    fn test_random_tail_differs() {
        let now = SystemTime::now();
        let a = ShareIdentifier::new(now);
        let b = ShareIdentifier::new(now);

        assert_eq!(a.created_at_secs(), b.created_at_secs());
        assert_ne!(a, b, "identifiers created in the same second must still differ");
    }

    #[test]
    fn test_wrong_length_is_format_error() {
        for len in [0, 8, 15, 17] {
            let err = identifier_timestamp(&vec![0u8; len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format);
        }
    }
}
