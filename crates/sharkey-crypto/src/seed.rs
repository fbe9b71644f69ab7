//! Master seed: 32-byte seed followed by a 16-byte scrypt salt

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use secrecy::SecretString;
use sharkey_core::{error::ensure_len, SharkeyError, SharkeyResult};
use zeroize::{Zeroize, Zeroizing};

use crate::{MASTER_SEED_SIZE, SEED_SIZE};

/// The 48-byte secret every share set is split from.
///
/// Zeroized on drop. Never serialized except on explicit request
/// ([`MasterSeed::to_base64`]).
#[derive(Clone)]
pub struct MasterSeed {
    bytes: [u8; MASTER_SEED_SIZE],
}

impl MasterSeed {
    /// Fill a new master seed from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; MASTER_SEED_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; MASTER_SEED_SIZE]) -> Self {
        Self { bytes }
    }

    /// Accept an externally supplied seed, which must be exactly 48 bytes.
    pub fn from_slice(bytes: &[u8]) -> SharkeyResult<Self> {
        ensure_len("seed", bytes, MASTER_SEED_SIZE)?;
        let mut seed = Self::from_bytes([0u8; MASTER_SEED_SIZE]);
        seed.bytes.copy_from_slice(bytes);
        Ok(seed)
    }

    /// Decode a standard base64 seed (the `--seed` / `SEED` transport form).
    pub fn from_base64(encoded: &str) -> SharkeyResult<Self> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| SharkeyError::Format(format!("seed must be a base64 encoded string: {e}")))?,
        );
        Self::from_slice(&decoded)
    }

    pub fn to_base64(&self) -> SecretString {
        SecretString::from(STANDARD.encode(self.bytes))
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_SEED_SIZE] {
        &self.bytes
    }

    /// The first 32 bytes: scrypt password.
    pub fn seed(&self) -> &[u8] {
        &self.bytes[..SEED_SIZE]
    }

    /// The last 16 bytes: scrypt salt.
    pub fn salt(&self) -> &[u8] {
        &self.bytes[SEED_SIZE..]
    }
}

impl Drop for MasterSeed {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSeed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use sharkey_core::ErrorKind;

    #[test]
    fn test_generate_random() {
        let a = MasterSeed::generate();
        let b = MasterSeed::generate();
        assert_ne!(a.as_bytes(), b.as_bytes(), "random seeds must differ");
    }

    #[test]
    fn test_seed_and_salt_split() {
        let mut bytes = [0u8; MASTER_SEED_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let seed = MasterSeed::from_bytes(bytes);

        assert_eq!(seed.seed().len(), 32);
        assert_eq!(seed.salt().len(), 16);
        assert_eq!(seed.seed()[0], 0);
        assert_eq!(seed.salt()[0], 32);
    }

    #[test]
    fn test_from_slice_wrong_length() {
        let err = MasterSeed::from_slice(&[0u8; 32]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Length);

        let err = MasterSeed::from_slice(&[0u8; 49]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Length);
    }

    #[test]
    fn test_base64_roundtrip() {
        let seed = MasterSeed::generate();
        let encoded = seed.to_base64();
        let decoded = MasterSeed::from_base64(encoded.expose_secret()).unwrap();
        assert_eq!(seed.as_bytes(), decoded.as_bytes());
    }

    #[test]
    fn test_base64_all_zero_seed() {
        let encoded = "A".repeat(64);
        let seed = MasterSeed::from_base64(&encoded).unwrap();
        assert_eq!(seed.as_bytes(), &[0u8; MASTER_SEED_SIZE]);
    }

    #[test]
    fn test_base64_rejects_garbage_and_short_input() {
        let err = MasterSeed::from_base64("not base64!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        // 33 bytes of zeros
        let err = MasterSeed::from_base64(&"A".repeat(44)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Length);
    }

    #[test]
    fn test_debug_redacts() {
        let seed = MasterSeed::generate();
        assert!(format!("{seed:?}").contains("REDACTED"));
    }
}
