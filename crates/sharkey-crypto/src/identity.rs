//! Key stretching (scrypt) and age identity derivation (X25519 + bech32)

use std::str::FromStr;

use bech32::{Bech32, Hrp};
use secrecy::{ExposeSecret, SecretString};
use sharkey_core::{error::ensure_len, SharkeyError, SharkeyResult};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::seed::MasterSeed;
use crate::{DERIVED_KEY_SIZE, SALT_SIZE, SEED_SIZE};

const PUBLIC_KEY_HRP: &str = "age";
const SECRET_KEY_HRP: &str = "AGE-SECRET-KEY-";

/// scrypt cost parameters.
///
/// Changing these changes every identity derived from an existing seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StretchParams {
    /// log2 of the CPU/memory cost N
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
}

impl StretchParams {
    /// N = 2^20, r = 8, p = 1 (about 1 GiB of memory).
    pub const PROTOCOL: Self = Self {
        log_n: 20,
        r: 8,
        p: 1,
    };
}

impl Default for StretchParams {
    fn default() -> Self {
        Self::PROTOCOL
    }
}

/// 32 bytes of scrypt output. Zeroized on drop.
pub struct StretchedKey {
    bytes: [u8; DERIVED_KEY_SIZE],
}

impl StretchedKey {
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for StretchedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for StretchedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StretchedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// An age X25519 keypair in its bech32 text form.
#[derive(Debug)]
pub struct AgeIdentity {
    public_key: String,
    secret_key: SecretString,
}

impl AgeIdentity {
    /// `age1…`
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// `AGE-SECRET-KEY-1…`
    pub fn secret_key(&self) -> &SecretString {
        &self.secret_key
    }
}

/// Stretch a 32-byte seed with a 16-byte salt using the protocol parameters.
pub fn stretch(seed: &[u8], salt: &[u8]) -> SharkeyResult<StretchedKey> {
    stretch_with(&StretchParams::PROTOCOL, seed, salt)
}

/// Stretch with explicit parameters. Only tests should need anything but
/// [`StretchParams::PROTOCOL`].
pub fn stretch_with(params: &StretchParams, seed: &[u8], salt: &[u8]) -> SharkeyResult<StretchedKey> {
    ensure_len("seed", seed, SEED_SIZE)?;
    ensure_len("salt", salt, SALT_SIZE)?;

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, DERIVED_KEY_SIZE)
        .map_err(|e| SharkeyError::Stretch(format!("invalid scrypt params: {e}")))?;

    let mut key = StretchedKey {
        bytes: [0u8; DERIVED_KEY_SIZE],
    };
    scrypt::scrypt(seed, salt, &scrypt_params, &mut key.bytes)
        .map_err(|e| SharkeyError::Stretch(format!("scrypt failed: {e}")))?;

    tracing::debug!(log_n = params.log_n, r = params.r, p = params.p, "seed stretched");
    Ok(key)
}

/// Build the age keypair for a 32-byte derived key.
///
/// The secret key encodes `derived` itself; the public key is its X25519
/// base point multiple. The result is checked by parsing the secret key
/// back with the `age` crate.
pub fn derive_identity(derived: &[u8]) -> SharkeyResult<AgeIdentity> {
    ensure_len("derived key", derived, DERIVED_KEY_SIZE)?;

    let mut raw = Zeroizing::new([0u8; DERIVED_KEY_SIZE]);
    raw.copy_from_slice(derived);

    let secret = StaticSecret::from(*raw);
    let public = PublicKey::from(&secret);
    drop(secret);

    let public_key = bech32_encode(PUBLIC_KEY_HRP, public.as_bytes())?;
    let secret_lower = Zeroizing::new(bech32_encode(SECRET_KEY_HRP, raw.as_slice())?);
    let secret_key = SecretString::from(secret_lower.to_uppercase());

    let parsed = age::x25519::Identity::from_str(secret_key.expose_secret())
        .map_err(|e| SharkeyError::FatalConsistency(format!("derived secret key rejected by age: {e}")))?;
    if parsed.to_public().to_string() != public_key {
        return Err(SharkeyError::FatalConsistency(
            "derived public key does not match age recipient".into(),
        ));
    }

    Ok(AgeIdentity {
        public_key,
        secret_key,
    })
}

/// Stretch the seed half of `seed`, salted by its salt half, and derive
/// the age identity.
pub fn identity_from_seed(seed: &MasterSeed) -> SharkeyResult<AgeIdentity> {
    identity_from_seed_with(&StretchParams::PROTOCOL, seed)
}

pub fn identity_from_seed_with(params: &StretchParams, seed: &MasterSeed) -> SharkeyResult<AgeIdentity> {
    let stretched = stretch_with(params, seed.seed(), seed.salt())?;
    derive_identity(stretched.as_bytes())
}

fn bech32_encode(hrp: &str, data: &[u8]) -> SharkeyResult<String> {
    let hrp = Hrp::parse(hrp).map_err(|e| SharkeyError::Format(format!("bech32 prefix {hrp:?}: {e}")))?;
    bech32::encode::<Bech32>(hrp, data).map_err(|e| SharkeyError::Format(format!("bech32 encoding failed: {e}")))
}
