//! sharkey-crypto: threshold-shared age identities
//!
//! A 48-byte master seed is split into N Shamir shares, any T of which
//! recombine it. The seed half is stretched with scrypt (salted by the
//! salt half) into an X25519 secret, rendered as an age keypair.
//!
//! ```text
//! MasterSeed (48) = seed (32) || salt (16)
//!   ├── split ──► Share × N ──► symbolic (Crockford base32) / words
//!   └── scrypt(seed, salt, N=2^20, r=8, p=1) ──► derived (32)
//!         └── X25519 ──► age1… / AGE-SECRET-KEY-1…
//! ```
//!
//! Recovery runs the other way: decode text, validate each share against
//! the first accepted one ([`CollectSession`]), combine, re-derive.

pub mod codec;
pub mod collect;
pub mod combine;
pub mod identifier;
pub mod identity;
pub mod seed;
pub mod shamir;

pub use codec::{decode_auto, decode_symbolic, decode_words, encode_symbolic, encode_words, ShareFormat};
pub use collect::{CollectInput, CollectSession, CollectState, FinishPolicy};
pub use combine::{combine, combine_with, split_seed, split_seed_with};
pub use identifier::{identifier_timestamp, ShareIdentifier};
pub use identity::{derive_identity, identity_from_seed, identity_from_seed_with, stretch, stretch_with, AgeIdentity, StretchParams, StretchedKey};
pub use seed::MasterSeed;
pub use shamir::{Shamir, Share, SplitScheme};

/// Size of the seed half of a master seed
pub const SEED_SIZE: usize = 32;

/// Size of the salt half of a master seed
pub const SALT_SIZE: usize = 16;

/// Size of a master seed (seed || salt)
pub const MASTER_SEED_SIZE: usize = SEED_SIZE + SALT_SIZE;

/// Size of the scrypt output and of an X25519 secret key
pub const DERIVED_KEY_SIZE: usize = 32;

/// Size of the identifier stamped into every share of one split
pub const IDENTIFIER_SIZE: usize = 16;
