//! Split a master seed into shares and recombine it

use sharkey_core::{SharkeyError, SharkeyResult, ThresholdScheme, MAX_SHARES};

use crate::identifier::ShareIdentifier;
use crate::seed::MasterSeed;
use crate::shamir::{Shamir, Share, SplitScheme};
use crate::MASTER_SEED_SIZE;

/// Split `seed` into `scheme.total()` shares stamped with `identifier`.
pub fn split_seed(
    seed: &MasterSeed,
    scheme: ThresholdScheme,
    identifier: &ShareIdentifier,
) -> SharkeyResult<Vec<Share>> {
    split_seed_with(&Shamir, seed, scheme, identifier)
}

pub fn split_seed_with<S: SplitScheme + ?Sized>(
    splitter: &S,
    seed: &MasterSeed,
    scheme: ThresholdScheme,
    identifier: &ShareIdentifier,
) -> SharkeyResult<Vec<Share>> {
    let shares = splitter.split(seed.as_bytes(), scheme, identifier)?;
    tracing::info!(%scheme, "seed split into shares");
    Ok(shares)
}

/// Recover the master seed from at least `threshold` shares.
pub fn combine(shares: &[Share]) -> SharkeyResult<MasterSeed> {
    combine_with(&Shamir, shares)
}

/// Recover the master seed with an explicit split primitive.
///
/// Share-count problems are validation errors; anything the primitive
/// rejects is a combine error. A recovered secret that is not exactly 48
/// bytes is a fatal consistency error and is wiped, never truncated or
/// padded.
pub fn combine_with<S: SplitScheme + ?Sized>(splitter: &S, shares: &[Share]) -> SharkeyResult<MasterSeed> {
    let first = shares.first().ok_or_else(|| {
        SharkeyError::Validation(format!(
            "at least 1 share, but no more than {MAX_SHARES}, is required to recover the secret encryption key (got 0)"
        ))
    })?;

    if shares.len() > MAX_SHARES as usize {
        return Err(SharkeyError::Validation(format!(
            "no more than {MAX_SHARES} shares can be combined (got {})",
            shares.len()
        )));
    }

    let threshold = first.threshold() as usize;
    if shares.len() < threshold {
        return Err(SharkeyError::Validation(format!(
            "at least {threshold} shares are required to recover the secret encryption key (got {})",
            shares.len()
        )));
    }

    let recovered = match splitter.combine(shares) {
        Ok(secret) => secret,
        Err(SharkeyError::Combine(msg)) => return Err(SharkeyError::Combine(msg)),
        Err(e) => return Err(SharkeyError::Combine(e.to_string())),
    };

    if recovered.len() != MASTER_SEED_SIZE {
        return Err(SharkeyError::FatalConsistency(format!(
            "seed recovered must be {MASTER_SEED_SIZE} bytes in length (got {} bytes)",
            recovered.len()
        )));
    }

    tracing::info!(shares = shares.len(), threshold, "seed recovered");
    MasterSeed::from_slice(&recovered)
}
