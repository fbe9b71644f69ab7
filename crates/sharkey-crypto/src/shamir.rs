//! Shamir secret sharing over GF(2^8) and the share wire format
//!
//! Each secret byte gets its own random polynomial of degree `T - 1` whose
//! constant term is the byte; share `x` holds the evaluations at `x`.
//!
//! Share wire format, version 1:
//! ```text
//! [0]          version (1)
//! [1]          threshold
//! [2]          index (x coordinate, 1..=255)
//! [3..19)      identifier
//! [19..19+L)   fragment (L = secret length)
//! [19+L..+4)   SHA-256(bytes[0..19+L))[..4]
//! ```

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sharkey_core::{SharkeyError, SharkeyResult, ThresholdScheme, MAX_SHARES};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::identifier::ShareIdentifier;
use crate::IDENTIFIER_SIZE;

/// Share wire format version. Bound to the seconds + random identifier layout.
pub const SHARE_VERSION: u8 = 1;

const HEADER_SIZE: usize = 3 + IDENTIFIER_SIZE;
const CHECKSUM_SIZE: usize = 4;

/// A threshold split/combine primitive.
pub trait SplitScheme {
    /// Split `secret` into `scheme.total()` shares stamped with `identifier`.
    fn split(
        &self,
        secret: &[u8],
        scheme: ThresholdScheme,
        identifier: &ShareIdentifier,
    ) -> SharkeyResult<Vec<Share>>;

    /// Recombine a share set into the secret.
    fn combine(&self, shares: &[Share]) -> SharkeyResult<Zeroizing<Vec<u8>>>;
}

/// One encoded share. Parsed and checksummed on construction; immutable.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    bytes: Vec<u8>,
}

impl Share {
    /// Parse a share from its wire bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> SharkeyResult<Self> {
        // wrap first so the buffer is wiped on every rejection path
        let share = Share { bytes };
        share.validate()?;
        Ok(share)
    }

    fn validate(&self) -> SharkeyResult<()> {
        let len = self.bytes.len();
        if len < HEADER_SIZE + 1 + CHECKSUM_SIZE {
            return Err(SharkeyError::Format(format!("share is too short ({len} bytes)")));
        }
        if self.version() != SHARE_VERSION {
            return Err(SharkeyError::Format(format!(
                "unsupported share format version {} (expected {SHARE_VERSION})",
                self.version()
            )));
        }
        if self.threshold() == 0 {
            return Err(SharkeyError::Format("share threshold must be at least 1".into()));
        }
        if self.index() == 0 {
            return Err(SharkeyError::Format("share index must be non-zero".into()));
        }
        let (body, checksum) = self.bytes.split_at(len - CHECKSUM_SIZE);
        if checksum != share_checksum(body) {
            return Err(SharkeyError::Format(
                "share checksum mismatch (typo or corrupted share)".into(),
            ));
        }
        Ok(())
    }

    fn assemble(
        threshold: u8,
        index: u8,
        identifier: &ShareIdentifier,
        fragment: &[u8],
    ) -> Self {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + fragment.len() + CHECKSUM_SIZE);
        bytes.push(SHARE_VERSION);
        bytes.push(threshold);
        bytes.push(index);
        bytes.extend_from_slice(identifier.as_bytes());
        bytes.extend_from_slice(fragment);
        let checksum = share_checksum(&bytes);
        bytes.extend_from_slice(&checksum);
        Share { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn version(&self) -> u8 {
        self.bytes[0]
    }

    pub fn threshold(&self) -> u8 {
        self.bytes[1]
    }

    pub fn index(&self) -> u8 {
        self.bytes[2]
    }

    pub fn identifier(&self) -> ShareIdentifier {
        let mut id = [0u8; IDENTIFIER_SIZE];
        id.copy_from_slice(&self.bytes[3..HEADER_SIZE]);
        ShareIdentifier::from_bytes(id)
    }

    pub fn fragment(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.bytes.len() - CHECKSUM_SIZE]
    }
}

impl std::fmt::Debug for Share {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Share")
            .field("threshold", &self.threshold())
            .field("index", &self.index())
            .field("fragment", &"[REDACTED]")
            .finish()
    }
}

fn share_checksum(body: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let digest = Sha256::digest(body);
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&digest[..CHECKSUM_SIZE]);
    out
}

/// GF(256) Shamir sharing with coefficients from the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shamir;

impl SplitScheme for Shamir {
    fn split(
        &self,
        secret: &[u8],
        scheme: ThresholdScheme,
        identifier: &ShareIdentifier,
    ) -> SharkeyResult<Vec<Share>> {
        if secret.is_empty() {
            return Err(SharkeyError::Validation("cannot split an empty secret".into()));
        }

        let threshold = scheme.threshold();
        let total = scheme.total();

        let mut fragments: Vec<Zeroizing<Vec<u8>>> = (0..total)
            .map(|_| Zeroizing::new(vec![0u8; secret.len()]))
            .collect();
        let mut coeffs = Zeroizing::new(vec![0u8; threshold as usize]);

        for (pos, &byte) in secret.iter().enumerate() {
            coeffs[0] = byte;
            OsRng.fill_bytes(&mut coeffs[1..]);

            for (i, fragment) in fragments.iter_mut().enumerate() {
                fragment[pos] = eval_poly(&coeffs, i as u8 + 1);
            }
        }

        Ok(fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| Share::assemble(threshold, i as u8 + 1, identifier, fragment))
            .collect())
    }

    fn combine(&self, shares: &[Share]) -> SharkeyResult<Zeroizing<Vec<u8>>> {
        let first = shares
            .first()
            .ok_or_else(|| SharkeyError::Combine("no shares provided".into()))?;
        let threshold = first.threshold() as usize;
        let identifier = first.identifier();
        let len = first.fragment().len();

        if shares.len() > MAX_SHARES as usize {
            return Err(SharkeyError::Combine(format!(
                "too many shares ({}, maximum {MAX_SHARES})",
                shares.len()
            )));
        }

        let mut seen = [false; 256];
        for share in shares {
            if share.threshold() as usize != threshold {
                return Err(SharkeyError::Combine("shares disagree on threshold".into()));
            }
            if share.identifier() != identifier {
                return Err(SharkeyError::Combine("shares belong to different splits".into()));
            }
            if share.fragment().len() != len {
                return Err(SharkeyError::Combine("shares have different lengths".into()));
            }
            let idx = share.index() as usize;
            if seen[idx] {
                return Err(SharkeyError::Combine(format!("duplicate share index {idx}")));
            }
            seen[idx] = true;
        }

        if shares.len() < threshold {
            return Err(SharkeyError::Combine(format!(
                "at least {threshold} shares are required (got {})",
                shares.len()
            )));
        }

        let used = &shares[..threshold];
        let xs: Vec<u8> = used.iter().map(Share::index).collect();
        let weights = lagrange_weights_at_zero(&xs);

        let mut secret = Zeroizing::new(vec![0u8; len]);
        for (pos, out) in secret.iter_mut().enumerate() {
            *out = used
                .iter()
                .zip(&weights)
                .fold(0u8, |acc, (share, &w)| acc ^ gf_mul(w, share.fragment()[pos]));
        }
        Ok(secret)
    }
}

/// Multiplication in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1, branch-free.
fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    for _ in 0..8 {
        product ^= a & (b & 1).wrapping_neg();
        let carry = (a >> 7).wrapping_neg();
        a = (a << 1) ^ (0x1b & carry);
        b >>= 1;
    }
    product
}

/// a^254 = a^-1 for non-zero a.
fn gf_inv(a: u8) -> u8 {
    let mut result = 1u8;
    let mut base = a;
    let mut exp = 254u8;
    while exp > 0 {
        if exp & 1 == 1 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exp >>= 1;
    }
    result
}

/// Horner evaluation, coefficients in increasing degree.
fn eval_poly(coeffs: &[u8], x: u8) -> u8 {
    coeffs.iter().rev().fold(0u8, |acc, &c| gf_mul(acc, x) ^ c)
}

/// Lagrange basis polynomials evaluated at zero. `xs` must be distinct and
/// non-zero.
fn lagrange_weights_at_zero(xs: &[u8]) -> Vec<u8> {
    xs.iter()
        .enumerate()
        .map(|(i, &xi)| {
            let mut num = 1u8;
            let mut den = 1u8;
            for (j, &xj) in xs.iter().enumerate() {
                if i != j {
                    num = gf_mul(num, xj);
                    den = gf_mul(den, xi ^ xj);
                }
            }
            gf_mul(num, gf_inv(den))
        })
        .collect()
}
