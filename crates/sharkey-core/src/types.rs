use crate::error::{SharkeyError, SharkeyResult};

/// Smallest allowed threshold and share count.
pub const MIN_SHARES: u8 = 1;

/// Largest allowed share count. Share indices are non-zero GF(256) points.
pub const MAX_SHARES: u8 = 255;

/// A `threshold`-of-`total` sharing scheme.
///
/// Invariant: `MIN_SHARES <= threshold <= total <= MAX_SHARES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdScheme {
    threshold: u8,
    total: u8,
}

impl ThresholdScheme {
    pub fn new(threshold: u8, total: u8) -> SharkeyResult<Self> {
        if threshold < MIN_SHARES {
            return Err(SharkeyError::Validation(format!(
                "threshold must be at least {MIN_SHARES}, but no more than {MAX_SHARES} (got {threshold})"
            )));
        }
        if total < MIN_SHARES {
            return Err(SharkeyError::Validation(format!(
                "shares must be at least {MIN_SHARES}, but no more than {MAX_SHARES} (got {total})"
            )));
        }
        if threshold > total {
            return Err(SharkeyError::Validation(format!(
                "threshold must be less than or equal to the number of shares \
                 (got {threshold} threshold and {total} shares)"
            )));
        }
        Ok(Self { threshold, total })
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn total(&self) -> u8 {
        self.total
    }
}

impl std::fmt::Display for ThresholdScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-of-{}", self.threshold, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_valid_schemes() {
        let scheme = ThresholdScheme::new(2, 3).unwrap();
        assert_eq!(scheme.threshold(), 2);
        assert_eq!(scheme.total(), 3);
        assert_eq!(scheme.to_string(), "2-of-3");

        assert!(ThresholdScheme::new(1, 1).is_ok());
        assert!(ThresholdScheme::new(MAX_SHARES, MAX_SHARES).is_ok());
    }

    #[test]
    fn test_invalid_schemes() {
        for (t, n) in [(0, 3), (2, 0), (4, 3)] {
            let err = ThresholdScheme::new(t, n).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{t}-of-{n} must be rejected");
        }
    }
}
