//! Interactive share collection
//!
//! A [`CollectSession`] accumulates shares one candidate at a time. The
//! first accepted share fixes the identifier and threshold; every later
//! candidate must agree with it. A rejected candidate leaves the
//! accumulated set untouched so the caller can simply prompt again.
//!
//! ```text
//!            Candidate (accepted, count < threshold)
//!              ┌─────┐
//!              ▼     │
//!   ──► Collecting ──┴── count == threshold ──► Ready
//!           │   └──── Finish (AllowEarlyFinish) ─►
//!           └── Abort ──► Aborted (shares wiped)
//! ```

use sharkey_core::{SharkeyError, SharkeyResult, MAX_SHARES};

use crate::codec::{decode_symbolic, decode_words, ShareFormat};
use crate::identifier::ShareIdentifier;
use crate::shamir::Share;

/// What an empty input means while fewer than `threshold` shares are in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinishPolicy {
    /// Keep collecting until the threshold (or `MAX_SHARES`) is reached.
    #[default]
    ThresholdOnly,
    /// An empty input ends collection early; combining will then report
    /// the shortfall.
    AllowEarlyFinish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectState {
    Collecting,
    Ready,
    Aborted,
}

#[derive(Debug, Clone, Copy)]
pub enum CollectInput<'a> {
    /// One line of user input holding a share in either text encoding.
    Candidate(&'a str),
    /// An empty line.
    Finish,
    /// The user cancelled.
    Abort,
}

/// Caller-owned accumulator for one recovery attempt.
#[derive(Debug)]
pub struct CollectSession {
    policy: FinishPolicy,
    state: CollectState,
    shares: Vec<Share>,
}

impl CollectSession {
    pub fn new(policy: FinishPolicy) -> Self {
        Self {
            policy,
            state: CollectState::Collecting,
            shares: Vec::new(),
        }
    }

    /// Feed one input and return the resulting state.
    ///
    /// Errors reject only the input; the session stays as it was.
    pub fn step(&mut self, input: CollectInput<'_>) -> SharkeyResult<CollectState> {
        if self.state != CollectState::Collecting {
            return Err(SharkeyError::Validation(format!(
                "share collection is no longer accepting input ({:?})",
                self.state
            )));
        }

        match input {
            CollectInput::Abort => self.abort(),
            CollectInput::Candidate(text) if text.trim().is_empty() => self.finish()?,
            CollectInput::Finish => self.finish()?,
            CollectInput::Candidate(text) => self.accept(text)?,
        }
        Ok(self.state)
    }

    fn accept(&mut self, text: &str) -> SharkeyResult<()> {
        let share = parse_candidate(text)?;

        if let Some(first) = self.shares.first() {
            if share.identifier() != first.identifier() {
                return Err(SharkeyError::Validation(
                    "share does not belong to the same set as the first share (identifier mismatch)".into(),
                ));
            }
            if share.threshold() != first.threshold() {
                return Err(SharkeyError::Validation(format!(
                    "share threshold {} does not match the first share's threshold {}",
                    share.threshold(),
                    first.threshold()
                )));
            }
            if share.fragment().len() != first.fragment().len() {
                return Err(SharkeyError::Validation(
                    "share length does not match the first share".into(),
                ));
            }
            if self.shares.iter().any(|s| s.index() == share.index()) {
                return Err(SharkeyError::Validation(format!(
                    "share {} was already entered",
                    share.index()
                )));
            }
        }

        self.shares.push(share);
        tracing::debug!(accepted = self.shares.len(), threshold = ?self.threshold(), "share accepted");

        let count = self.shares.len();
        if self.threshold().is_some_and(|t| count >= t as usize) || count >= MAX_SHARES as usize {
            self.state = CollectState::Ready;
        }
        Ok(())
    }

    fn finish(&mut self) -> SharkeyResult<()> {
        match self.policy {
            FinishPolicy::ThresholdOnly => Err(SharkeyError::Validation(format!(
                "{} more share(s) required before the key can be recovered",
                self.remaining().unwrap_or(1)
            ))),
            FinishPolicy::AllowEarlyFinish if self.shares.is_empty() => Err(SharkeyError::Validation(
                "at least 1 share is required to recover the secret encryption key".into(),
            )),
            FinishPolicy::AllowEarlyFinish => {
                tracing::debug!(accepted = self.shares.len(), "collection finished early");
                self.state = CollectState::Ready;
                Ok(())
            }
        }
    }

    /// Drop (and thereby wipe) every collected share.
    pub fn abort(&mut self) {
        self.shares.clear();
        self.state = CollectState::Aborted;
        tracing::debug!("share collection aborted");
    }

    pub fn state(&self) -> CollectState {
        self.state
    }

    pub fn accepted(&self) -> usize {
        self.shares.len()
    }

    /// Threshold declared by the first accepted share.
    pub fn threshold(&self) -> Option<u8> {
        self.shares.first().map(Share::threshold)
    }

    pub fn identifier(&self) -> Option<ShareIdentifier> {
        self.shares.first().map(Share::identifier)
    }

    /// Shares still needed, once the threshold is known.
    pub fn remaining(&self) -> Option<usize> {
        self.threshold()
            .map(|t| (t as usize).saturating_sub(self.shares.len()))
    }

    /// Hand the collected shares over for combining. Only valid once `Ready`.
    pub fn into_shares(self) -> SharkeyResult<Vec<Share>> {
        match self.state {
            CollectState::Ready => Ok(self.shares),
            state => Err(SharkeyError::Validation(format!(
                "shares are not ready to combine ({state:?})"
            ))),
        }
    }
}

/// Decode one line into a checksummed share.
///
/// Short word lists can also read as base32, so a multi-word line whose
/// base32 reading fails the share checks is retried as words. The base32
/// error is the one reported.
fn parse_candidate(text: &str) -> SharkeyResult<Share> {
    if ShareFormat::detect(text) == Some(ShareFormat::Symbolic) {
        return match decode_symbolic(text).and_then(Share::from_bytes) {
            Ok(share) => Ok(share),
            Err(e) if text.split_whitespace().nth(1).is_none() => Err(e),
            Err(e) => decode_words(text).and_then(Share::from_bytes).map_err(|_| e),
        };
    }
    decode_words(text).and_then(Share::from_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_symbolic, encode_words};
    use crate::shamir::{Shamir, SplitScheme};
    use sharkey_core::{ErrorKind, ThresholdScheme};
    use std::time::SystemTime;

    fn split(t: u8, n: u8) -> Vec<String> {
        let scheme = ThresholdScheme::new(t, n).unwrap();
        Shamir
            .split(&[5u8; 48], scheme, &ShareIdentifier::new(SystemTime::now()))
            .unwrap()
            .iter()
            .map(|s| encode_symbolic(s.as_bytes()))
            .collect()
    }

    #[test]
    fn test_reaches_ready_at_threshold() {
        let shares = split(2, 3);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);

        assert_eq!(session.remaining(), None);
        let state = session.step(CollectInput::Candidate(&shares[0])).unwrap();
        assert_eq!(state, CollectState::Collecting);
        assert_eq!(session.threshold(), Some(2));
        assert_eq!(session.remaining(), Some(1));

        let state = session.step(CollectInput::Candidate(&shares[2])).unwrap();
        assert_eq!(state, CollectState::Ready);
        assert_eq!(session.into_shares().unwrap().len(), 2);
    }

    #[test]
    fn test_one_of_n_ready_immediately() {
        let shares = split(1, 4);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);
        let state = session.step(CollectInput::Candidate(&shares[3])).unwrap();
        assert_eq!(state, CollectState::Ready);
    }

    #[test]
    fn test_mixed_encodings_accepted() {
        let scheme = ThresholdScheme::new(2, 2).unwrap();
        let shares = Shamir
            .split(&[5u8; 48], scheme, &ShareIdentifier::new(SystemTime::now()))
            .unwrap();
        let words = encode_words(shares[0].as_bytes());
        let symbolic = encode_symbolic(shares[1].as_bytes()).to_lowercase();

        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);
        session.step(CollectInput::Candidate(&words)).unwrap();
        let state = session.step(CollectInput::Candidate(&symbolic)).unwrap();
        assert_eq!(state, CollectState::Ready);
    }

    #[test]
    fn test_word_share_that_reads_as_base32() {
        let words = encode_words(&crate::codec::tests::base32_lookalike());
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);

        let state = session.step(CollectInput::Candidate(&words)).unwrap();
        assert_eq!(state, CollectState::Collecting);
        assert_eq!(session.threshold(), Some(2));
        assert_eq!(session.remaining(), Some(1));
    }

    #[test]
    fn test_garbage_rejected_and_retry_allowed() {
        let shares = split(2, 3);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);

        let err = session.step(CollectInput::Candidate("hello world")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(session.state(), CollectState::Collecting);
        assert_eq!(session.accepted(), 0);

        session.step(CollectInput::Candidate(&shares[0])).unwrap();
        assert_eq!(session.accepted(), 1);
    }

    #[test]
    fn test_truncated_share_rejected() {
        let shares = split(2, 3);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);
        let truncated = &shares[0][..shares[0].len() - 8];

        let err = session.step(CollectInput::Candidate(truncated)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(session.accepted(), 0);
    }

    #[test]
    fn test_foreign_share_rejected() {
        let ours = split(2, 3);
        let theirs = split(2, 3);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);

        session.step(CollectInput::Candidate(&ours[0])).unwrap();
        let err = session.step(CollectInput::Candidate(&theirs[1])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.accepted(), 1);
        assert_eq!(session.state(), CollectState::Collecting);

        let state = session.step(CollectInput::Candidate(&ours[1])).unwrap();
        assert_eq!(state, CollectState::Ready);
    }

    #[test]
    fn test_threshold_mismatch_rejected() {
        // same identifier, different declared threshold
        let id = ShareIdentifier::new(SystemTime::now());
        let a = Shamir
            .split(&[5u8; 48], ThresholdScheme::new(3, 3).unwrap(), &id)
            .unwrap();
        let b = Shamir
            .split(&[5u8; 48], ThresholdScheme::new(2, 3).unwrap(), &id)
            .unwrap();

        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);
        session
            .step(CollectInput::Candidate(&encode_symbolic(a[0].as_bytes())))
            .unwrap();
        let err = session
            .step(CollectInput::Candidate(&encode_symbolic(b[1].as_bytes())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.accepted(), 1);
    }

    #[test]
    fn test_duplicate_share_rejected() {
        let shares = split(3, 3);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);

        session.step(CollectInput::Candidate(&shares[0])).unwrap();
        let err = session.step(CollectInput::Candidate(&shares[0])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.accepted(), 1);
    }

    #[test]
    fn test_threshold_only_rejects_empty_input() {
        let shares = split(2, 3);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);
        session.step(CollectInput::Candidate(&shares[0])).unwrap();

        let err = session.step(CollectInput::Finish).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = session.step(CollectInput::Candidate("   ")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.state(), CollectState::Collecting);
    }

    #[test]
    fn test_early_finish_policy() {
        let shares = split(3, 3);
        let mut session = CollectSession::new(FinishPolicy::AllowEarlyFinish);

        let err = session.step(CollectInput::Finish).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "nothing to finish with");

        session.step(CollectInput::Candidate(&shares[0])).unwrap();
        let state = session.step(CollectInput::Candidate("")).unwrap();
        assert_eq!(state, CollectState::Ready);

        let collected = session.into_shares().unwrap();
        let err = crate::combine::combine(&collected).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_abort_wipes_and_locks() {
        let shares = split(2, 3);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);
        session.step(CollectInput::Candidate(&shares[0])).unwrap();

        let state = session.step(CollectInput::Abort).unwrap();
        assert_eq!(state, CollectState::Aborted);
        assert_eq!(session.accepted(), 0);

        let err = session.step(CollectInput::Candidate(&shares[1])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.state(), CollectState::Aborted);
        assert!(session.into_shares().is_err());
    }

    #[test]
    fn test_ready_session_refuses_more_input() {
        let shares = split(1, 2);
        let mut session = CollectSession::new(FinishPolicy::ThresholdOnly);
        session.step(CollectInput::Candidate(&shares[0])).unwrap();

        assert!(session.step(CollectInput::Candidate(&shares[1])).is_err());
        assert_eq!(session.state(), CollectState::Ready);
        assert_eq!(session.accepted(), 1);
    }
}
