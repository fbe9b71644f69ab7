//! Human-transportable share encodings
//!
//! - symbolic: Crockford base32 (`0-9A-Z` without `I L O U`), uppercase,
//!   no padding. Decoding forgives case, hyphens, whitespace and the
//!   look-alikes `i`/`l` → `1`, `o` → `0`.
//! - words: one word per byte, from the first 256 words of the BIP-39
//!   English list.

use bip39::Language;
use data_encoding::Encoding;
use data_encoding_macro::new_encoding;
use sharkey_core::{SharkeyError, SharkeyResult};
use zeroize::Zeroizing;

const CROCKFORD_SYMBOLS: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Crockford base32, no padding, non-zero trailing bits rejected.
const CROCKFORD: Encoding = new_encoding! {
    symbols: "0123456789ABCDEFGHJKMNPQRSTVWXYZ",
    check_trailing_bits: true,
};

/// Accepted symbolic length range after normalization.
const SYMBOLIC_MIN_LEN: usize = 32;
const SYMBOLIC_MAX_LEN: usize = 256;

/// Number of BIP-39 words in use: one per byte value.
const WORD_COUNT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareFormat {
    Symbolic,
    Words,
}

impl ShareFormat {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            ShareFormat::Symbolic => encode_symbolic(bytes),
            ShareFormat::Words => encode_words(bytes),
        }
    }

    /// Guess which encoding `text` is in. `None` if it looks like neither.
    ///
    /// A run of short words can also pass as base32 once whitespace is
    /// dropped, so several tokens that are all share words win over base32.
    pub fn detect(text: &str) -> Option<ShareFormat> {
        if is_word_list(text) {
            Some(ShareFormat::Words)
        } else if is_symbolic(&normalize_symbolic(text)) {
            Some(ShareFormat::Symbolic)
        } else if text.split_whitespace().next().is_some() {
            Some(ShareFormat::Words)
        } else {
            None
        }
    }
}

pub fn encode_symbolic(bytes: &[u8]) -> String {
    CROCKFORD.encode(bytes)
}

/// Fix common transcription typos: uppercase, drop hyphens and
/// whitespace, `I`/`L` → `1`, `O` → `0`.
fn normalize_symbolic(text: &str) -> Zeroizing<String> {
    Zeroizing::new(
        text.chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .map(|c| match c.to_ascii_uppercase() {
                'I' | 'L' => '1',
                'O' => '0',
                other => other,
            })
            .collect(),
    )
}

fn is_symbolic(normalized: &str) -> bool {
    (SYMBOLIC_MIN_LEN..=SYMBOLIC_MAX_LEN).contains(&normalized.len())
        && normalized.chars().all(|c| CROCKFORD_SYMBOLS.contains(c))
}

/// More than one token, every one of them a share word.
fn is_word_list(text: &str) -> bool {
    let mut tokens = text.split_whitespace();
    tokens.clone().nth(1).is_some() && tokens.all(|word| word_value(word).is_some())
}

fn word_value(word: &str) -> Option<u8> {
    let lower = Zeroizing::new(word.to_lowercase());
    match Language::English.find_word(&lower) {
        Some(idx) if (idx as usize) < WORD_COUNT => Some(idx as u8),
        _ => None,
    }
}

pub fn decode_symbolic(text: &str) -> SharkeyResult<Vec<u8>> {
    let normalized = normalize_symbolic(text);
    if !is_symbolic(&normalized) {
        return Err(SharkeyError::Format(format!(
            "share is not valid Base32 Crockford encoded data \
             ({SYMBOLIC_MIN_LEN}-{SYMBOLIC_MAX_LEN} characters)"
        )));
    }
    CROCKFORD
        .decode(normalized.as_bytes())
        .map_err(|e| SharkeyError::Format(format!("share is not valid Base32 Crockford encoded data: {e}")))
}

pub fn encode_words(bytes: &[u8]) -> String {
    let list = Language::English.word_list();
    bytes
        .iter()
        .map(|&b| list[b as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn decode_words(text: &str) -> SharkeyResult<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::new());
    for (pos, word) in text.split_whitespace().enumerate() {
        match word_value(word) {
            Some(value) => out.push(value),
            None => {
                return Err(SharkeyError::Format(format!(
                    "word {} is not in the share word list",
                    pos + 1
                )))
            }
        }
    }
    if out.is_empty() {
        return Err(SharkeyError::Format("share contains no words".into()));
    }
    Ok(std::mem::take(&mut *out))
}

/// Decode either encoding, as picked by [`ShareFormat::detect`]. Text
/// that looks symbolic but fails to decode is retried as words, and the
/// word decoder's error is reported when both fail.
pub fn decode_auto(text: &str) -> SharkeyResult<Vec<u8>> {
    if ShareFormat::detect(text) == Some(ShareFormat::Symbolic) {
        if let Ok(bytes) = decode_symbolic(text) {
            return Ok(bytes);
        }
    }
    decode_words(text)
}
