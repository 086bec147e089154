//! SHA-1 derivation for the rev_sha1 column.
//!
//! MediaWiki stores the digest as an unsigned big-endian integer rendered
//! in base 36 and zero-padded to 31 characters.

use crate::config::SHA1_BASE36_WIDTH;
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest, Sha1};

static SHA1_BASE36_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-z]{31}$").unwrap());

/// Compute the base-36 SHA-1 of a revision body.
pub fn sha1_base36(data: &[u8]) -> String {
    let digest = Sha1::digest(data);
    let value = BigUint::from_bytes_be(&digest);
    let encoded = value.to_str_radix(36);
    format!("{:0>width$}", encoded, width = SHA1_BASE36_WIDTH)
}

/// Whether a source-provided `<sha1>` value can be trusted verbatim.
pub fn is_valid_sha1(value: &str) -> bool {
    SHA1_BASE36_RE.is_match(value)
}
