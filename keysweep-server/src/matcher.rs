//! Match predicates
//!
//! A matcher decides whether a candidate string hits the job's fingerprint.
//! Workers only see the `Matcher` trait; the concrete comparison is picked
//! from configuration at startup.

use std::str::FromStr;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors a matcher can report for a fingerprint it cannot work with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("malformed fingerprint: {0}")]
    MalformedFingerprint(String),
}

/// Predicate applied to every candidate of a search
pub trait Matcher: Send + Sync {
    /// Returns whether `candidate` hits `fingerprint`
    fn is_match(&self, candidate: &str, fingerprint: &str) -> Result<bool, MatchError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Compares the candidate to the fingerprint verbatim
pub struct LiteralMatcher;

impl Matcher for LiteralMatcher {
    fn is_match(&self, candidate: &str, fingerprint: &str) -> Result<bool, MatchError> {
        Ok(candidate == fingerprint)
    }

    fn name(&self) -> &'static str {
        "literal"
    }
}

/// Compares the hex SHA-256 digest of the candidate to the fingerprint
///
/// The fingerprint must be 64 hex characters; case is ignored.
pub struct Sha256Matcher;

impl Sha256Matcher {
    fn check_fingerprint(fingerprint: &str) -> Result<(), MatchError> {
        if fingerprint.len() != 64 || !fingerprint.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MatchError::MalformedFingerprint(format!(
                "expected 64 hex characters, got {:?}",
                fingerprint
            )));
        }
        Ok(())
    }
}

impl Matcher for Sha256Matcher {
    fn is_match(&self, candidate: &str, fingerprint: &str) -> Result<bool, MatchError> {
        Self::check_fingerprint(fingerprint)?;
        let digest = hex::encode(Sha256::digest(candidate.as_bytes()));
        Ok(digest.eq_ignore_ascii_case(fingerprint))
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}

/// Matcher selection, as read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Sha256,
    Literal,
}

impl MatcherKind {
    pub fn build(self) -> Arc<dyn Matcher> {
        match self {
            MatcherKind::Sha256 => Arc::new(Sha256Matcher),
            MatcherKind::Literal => Arc::new(LiteralMatcher),
        }
    }
}

impl FromStr for MatcherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(MatcherKind::Sha256),
            "literal" => Ok(MatcherKind::Literal),
            other => anyhow::bail!("unknown matcher '{}' (expected sha256 or literal)", other),
        }
    }
}
