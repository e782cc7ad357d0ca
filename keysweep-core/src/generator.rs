//! Candidate generator
//!
//! Enumerates every string of length `1..=max_length` over an ordered
//! alphabet: shorter strings first, then lexicographically by alphabet
//! position. Any zero-based index can be used as a starting point, which
//! lets a search resume without replaying the candidates before it.

use std::collections::HashSet;

use thiserror::Error;

/// Errors raised when building a generator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("alphabet must not be empty")]
    EmptyAlphabet,

    #[error("alphabet contains duplicate character {0:?}")]
    DuplicateCharacter(char),

    #[error("max length must be greater than 0")]
    ZeroLength,

    #[error("keyspace for {radix} characters up to length {max_length} does not fit in 64 bits")]
    KeyspaceOverflow { radix: usize, max_length: usize },
}

/// Σ radix^i for i in 1..=max_length, or `None` on overflow
pub fn keyspace_size(radix: u64, max_length: usize) -> Option<u64> {
    let mut total: u64 = 0;
    let mut block: u64 = 1;
    for _ in 0..max_length {
        block = block.checked_mul(radix)?;
        total = total.checked_add(block)?;
    }
    Some(total)
}

/// Deterministic, restartable enumeration of an alphabet's keyspace
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    alphabet: Vec<char>,
    total: u64,
}

impl CandidateGenerator {
    /// Validates the parameters and computes the keyspace size
    pub fn new(alphabet: &str, max_length: usize) -> Result<Self, GeneratorError> {
        let chars: Vec<char> = alphabet.chars().collect();
        if chars.is_empty() {
            return Err(GeneratorError::EmptyAlphabet);
        }

        let mut seen = HashSet::with_capacity(chars.len());
        for &c in &chars {
            if !seen.insert(c) {
                return Err(GeneratorError::DuplicateCharacter(c));
            }
        }

        if max_length == 0 {
            return Err(GeneratorError::ZeroLength);
        }

        let total = keyspace_size(chars.len() as u64, max_length).ok_or(
            GeneratorError::KeyspaceOverflow {
                radix: chars.len(),
                max_length,
            },
        )?;

        Ok(Self {
            alphabet: chars,
            total,
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Iterates from the first candidate
    pub fn iter(&self) -> Candidates<'_> {
        self.iter_from(0)
    }

    /// Iterates from the candidate at zero-based `index`
    ///
    /// An index at or past the end yields an empty iterator.
    pub fn iter_from(&self, index: u64) -> Candidates<'_> {
        if index >= self.total {
            return Candidates {
                alphabet: &self.alphabet,
                digits: Vec::new(),
                remaining: 0,
            };
        }

        let radix = self.alphabet.len() as u64;
        let mut offset = index;
        let mut length = 1;
        let mut block = radix;
        while offset >= block {
            offset -= block;
            length += 1;
            block = block.saturating_mul(radix);
        }

        let mut digits = vec![0usize; length];
        for digit in digits.iter_mut().rev() {
            *digit = (offset % radix) as usize;
            offset /= radix;
        }

        Candidates {
            alphabet: &self.alphabet,
            digits,
            remaining: self.total - index,
        }
    }
}

impl<'a> IntoIterator for &'a CandidateGenerator {
    type Item = String;
    type IntoIter = Candidates<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over candidates, holding the current position as alphabet indices
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    alphabet: &'a [char],
    digits: Vec<usize>,
    remaining: u64,
}

impl Candidates<'_> {
    /// Moves `digits` to the next candidate like an odometer, growing by one
    /// position when every digit wraps.
    fn advance(&mut self) {
        let radix = self.alphabet.len();
        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < radix {
                return;
            }
            *digit = 0;
        }
        self.digits.push(0);
    }
}

impl Iterator for Candidates<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.remaining == 0 {
            return None;
        }

        let candidate: String = self.digits.iter().map(|&d| self.alphabet[d]).collect();
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}
