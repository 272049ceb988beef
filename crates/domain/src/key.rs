//! Dot-delimited key paths, pre-split into ordered segments.
//!
//! Keys are split **once**, at construction, and compared segment by segment.
//! This keeps prefix matching positional: `state.pressure` relates to
//! `state` and to `state.pressure.low`, but never to `state.pressure2`.

use std::fmt;
use std::str::FromStr;

use crate::error::HearthError;

/// An ordered sequence of key segments (`"room.lights.ceiling"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Split a dot-delimited key into its segments.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::InvalidKey`] when `key` is empty.
    pub fn parse(key: &str) -> Result<Self, HearthError> {
        if key.is_empty() {
            return Err(HearthError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(Self {
            segments: key.split('.').map(str::to_string).collect(),
        })
    }

    /// The individual segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether two paths agree on every position up to the shorter length.
    ///
    /// This is the ancestor-or-descendant relation used for listener
    /// matching — deliberately symmetric, and never a plain substring test.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(ours, theirs)| ours == theirs)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for KeyPath {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
