// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity chains.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A hierarchical address naming one scene node across the engine boundary.
///
/// Chains are allocated by the engine and are opaque to the host: the only
/// meaningful operations are structural equality and hashing, which compare
/// the full sequence. A chain is both the primary key of the element tables
/// and, inside a text element's clip list, a foreign key into the frame
/// table.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdChain(Vec<u64>);

impl IdChain {
    /// Creates a chain from its segments.
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<u64>) -> Self {
        Self(segments)
    }

    /// Returns the segments, outermost ancestor first.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.0
    }

    /// Returns the number of segments.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty chain.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u64>> for IdChain {
    fn from(segments: Vec<u64>) -> Self {
        Self(segments)
    }
}

impl From<&[u64]> for IdChain {
    fn from(segments: &[u64]) -> Self {
        Self(segments.to_vec())
    }
}

impl<const N: usize> From<[u64; N]> for IdChain {
    fn from(segments: [u64; N]) -> Self {
        Self(segments.to_vec())
    }
}

impl fmt::Debug for IdChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdChain{:?}", self.0)
    }
}

impl fmt::Display for IdChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    #[test]
    fn equality_is_structural() {
        assert_eq!(IdChain::from([1, 2, 3]), IdChain::new(vec![1, 2, 3]));
        assert_ne!(IdChain::from([1, 2]), IdChain::from([1, 2, 3]));
        assert_ne!(IdChain::from([2, 1]), IdChain::from([1, 2]));
    }

    #[test]
    fn prefix_chains_are_distinct_keys() {
        let mut set = HashSet::new();
        set.insert(IdChain::from([4]));
        set.insert(IdChain::from([4, 0]));
        set.insert(IdChain::from([4, 0]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_joins_segments() {
        assert_eq!(IdChain::from([7, 0, 12]).to_string(), "7.0.12");
        assert_eq!(IdChain::default().to_string(), "");
    }

    #[test]
    fn serializes_as_plain_sequence() {
        let json = serde_json::to_string(&IdChain::from([1, 2])).unwrap();
        assert_eq!(json, "[1,2]");
    }
}
