//! Minimal Bloom filter used to demonstrate probabilistic set membership.
//!
//! Bit positions come from SHA-256 over `"{item}-{seed}"` for seeds
//! `0..hashes`, read as a big-endian integer and reduced modulo the filter
//! size. Lookups can return false positives but never false negatives.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

pub const DEFAULT_SIZE: usize = 30;
pub const DEFAULT_HASHES: usize = 3;

/// How a membership check relates to what was actually inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    TruePositive,
    FalsePositive,
    TrueNegative,
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Membership::TruePositive => write!(f, "definitely present (true positive)"),
            Membership::FalsePositive => write!(f, "FALSE POSITIVE (never added)"),
            Membership::TrueNegative => write!(f, "definitely not present (true negative)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    bits: Vec<bool>,
    hashes: usize,
    /// Ground truth, kept only to classify lookups.
    items: BTreeSet<String>,
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE, DEFAULT_HASHES)
    }
}

impl BloomFilter {
    /// A zero `size` is raised to one bit and zero `hashes` to one probe.
    pub fn new(size: usize, hashes: usize) -> Self {
        Self {
            bits: vec![false; size.max(1)],
            hashes: hashes.max(1),
            items: BTreeSet::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.bits.len()
    }

    pub fn hashes(&self) -> usize {
        self.hashes
    }

    pub fn items(&self) -> &BTreeSet<String> {
        &self.items
    }

    pub fn items_added(&self) -> usize {
        self.items.len()
    }

    /// Bit index for `item` under hash function `seed`.
    pub fn index_for(&self, item: &str, seed: usize) -> usize {
        let digest = Sha256::digest(format!("{}-{}", item, seed).as_bytes());
        let size = self.bits.len() as u128;
        let index = digest
            .iter()
            .fold(0u128, |acc, &byte| (acc * 256 + byte as u128) % size) as usize;
        debug!("bloom probe item={} seed={} digest={}.. index={}", item, seed, hex::encode(&digest[..4]), index);
        index
    }

    fn indexes<'a>(&'a self, item: &'a str) -> impl Iterator<Item = usize> + 'a {
        (0..self.hashes).map(move |seed| self.index_for(item, seed))
    }

    pub fn add(&mut self, item: &str) {
        let indexes: Vec<usize> = self.indexes(item).collect();
        for i in indexes {
            self.bits[i] = true;
        }
        self.items.insert(item.to_string());
    }

    /// `false` means definitely absent; `true` means possibly present.
    pub fn contains(&self, item: &str) -> bool {
        self.indexes(item).all(|i| self.bits[i])
    }

    pub fn check(&self, item: &str) -> Membership {
        match (self.contains(item), self.items.contains(item)) {
            (true, true) => Membership::TruePositive,
            (true, false) => Membership::FalsePositive,
            // A filter never forgets a bit it set.
            (false, _) => Membership::TrueNegative,
        }
    }

    /// The bit array rendered as `0`/`1` characters.
    pub fn bit_string(&self) -> String {
        self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }

    pub fn bits_set(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// `(1 - e^(-k n / m))^k` for the current item count.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        let k = self.hashes as f64;
        let n = self.items.len() as f64;
        let m = self.bits.len() as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }
}

impl fmt::Display for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} bits, {} hashes, {} items)",
            self.bit_string(),
            self.size(),
            self.hashes,
            self.items.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter() {
        let bf = BloomFilter::default();
        assert_eq!(bf.size(), 30);
        assert_eq!(bf.hashes(), 3);
        assert_eq!(bf.bit_string(), "0".repeat(30));
        assert!(!bf.contains("user_999"));
        assert_eq!(bf.estimated_false_positive_rate(), 0.0);
    }

    #[test]
    fn test_index_is_stable_and_in_range() {
        let bf = BloomFilter::new(17, 3);
        for seed in 0..3 {
            let a = bf.index_for("user_123", seed);
            assert_eq!(a, bf.index_for("user_123", seed));
            assert!(a < 17);
        }
    }

    #[test]
    fn test_index_matches_big_endian_reduction() {
        // Modulo 256 keeps only the last digest byte.
        let bf = BloomFilter::new(256, 1);
        let digest = Sha256::digest(b"alpha-0");
        assert_eq!(bf.index_for("alpha", 0), digest[31] as usize);
    }

    #[test]
    fn test_add_sets_at_most_k_bits() {
        let mut bf = BloomFilter::default();
        bf.add("user_123");
        assert!(bf.bits_set() >= 1 && bf.bits_set() <= 3);
        assert!(bf.contains("user_123"));
        assert_eq!(bf.check("user_123"), Membership::TruePositive);
        assert_eq!(bf.items_added(), 1);
    }

    #[test]
    fn test_single_bit_filter_reports_false_positive() {
        let mut bf = BloomFilter::new(1, 2);
        bf.add("a");
        assert_eq!(bf.check("b"), Membership::FalsePositive);
    }

    #[test]
    fn test_zero_size_is_raised() {
        let bf = BloomFilter::new(0, 3);
        assert_eq!(bf.size(), 1);
    }

    #[test]
    fn test_zero_hashes_is_raised() {
        let mut bf = BloomFilter::new(30, 0);
        assert_eq!(bf.hashes(), 1);
        assert!(!bf.contains("never"));
        assert_eq!(bf.check("never"), Membership::TrueNegative);

        bf.add("once");
        assert_eq!(bf.bits_set(), 1);
        assert!(bf.estimated_false_positive_rate() > 0.0);
    }

    #[test]
    fn test_false_positive_estimate_grows() {
        let mut bf = BloomFilter::default();
        bf.add("a");
        let one = bf.estimated_false_positive_rate();
        bf.add("b");
        bf.add("c");
        assert!(bf.estimated_false_positive_rate() > one);
        assert!(one > 0.0 && one < 1.0);
    }
}
