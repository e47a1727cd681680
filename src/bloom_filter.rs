//! Bloom filter implementation for efficient set membership testing.
//!
//! Used by the hash-join build phase to quickly test if a probe-side key
//! might exist in the build relation without a hash-map lookup.
//!
//! # Properties
//!
//! - No false negatives: If `might_contain` returns `false`, the
//!   element is definitely not in the set.
//! - Possible false positives: If `might_contain` returns `true`,
//!   the element might or might not be in the set.
//! - Space efficient: Uses ~10 bits per element for 1% FP rate.
//!
//! # Example
//!
//! ```
//! use icegraph::bloom_filter::BloomFilter;
//!
//! // Create a filter expecting 10000 elements with 1% false positive rate
//! let mut filter = BloomFilter::new(10000, 0.01);
//!
//! // Insert some values
//! filter.insert(&"hello");
//! filter.insert(&"world");
//!
//! // Check membership
//! assert!(filter.might_contain(&"hello"));  // true (definitely present)
//! assert!(filter.might_contain(&"world"));  // true (definitely present)
//! // filter.might_contain(&"foo") might return true or false
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A Bloom filter for efficient probabilistic set membership testing.
///
/// # Implementation Details
///
/// This implementation uses double hashing to generate k hash values from
/// two base hashes. The bit array is stored as a vector of u64 words.
///
/// ## Memory Layout
///
/// For a filter with m bits, we allocate ceil(m/64) u64 words.
/// Each word stores 64 bits of the filter.
///
/// ## Hash Function
///
/// We use double hashing: h_i(x) = h1(x) + i * h2(x) mod m
///
/// This is equivalent to using k independent hash functions but requires
/// only two hash computations.
#[derive(Clone, Debug)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
}

impl BloomFilter {
    /// Size the filter for `expected_items` elements at `false_positive_rate`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let expected_items = expected_items.max(1) as f64;
        let fp = false_positive_rate.clamp(1e-6, 0.5);
        let num_bits = (-(expected_items * fp.ln()) / (std::f64::consts::LN_2.powi(2))).ceil() as u64;
        let num_bits = num_bits.max(64);
        let num_hashes = ((num_bits as f64 / expected_items) * std::f64::consts::LN_2)
            .round()
            .max(1.0) as u32;

        BloomFilter {
            bits: vec![0u64; ((num_bits + 63) / 64) as usize],
            num_bits,
            num_hashes,
        }
    }

    fn hashes<T: Hash + ?Sized>(&self, item: &T) -> (u64, u64) {
        let mut h1 = DefaultHasher::new();
        item.hash(&mut h1);
        let base1 = h1.finish();

        let mut h2 = DefaultHasher::new();
        base1.hash(&mut h2);
        item.hash(&mut h2);
        let base2 = h2.finish();

        (base1, base2)
    }

    fn bit_index(&self, base1: u64, base2: u64, i: u32) -> u64 {
        base1.wrapping_add((i as u64).wrapping_mul(base2)) % self.num_bits
    }

    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let (base1, base2) = self.hashes(item);
        for i in 0..self.num_hashes {
            let idx = self.bit_index(base1, base2, i);
            self.bits[(idx / 64) as usize] |= 1u64 << (idx % 64);
        }
    }

    /// `false` is a definite negative; `true` may be a false positive.
    pub fn might_contain<T: Hash + ?Sized>(&self, item: &T) -> bool {
        let (base1, base2) = self.hashes(item);
        (0..self.num_hashes).all(|i| {
            let idx = self.bit_index(base1, base2, i);
            self.bits[(idx / 64) as usize] & (1u64 << (idx % 64)) != 0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_items_are_always_found() {
        let mut filter = BloomFilter::new(1000, 0.01);
        for i in 0..1000 {
            filter.insert(&i);
        }
        for i in 0..1000 {
            assert!(filter.might_contain(&i));
        }
    }

    #[test]
    fn false_positive_rate_is_roughly_bounded() {
        let mut filter = BloomFilter::new(1000, 0.01);
        for i in 0..1000 {
            filter.insert(&(i * 2));
        }
        let false_positives = (0..1000).filter(|i| i % 2 == 1 && filter.might_contain(i)).count();
        assert!(false_positives < 100, "false positive rate far exceeds configured bound");
    }
}
