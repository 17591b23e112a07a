//! Deterministic 64-bit hashing for labels, neighborhoods and feature pairs.
//!
//! The output must be identical across runs, platforms and compiler versions,
//! so nothing here depends on `std::hash` (whose algorithms are unspecified).

/// Finalizer from SplitMix64.
#[inline]
const fn avalanche(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fold one value into a running hash
#[inline]
#[must_use]
pub const fn combine(seed: u64, value: u64) -> u64 {
    avalanche(
        seed ^ value
            .wrapping_add(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2),
    )
}

/// Order-sensitive hash of a slice
#[must_use]
pub fn hash_slice(seed: u64, values: &[u64]) -> u64 {
    values
        .iter()
        .fold(combine(seed, values.len() as u64), |acc, &v| combine(acc, v))
}

/// Order-insensitive hash: sorts a copy of the values first
#[must_use]
pub fn hash_multiset(seed: u64, values: &mut [u64]) -> u64 {
    values.sort_unstable();
    hash_slice(seed, values)
}

/// Hash a short string label
#[must_use]
pub fn hash_label(seed: u64, label: &str) -> u64 {
    label
        .bytes()
        .fold(combine(seed, label.len() as u64), |acc, b| combine(acc, u64::from(b)))
}

/// Project a 64-bit code into `[0, 2^bitsize)`
#[inline]
#[must_use]
pub const fn to_feature_index(code: u64, bitsize: u32) -> u32 {
    (code & ((1u64 << bitsize) - 1)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_is_deterministic_and_order_sensitive() {
        assert_eq!(combine(1, 2), combine(1, 2));
        assert_ne!(combine(1, 2), combine(2, 1));
        assert_ne!(hash_slice(0, &[1, 2, 3]), hash_slice(0, &[3, 2, 1]));
    }

    #[test]
    fn test_multiset_hash_ignores_order() {
        let mut a = [5, 1, 9];
        let mut b = [9, 5, 1];
        assert_eq!(hash_multiset(7, &mut a), hash_multiset(7, &mut b));
    }

    #[test]
    fn test_slice_length_is_part_of_hash() {
        assert_ne!(hash_slice(0, &[]), hash_slice(0, &[0]));
    }

    #[test]
    fn test_label_hash_distinguishes_labels() {
        assert_ne!(hash_label(0, "A"), hash_label(0, "C"));
        assert_ne!(hash_label(0, "AS"), hash_label(0, "A"));
        assert_eq!(hash_label(3, "GH"), hash_label(3, "GH"));
    }

    #[test]
    fn test_feature_index_is_bounded() {
        for code in [0, 1, u64::MAX, 0xDEAD_BEEF] {
            assert!(to_feature_index(code, 10) < 1024);
        }
        assert_eq!(to_feature_index(u64::MAX, 1), 1);
    }
}
