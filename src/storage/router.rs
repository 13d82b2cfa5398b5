//! Key-to-shard routing.
//!
//! Keys are assigned to shards with 32-bit FNV-1a. The hash is unseeded, so
//! the same key lands on the same shard in every process that uses the same
//! shard count. Snapshots never record shard indices; loading re-routes every
//! key through the router of the receiving store.

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 16_777_619;

/// Maps keys to shard indices for a fixed number of shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRouter {
    shard_count: usize,
}

impl HashRouter {
    /// Creates a router for `shard_count` shards (at least one).
    pub fn new(shard_count: usize) -> Self {
        Self {
            shard_count: shard_count.max(1),
        }
    }

    /// Raw 32-bit FNV-1a hash of a key.
    #[inline]
    pub fn hash(key: &str) -> u32 {
        key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
        })
    }

    /// Returns the index of the shard that owns `key`.
    #[inline]
    pub fn route(&self, key: &str) -> usize {
        Self::hash(key) as usize % self.shard_count
    }

    /// Number of shards this router distributes over.
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(HashRouter::hash(""), 0x811c_9dc5);
        assert_eq!(HashRouter::hash("a"), 0xe40c_292c);
        assert_eq!(HashRouter::hash("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_zero_shards_clamped() {
        let router = HashRouter::new(0);
        assert_eq!(router.shard_count(), 1);
        assert_eq!(router.route("anything"), 0);
    }

    #[test]
    fn test_keys_spread_over_shards() {
        let router = HashRouter::new(8);
        let mut seen = [false; 8];
        for i in 0..1000 {
            seen[router.route(&format!("key-{}", i))] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    proptest! {
        #[test]
        fn prop_route_is_deterministic(key in ".*", shards in 1usize..128) {
            let router = HashRouter::new(shards);
            let first = router.route(&key);
            prop_assert!(first < shards);
            prop_assert_eq!(first, router.route(&key));
            prop_assert_eq!(first, HashRouter::new(shards).route(&key));
        }
    }
}
