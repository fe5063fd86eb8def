//! Edge key generation.
//!
//! Every graph instance draws an id from a process-wide counter, seeded from
//! a random byte so that keys of graphs built in different processes are
//! unlikely to collide when merged. Keys look like `geid_<id>_<n>`.

use crate::primitives::EDGE_KEY_PREFIX;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static INSTANCE_IDS: LazyLock<AtomicU64> =
    LazyLock::new(|| AtomicU64::new(u64::from(rand::random::<u8>())));

#[derive(Debug, Clone)]
pub(crate) struct EdgeKeyGenerator {
    prefix: String,
    next: u64,
}

impl EdgeKeyGenerator {
    pub(crate) fn new() -> Self {
        let instance = INSTANCE_IDS.fetch_add(1, Ordering::Relaxed);
        Self {
            prefix: format!("{EDGE_KEY_PREFIX}{instance}_"),
            next: 0,
        }
    }

    /// Next key not rejected by `taken`.
    pub(crate) fn generate(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let key = format!("{}{}", self.prefix, self.next);
            self.next += 1;
            if !taken(&key) {
                return key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sequential_per_instance() {
        let mut generator = EdgeKeyGenerator::new();
        let first = generator.generate(|_| false);
        let second = generator.generate(|_| false);
        assert!(first.starts_with(EDGE_KEY_PREFIX));
        assert!(first.ends_with("_0"));
        assert!(second.ends_with("_1"));
    }

    #[test]
    fn instances_get_distinct_prefixes() {
        let a = EdgeKeyGenerator::new();
        let b = EdgeKeyGenerator::new();
        assert_ne!(a.prefix, b.prefix);
    }

    #[test]
    fn taken_keys_are_skipped() {
        let mut generator = EdgeKeyGenerator::new();
        let blocked = format!("{}0", generator.prefix);
        let key = generator.generate(|candidate| candidate == blocked);
        assert_eq!(key, format!("{}1", generator.prefix));
    }
}
