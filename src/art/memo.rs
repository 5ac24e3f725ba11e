use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Recently cached embedded images, keyed by a hash of their raw bytes.
///
/// Tracks albums scanned track after track, where consecutive files carry
/// the same picture.
#[derive(Debug)]
pub struct EmbeddedArtMemo {
    entries: LruCache<u32, PathBuf>,
}

impl EmbeddedArtMemo {
    /// A capacity of 0 is read as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn lookup(&mut self, hash: u32) -> Option<&Path> {
        self.entries.get(&hash).map(PathBuf::as_path)
    }

    pub fn remember(&mut self, hash: u32, path: PathBuf) {
        self.entries.put(hash, path);
    }

    pub fn forget(&mut self, hash: u32) {
        self.entries.pop(&hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_slot_keeps_only_latest() {
        let mut memo = EmbeddedArtMemo::new(1);
        memo.remember(1, PathBuf::from("/c/1.jpg"));
        memo.remember(2, PathBuf::from("/c/2.jpg"));

        assert_eq!(memo.lookup(1), None);
        assert_eq!(memo.lookup(2), Some(Path::new("/c/2.jpg")));
    }

    #[test]
    fn lookup_refreshes_recency() {
        let mut memo = EmbeddedArtMemo::new(2);
        memo.remember(1, PathBuf::from("/c/1.jpg"));
        memo.remember(2, PathBuf::from("/c/2.jpg"));
        memo.lookup(1);
        memo.remember(3, PathBuf::from("/c/3.jpg"));

        assert!(memo.lookup(1).is_some());
        assert!(memo.lookup(2).is_none());
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut memo = EmbeddedArtMemo::new(0);
        memo.remember(7, PathBuf::from("/c/7.jpg"));
        assert_eq!(memo.lookup(7), Some(Path::new("/c/7.jpg")));

        memo.forget(7);
        assert_eq!(memo.lookup(7), None);
    }
}
