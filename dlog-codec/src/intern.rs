//! Encoder-side dictionary and string interning
//!
//! Object keys are promoted to the dictionary on first sight. Other strings
//! must first be seen `intern_threshold` times inside a bounded usage
//! tracker; the sighting that finds the count at the threshold promotes them.

use std::num::NonZeroUsize;

use ahash::AHashMap;
use lru::LruCache;

/// How hard a string should be pushed into the dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternMode {
    /// Promote only once the usage tracker says the string recurs
    ByFrequency,
    /// Promote immediately (object keys)
    Force,
}

/// Bounded occurrence counter for strings that are not yet interned.
///
/// Eviction is FIFO by first insertion: counts are bumped through
/// `peek_mut`, which never refreshes an entry's recency, so the least
/// recently used entry is always the oldest one. A capacity of zero tracks
/// nothing and so never promotes.
#[derive(Debug)]
pub struct UsageTracker {
    counts: Option<LruCache<String, usize>>,
    threshold: usize,
}

impl UsageTracker {
    /// Create a tracker promoting at `threshold` and holding `capacity` strings
    pub fn new(threshold: usize, capacity: usize) -> Self {
        Self {
            counts: NonZeroUsize::new(capacity).map(LruCache::new),
            threshold,
        }
    }

    /// Record a sighting of `value`. Returns `true` when it should be promoted
    /// now, in which case it is no longer tracked.
    pub fn should_intern(&mut self, value: &str) -> bool {
        let Some(counts) = self.counts.as_mut() else {
            return false;
        };

        if let Some(count) = counts.peek_mut(value) {
            if *count >= self.threshold {
                counts.pop(value);
                return true;
            }
            *count += 1;
            return false;
        }

        counts.push(value.to_string(), 1);
        false
    }

    /// Stop tracking `value` (it was promoted by force)
    pub fn remove(&mut self, value: &str) {
        if let Some(counts) = self.counts.as_mut() {
            counts.pop(value);
        }
    }

    /// Current occurrence count of `value`, if tracked
    pub fn count(&self, value: &str) -> Option<usize> {
        self.counts.as_ref()?.peek(value).copied()
    }

    /// Number of strings currently tracked
    pub fn len(&self) -> usize {
        self.counts.as_ref().map_or(0, LruCache::len)
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every tracked string
    pub fn clear(&mut self) {
        if let Some(counts) = self.counts.as_mut() {
            counts.clear();
        }
    }
}

/// Encoder-side dictionary plus the usage tracker that feeds it.
///
/// Strings interned since the last [`StringInterner::mark_flushed`] are
/// pending: the framer must announce them in an `A` record before the value
/// that first references them.
#[derive(Debug)]
pub struct StringInterner {
    entries: Vec<String>,
    index: AHashMap<String, u64>,
    flushed: usize,
    tracker: UsageTracker,
}

impl StringInterner {
    /// Create an empty interner
    pub fn new(threshold: usize, cache_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
            flushed: 0,
            tracker: UsageTracker::new(threshold, cache_size),
        }
    }

    /// Dictionary index for `value`, promoting it if `mode` or its usage
    /// count allows. `None` means the caller must emit a literal.
    pub fn intern(&mut self, value: &str, mode: InternMode) -> Option<u64> {
        if let Some(&idx) = self.index.get(value) {
            return Some(idx);
        }

        let promote = match mode {
            InternMode::Force => {
                self.tracker.remove(value);
                true
            }
            InternMode::ByFrequency => self.tracker.should_intern(value),
        };

        if !promote {
            return None;
        }

        let idx = self.entries.len() as u64;
        self.entries.push(value.to_string());
        self.index.insert(value.to_string(), idx);
        Some(idx)
    }

    /// Index of an already interned string
    pub fn lookup(&self, value: &str) -> Option<u64> {
        self.index.get(value).copied()
    }

    /// String at `idx`
    pub fn get(&self, idx: u64) -> Option<&str> {
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    /// Dictionary entries in index order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entries interned but not yet announced in an `A` record
    pub fn pending(&self) -> &[String] {
        &self.entries[self.flushed..]
    }

    /// Whether an `A` record is owed
    pub fn has_pending(&self) -> bool {
        self.flushed < self.entries.len()
    }

    /// Mark every pending entry as announced, returning how many there were
    pub fn mark_flushed(&mut self) -> usize {
        let count = self.entries.len() - self.flushed;
        self.flushed = self.entries.len();
        count
    }

    /// Number of dictionary entries in the current epoch
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Usage tracker backing frequency promotion
    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    /// Start a new epoch. The usage tracker survives unless `reset_usage`.
    pub fn clear(&mut self, reset_usage: bool) {
        self.entries.clear();
        self.index.clear();
        self.flushed = 0;
        if reset_usage {
            self.tracker.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_interns_on_first_sight() {
        let mut interner = StringInterner::new(10, 100);
        assert_eq!(interner.intern("level", InternMode::Force), Some(0));
        assert_eq!(interner.intern("msg", InternMode::Force), Some(1));
        assert_eq!(interner.intern("level", InternMode::Force), Some(0));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_frequency_promotion_after_threshold() {
        let mut interner = StringInterner::new(10, 100);
        for _ in 0..10 {
            assert_eq!(interner.intern("x", InternMode::ByFrequency), None);
        }
        assert_eq!(interner.tracker().count("x"), Some(10));
        assert_eq!(interner.intern("x", InternMode::ByFrequency), Some(0));
        assert_eq!(interner.tracker().count("x"), None);
        assert_eq!(interner.intern("x", InternMode::ByFrequency), Some(0));
    }

    #[test]
    fn test_interned_string_is_not_tracked() {
        let mut interner = StringInterner::new(10, 100);
        interner.intern("host", InternMode::ByFrequency);
        assert_eq!(interner.tracker().count("host"), Some(1));
        interner.intern("host", InternMode::Force);
        assert_eq!(interner.tracker().count("host"), None);
        assert_eq!(interner.lookup("host"), Some(0));
    }

    #[test]
    fn test_pending_and_flush() {
        let mut interner = StringInterner::new(10, 100);
        interner.intern("a", InternMode::Force);
        interner.intern("b", InternMode::Force);
        assert!(interner.has_pending());
        assert_eq!(interner.pending(), &["a".to_string(), "b".to_string()]);
        assert_eq!(interner.mark_flushed(), 2);
        assert!(!interner.has_pending());

        interner.intern("c", InternMode::Force);
        assert_eq!(interner.pending(), &["c".to_string()]);
        assert_eq!(interner.get(2), Some("c"));
    }

    #[test]
    fn test_clear_keeps_usage_by_default() {
        let mut interner = StringInterner::new(3, 100);
        interner.intern("k", InternMode::Force);
        interner.intern("v", InternMode::ByFrequency);
        interner.clear(false);
        assert!(interner.is_empty());
        assert_eq!(interner.lookup("k"), None);
        assert_eq!(interner.tracker().count("v"), Some(1));
        assert_eq!(interner.intern("k", InternMode::Force), Some(0));

        interner.clear(true);
        assert!(interner.tracker().is_empty());
    }

    #[test]
    fn test_tracker_evicts_in_insertion_order() {
        let mut tracker = UsageTracker::new(10, 2);
        tracker.should_intern("a");
        tracker.should_intern("b");
        // Bumping "a" does not protect it from eviction.
        tracker.should_intern("a");
        tracker.should_intern("c");
        assert_eq!(tracker.count("a"), None);
        assert_eq!(tracker.count("b"), Some(1));
        assert_eq!(tracker.count("c"), Some(1));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_tracker_eviction_resets_count() {
        let mut tracker = UsageTracker::new(2, 1);
        tracker.should_intern("a");
        tracker.should_intern("a");
        tracker.should_intern("b");
        assert!(!tracker.should_intern("a"));
        assert_eq!(tracker.count("a"), Some(1));
    }

    #[test]
    fn test_tracker_threshold_zero_behaves_like_one() {
        let mut zero = UsageTracker::new(0, 8);
        let mut one = UsageTracker::new(1, 8);
        for _ in 0..3 {
            assert_eq!(zero.should_intern("a"), one.should_intern("a"));
        }
        let mut tracker = UsageTracker::new(0, 8);
        assert!(!tracker.should_intern("b"));
        assert!(tracker.should_intern("b"));
    }

    #[test]
    fn test_tracker_skips_stale_slots() {
        let mut tracker = UsageTracker::new(1, 2);
        tracker.should_intern("a");
        assert!(tracker.should_intern("a"));
        tracker.should_intern("b");
        tracker.should_intern("c");
        tracker.should_intern("d");
        assert_eq!(tracker.count("b"), None);
        assert_eq!(tracker.count("c"), Some(1));
        assert_eq!(tracker.count("d"), Some(1));
    }

    #[test]
    fn test_tracker_with_zero_capacity_never_promotes() {
        let mut tracker = UsageTracker::new(1, 0);
        for _ in 0..5 {
            assert!(!tracker.should_intern("a"));
        }
        assert!(tracker.is_empty());
    }
}
