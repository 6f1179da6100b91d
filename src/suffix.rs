//! Suffix and truncation caches for the suffix search.
//!
//! Both caches are bounded LRU maps keyed by folded base names. They only
//! shorten the search: availability is always re-checked against the
//! registry, so an evicted or disabled cache just means more probing.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Remembers the last numeric suffix issued per base name.
pub struct SuffixCache {
	last: Option<LruCache<String, u64>>,
}

impl SuffixCache {
	/// Create a cache holding up to `capacity` bases. A capacity of zero
	/// disables caching, so every search starts at suffix `1`.
	pub fn new(capacity: usize) -> Self {
		Self {
			last: NonZeroUsize::new(capacity).map(LruCache::new),
		}
	}

	/// The suffix to try first for `base_lower`: one past the last issued.
	pub fn next_suffix(&mut self, base_lower: &str) -> u64 {
		self.last
			.as_mut()
			.and_then(|cache| cache.get(base_lower).copied())
			.unwrap_or(0)
			+ 1
	}

	pub fn record_suffix(&mut self, base_lower: &str, suffix: u64) {
		if let Some(cache) = self.last.as_mut() {
			cache.put(base_lower.to_string(), suffix);
		}
	}

	pub fn len(&self) -> usize {
		self.last.as_ref().map_or(0, LruCache::len)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Remembers how far an original base had to be shortened to fit a suffix.
pub struct TruncationCache {
	lengths: Option<LruCache<String, usize>>,
}

impl TruncationCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			lengths: NonZeroUsize::new(capacity).map(LruCache::new),
		}
	}

	/// Grapheme length the base was last truncated to, if known.
	pub fn get(&mut self, original_lower: &str) -> Option<usize> {
		self.lengths
			.as_mut()
			.and_then(|cache| cache.get(original_lower).copied())
	}

	pub fn record(&mut self, original_lower: &str, length: usize) {
		if let Some(cache) = self.lengths.as_mut() {
			cache.put(original_lower.to_string(), length);
		}
	}
}
