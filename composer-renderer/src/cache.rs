//! Decoded image cache for the compositor.
//!
//! Layer sources are decoded once and kept as premultiplied pixmaps, keyed by
//! their `src` string. Entries are evicted least-recently-used first when the
//! byte or entry limit would be exceeded.

use std::collections::HashMap;

use tiny_skia::Pixmap;

use crate::error::RenderResult;
use crate::image::decode_source;

/// Entry in the image cache.
#[derive(Debug)]
struct CacheEntry {
    /// Decoded, premultiplied pixels.
    pixmap: Pixmap,
    /// Logical time of the last access.
    last_used: u64,
    /// Size in bytes.
    size_bytes: usize,
}

/// Configuration for the image cache.
#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    /// Maximum cache size in bytes.
    pub max_size_bytes: usize,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 256 * 1024 * 1024, // 256 MB
            max_entries: 256,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (decodes).
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

/// Source-keyed cache of decoded layer images.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, CacheEntry>,
    config: ImageCacheConfig,
    current_size: usize,
    clock: u64,
    stats: CacheStats,
}

impl ImageCache {
    /// Create a cache with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ImageCacheConfig::default())
    }

    /// Create a cache with custom limits.
    #[must_use]
    pub fn with_config(config: ImageCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            current_size: 0,
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Decoded pixmap for `src`, decoding and caching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or decoded. Failed
    /// decodes are not cached.
    pub fn get_or_load(&mut self, src: &str) -> RenderResult<&Pixmap> {
        self.clock += 1;
        if self.entries.contains_key(src) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let pixmap = decode_source(src)?.to_pixmap()?;
            tracing::debug!(
                "Decoded layer image {}x{} ({} cached)",
                pixmap.width(),
                pixmap.height(),
                self.entries.len()
            );
            self.insert(src.to_string(), pixmap);
        }

        let clock = self.clock;
        let entry = self
            .entries
            .get_mut(src)
            .ok_or_else(|| crate::RenderError::Resource(format!("evicted while loading: {src}")))?;
        entry.last_used = clock;
        Ok(&entry.pixmap)
    }

    /// Insert a pixmap, evicting older entries if needed.
    pub fn insert(&mut self, key: String, pixmap: Pixmap) {
        let size_bytes = pixmap.data().len();

        if let Some(old) = self.entries.remove(&key) {
            self.current_size -= old.size_bytes;
        }

        self.evict_if_needed(size_bytes);

        self.current_size += size_bytes;
        self.entries.insert(
            key,
            CacheEntry {
                pixmap,
                last_used: self.clock,
                size_bytes,
            },
        );
    }

    /// Check if a source is cached.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cache size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_size
    }

    /// Cache statistics.
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn evict_if_needed(&mut self, needed_bytes: usize) {
        while self.current_size + needed_bytes > self.config.max_size_bytes
            && !self.entries.is_empty()
        {
            self.evict_lru();
        }

        while self.entries.len() >= self.config.max_entries.max(1) && !self.entries.is_empty() {
            self.evict_lru();
        }
    }

    fn evict_lru(&mut self) {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest_key {
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size_bytes;
                self.stats.evictions += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn pixmap(size: u32) -> Pixmap {
        Pixmap::new(size, size).expect("pixmap")
    }

    #[test]
    fn second_load_is_a_hit() {
        let mut cache = ImageCache::new();
        assert_eq!(cache.get_or_load(PIXEL_URI).expect("load").width(), 1);
        cache.get_or_load(PIXEL_URI).expect("load");
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_decode_is_not_cached() {
        let mut cache = ImageCache::new();
        assert!(cache.get_or_load("data:image/png;base64,AAAA").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_limit_evicts_least_recently_used() {
        let mut cache = ImageCache::with_config(ImageCacheConfig {
            max_size_bytes: usize::MAX,
            max_entries: 2,
        });
        cache.insert("a".into(), pixmap(2));
        cache.get_or_load(PIXEL_URI).expect("load");
        cache.insert("b".into(), pixmap(2));
        assert!(!cache.contains("a"));
        assert!(cache.contains(PIXEL_URI));
        assert!(cache.contains("b"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn size_limit_evicts() {
        let mut cache = ImageCache::with_config(ImageCacheConfig {
            max_size_bytes: 100,
            max_entries: 10,
        });
        cache.insert("a".into(), pixmap(4)); // 64 bytes
        cache.insert("b".into(), pixmap(4));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_bytes(), 64);
        cache.clear();
        assert_eq!(cache.size_bytes(), 0);
    }
}
