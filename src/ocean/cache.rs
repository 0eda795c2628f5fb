//! Per-resolution resource cache
//!
//! Builders keep butterfly tables and noise textures keyed by resolution so
//! repeated builds at the same size reuse them. Entries live until evicted.

use rustc_hash::FxHashMap;

pub struct ResolutionCache<T> {
    name: &'static str,
    entries: FxHashMap<u32, T>,
}

impl<T> ResolutionCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: FxHashMap::default(),
        }
    }

    /// Cached entry for `resolution`, creating it on first use
    pub fn get_or_try_insert_with<E>(
        &mut self,
        resolution: u32,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        if !self.entries.contains_key(&resolution) {
            log::debug!(
                "[ResolutionCache::{}] creating entry for resolution {}",
                self.name,
                resolution
            );
            let value = create()?;
            self.entries.insert(resolution, value);
        }
        // Inserted above when missing
        Ok(&self.entries[&resolution])
    }

    pub fn get(&self, resolution: u32) -> Option<&T> {
        self.entries.get(&resolution)
    }

    pub fn contains(&self, resolution: u32) -> bool {
        self.entries.contains_key(&resolution)
    }

    pub fn evict(&mut self, resolution: u32) -> Option<T> {
        let evicted = self.entries.remove(&resolution);
        if evicted.is_some() {
            log::debug!(
                "[ResolutionCache::{}] evicted resolution {}",
                self.name,
                resolution
            );
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove every entry, handing them back for explicit release
    pub fn drain(&mut self) -> Vec<T> {
        if !self.entries.is_empty() {
            log::debug!(
                "[ResolutionCache::{}] draining {} entries",
                self.name,
                self.entries.len()
            );
        }
        self.entries.drain().map(|(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_once_per_resolution() {
        let mut cache = ResolutionCache::new("test");
        let mut created = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with(64, || {
                    created += 1;
                    Ok::<_, ()>(64 * 2)
                })
                .unwrap();
            assert_eq!(*value, 128);
        }
        assert_eq!(created, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_creation_is_not_cached() {
        let mut cache: ResolutionCache<u32> = ResolutionCache::new("test");
        assert!(cache.get_or_try_insert_with(8, || Err("boom")).is_err());
        assert!(!cache.contains(8));
    }

    #[test]
    fn test_evict_and_clear() {
        let mut cache = ResolutionCache::new("test");
        cache.get_or_try_insert_with(8, || Ok::<_, ()>(1)).unwrap();
        cache.get_or_try_insert_with(16, || Ok::<_, ()>(2)).unwrap();

        assert_eq!(cache.evict(8), Some(1));
        assert_eq!(cache.evict(8), None);
        assert_eq!(cache.get(16), Some(&2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_drain_returns_every_entry() {
        let mut cache = ResolutionCache::new("test");
        cache.get_or_try_insert_with(8, || Ok::<_, ()>(1)).unwrap();
        cache.get_or_try_insert_with(16, || Ok::<_, ()>(2)).unwrap();

        let mut drained = cache.drain();
        drained.sort();
        assert_eq!(drained, vec![1, 2]);
        assert!(cache.is_empty());
        assert!(cache.drain().is_empty());
    }
}
