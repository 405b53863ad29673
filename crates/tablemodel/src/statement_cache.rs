use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Counters for prepared-statement reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Distinct SQL strings currently prepared.
    pub prepared: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Prepared statements keyed by exact SQL text. Entries are never evicted.
#[derive(Debug)]
pub(crate) struct StatementCache<S> {
    map: RefCell<HashMap<String, S>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<S: Clone> StatementCache<S> {
    pub(crate) fn new() -> Self {
        Self {
            map: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub(crate) fn get(&self, sql: &str) -> Option<S> {
        let stmt = self.map.borrow().get(sql).cloned();
        match stmt {
            Some(_) => self.hits.set(self.hits.get() + 1),
            None => self.misses.set(self.misses.get() + 1),
        }
        stmt
    }

    pub(crate) fn insert_if_absent(&self, sql: String, stmt: S) -> S {
        self.map.borrow_mut().entry(sql).or_insert(stmt).clone()
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            prepared: self.map.borrow().len(),
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit() {
        let cache = StatementCache::new();
        assert_eq!(cache.get("SELECT 1"), None);
        cache.insert_if_absent("SELECT 1".to_string(), 7u32);
        assert_eq!(cache.get("SELECT 1"), Some(7));
        assert_eq!(
            cache.stats(),
            CacheStats {
                prepared: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn keeps_first_handle() {
        let cache = StatementCache::new();
        assert_eq!(cache.insert_if_absent("q".to_string(), 1u32), 1);
        assert_eq!(cache.insert_if_absent("q".to_string(), 2u32), 1);
    }

    #[test]
    fn keyed_by_exact_text() {
        let cache = StatementCache::new();
        cache.insert_if_absent("SELECT 1".to_string(), 1u32);
        assert_eq!(cache.get("select 1"), None);
        assert_eq!(cache.get("SELECT 1 "), None);
    }
}
