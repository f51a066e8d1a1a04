use parking_lot::RwLock;
use solscope_core::Result;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Cache LRU de resultados puros (índices de PC, fragmentos de fonte)
pub struct MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    cache: RwLock<lru::LruCache<K, V>>,
    stats: RwLock<CacheStats>,
}

/// Estatísticas de cache
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub inserts: usize,
    pub evictions: usize,
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Cria um cache com a capacidade indicada (mínimo 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: RwLock::new(lru::LruCache::new(capacity)),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Obtém um valor do cache
    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.cache.write();

        match cache.get(key) {
            Some(value) => {
                self.stats.write().hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.write().misses += 1;
                None
            }
        }
    }

    /// Insere um valor no cache
    pub fn insert(&self, key: K, value: V) {
        let mut cache = self.cache.write();

        if let Some((evicted, _)) = cache.push(key.clone(), value) {
            if evicted != key {
                self.stats.write().evictions += 1;
            }
        }

        self.stats.write().inserts += 1;
    }

    /// Retorna o valor memorizado ou calcula, guarda e retorna.
    ///
    /// Erros de `compute` não são memorizados.
    pub fn get_or_try_insert_with<F>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Obtém estatísticas do cache
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }
}
