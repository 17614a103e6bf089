// crates/db/src/cache.rs
//! Keyed, TTL-bounded memoization of query results.
//!
//! Concurrent lookups of the same key share one in-flight fetch; errors are
//! returned to every waiter and never cached.

use moka::future::Cache;
use std::any::{type_name, Any, TypeId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use retail_hub_core::BindValue;

use crate::{DbError, DbResult};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
const MAX_ENTRIES: u64 = 10_000;

/// Cache key: rendered SQL, its bind values, and the decoded row type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    sql: String,
    binds: Vec<BindValue>,
    shape: TypeId,
}

impl QueryKey {
    pub fn new<T: 'static>(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        Self {
            sql: sql.into(),
            binds,
            shape: TypeId::of::<T>(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: u64,
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, Arc<dyn Any + Send + Sync>>,
    ttl: Duration,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key`, or run `fetch` once for all
    /// concurrent callers and cache its success.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> DbResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        let label = key.sql.clone();
        let entry = self
            .inner
            .entry(key)
            .or_try_insert_with(async move {
                fetch()
                    .await
                    .map(|value| Arc::new(value) as Arc<dyn Any + Send + Sync>)
            })
            .await
            .map_err(DbError::Shared)?;

        if entry.is_fresh() {
            metrics::counter!("query_cache_misses_total").increment(1);
            tracing::debug!(sql = %first_line(&label), "query cache miss");
        } else {
            metrics::counter!("query_cache_hits_total").increment(1);
        }

        entry
            .into_value()
            .downcast::<T>()
            .map_err(|_| DbError::CacheType(format!("{} ({})", first_line(&label), type_name::<T>())))
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

fn first_line(sql: &str) -> &str {
    sql.trim().lines().next().unwrap_or_default()
}
