// crates/db/src/query.rs
//! Parameter-bound SQL assembled from fixed fragments and resolved filters.

use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Sqlite};
use std::sync::Arc;

use retail_hub_core::filters::{BindValue, FilterSet, Predicate};

use crate::cache::QueryKey;
use crate::{Database, DbResult};

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundQuery {
    sql: String,
    binds: Vec<BindValue>,
}

impl BoundQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Append a trusted SQL fragment.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Append a `?` placeholder bound to `value`.
    pub fn push_bind(&mut self, value: impl Into<BindValue>) -> &mut Self {
        self.sql.push('?');
        self.binds.push(value.into());
        self
    }

    /// Append ` AND <predicate>` for each resolved filter.
    pub fn filters(&mut self, filters: &FilterSet) -> &mut Self {
        filters.render(&mut self.sql, &mut self.binds);
        self
    }

    pub fn predicate(&mut self, predicate: Option<&Predicate>) -> &mut Self {
        if let Some(p) = predicate {
            p.render(&mut self.sql, &mut self.binds);
        }
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    fn bind_all<'q, T>(&'q self) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>>
    where
        T: for<'r> FromRow<'r, SqliteRow>,
    {
        let mut query = sqlx::query_as::<Sqlite, T>(&self.sql);
        for value in &self.binds {
            query = match value {
                BindValue::Text(s) => query.bind(s.as_str()),
                BindValue::Int(i) => query.bind(*i),
                BindValue::Float(f) => query.bind(*f),
            };
        }
        query
    }

    /// Run against the pool, bypassing the cache.
    pub async fn fetch_all<T>(&self, db: &Database) -> DbResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        Ok(self.bind_all::<T>().fetch_all(db.pool()).await?)
    }

    /// Run through the query cache; identical concurrent queries share one call.
    pub async fn fetch_cached<T>(&self, db: &Database) -> DbResult<Arc<Vec<T>>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static,
    {
        let key = QueryKey::new::<Vec<T>>(self.sql.clone(), self.binds.clone());
        db.cache()
            .get_or_fetch(key, || self.fetch_all::<T>(db))
            .await
    }

    /// First row through the cache, if any.
    pub async fn fetch_one_cached<T>(&self, db: &Database) -> DbResult<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + Clone + 'static,
    {
        Ok(self.fetch_cached::<T>(db).await?.first().cloned())
    }
}
