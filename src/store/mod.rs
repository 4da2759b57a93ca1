//! Template store: validation and caching in front of the `DbActor`.
//!
//! Every mutation goes through the actor; the per-name cache only serves
//! `get` and is invalidated for each name a mutation touches.
//!
//! A `get` that misses reads the row through the actor and then fills the
//! cache. A mutation landing in between would leave that fill stale, so
//! mutations bump `mutations` after the write and before invalidating, and a
//! fill that sees the counter moved drops its own entry again.

use crate::db::{DbActorHandle, RenameTemplate, Template};
use crate::error::StoreError;
use moka::sync::Cache;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Clone)]
pub struct TemplateStore {
    db: DbActorHandle,
    cache: Cache<String, Template>,
    mutations: Arc<AtomicU64>,
}

impl TemplateStore {
    pub fn new(db: DbActorHandle, cache_capacity: u64) -> Self {
        Self {
            db,
            cache: Cache::new(cache_capacity),
            mutations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawns a `DbActor` for `database_url` and wraps it.
    pub async fn open(database_url: &str, cache_capacity: u64) -> Result<Self, StoreError> {
        let db = crate::db::spawn(database_url).await?;
        Ok(Self::new(db, cache_capacity))
    }

    /// All templates, most recently created first.
    pub async fn list(&self) -> Result<Vec<Template>, StoreError> {
        self.db.list_templates().await
    }

    /// Read-through lookup by name.
    pub async fn get(&self, name: &str) -> Result<Template, StoreError> {
        let name = required("name", name)?;
        if let Some(hit) = self.cache.get(name) {
            return Ok(hit);
        }

        let seen = self.mutations.load(Ordering::SeqCst);
        let template = self
            .db
            .get_template(name.to_string())
            .await?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        self.cache.insert(name.to_string(), template.clone());
        if self.mutations.load(Ordering::SeqCst) != seen {
            debug!(name, "template changed during cache fill; dropping entry");
            self.cache.invalidate(name);
        }
        Ok(template)
    }

    /// Creates `name` or replaces its data; `createdAt` is kept on replace.
    pub async fn upsert(&self, name: &str, data: Value) -> Result<Vec<Template>, StoreError> {
        let name = required("name", name)?;
        let res = self.db.upsert_template(name.to_string(), data).await;
        self.invalidate(&[name]);
        res
    }

    /// Renames `old_name` to `new_name` (or keeps it when `new_name` is empty)
    /// and replaces its data in one transaction.
    pub async fn rename(
        &self,
        old_name: &str,
        new_name: Option<&str>,
        data: Value,
    ) -> Result<Vec<Template>, StoreError> {
        let old_name = required("oldName", old_name)?;
        let new_name = new_name.map(str::trim).filter(|n| !n.is_empty());

        let res = self
            .db
            .rename_template(RenameTemplate {
                old_name: old_name.to_string(),
                new_name: new_name.map(str::to_string),
                data,
            })
            .await;

        match new_name {
            Some(new_name) => self.invalidate(&[old_name, new_name]),
            None => self.invalidate(&[old_name]),
        }
        if let Err(e) = &res {
            debug!(old_name, ?new_name, error = %e, "template rename refused");
        }
        res
    }

    /// Deletes `name` if present; a missing name is not an error.
    pub async fn delete(&self, name: &str) -> Result<Vec<Template>, StoreError> {
        let name = required("name", name)?;
        let res = self.db.delete_template(name.to_string()).await;
        self.invalidate(&[name]);
        res
    }

    pub async fn get_config(&self) -> Result<BTreeMap<String, String>, StoreError> {
        self.db.get_config().await
    }

    pub async fn set_config(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let key = required("key", key)?;
        self.db.set_config(key.to_string(), value.to_string()).await
    }

    /// Writes `entries` in one transaction if the config is still empty.
    ///
    /// Returns the number of entries written (0 when config already existed).
    pub async fn seed_config(&self, entries: &[(String, String)]) -> Result<usize, StoreError> {
        let entries = entries
            .iter()
            .map(|(key, value)| Ok((required("key", key)?.to_string(), value.clone())))
            .collect::<Result<Vec<_>, StoreError>>()?;
        self.db.seed_config(entries).await
    }

    /// Must run after the write has been applied.
    fn invalidate(&self, names: &[&str]) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        for name in names {
            self.cache.invalidate(*name);
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
