//! Record repositories
//!
//! Generic CRUD over [`Entity`] records with unique-key conflict detection.

use async_trait::async_trait;
use sa_core::traits::Entity;
use sa_core::{SaError, SaResult};
use tokio::sync::RwLock;

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// 1-based page number
    pub fn page(page: usize, per_page: usize) -> Self {
        Self {
            limit: per_page,
            offset: page.saturating_sub(1) * per_page,
        }
    }
}

/// One page of records with the total count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Record store
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn find(&self, id: &str) -> SaResult<Option<T>>;

    async fn list(&self, pagination: Pagination) -> SaResult<Page<T>>;

    /// All records matching a predicate
    async fn filter(&self, predicate: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> SaResult<Vec<T>>;

    /// Insert a new record; fails with a conflict on duplicate id or unique key
    async fn insert(&self, record: T) -> SaResult<T>;

    /// Replace an existing record; fails when it does not exist
    async fn update(&self, record: T) -> SaResult<T>;

    /// Remove a record, returning it when it existed
    async fn delete(&self, id: &str) -> SaResult<Option<T>>;

    async fn count(&self) -> SaResult<usize>;
}

/// In-memory repository
pub struct MemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(records: &[T], record: &T) -> SaResult<()> {
        let keys = record.unique_keys();
        for other in records.iter().filter(|r| r.id() != record.id()) {
            for (field, value) in other.unique_keys() {
                if value.is_empty() {
                    continue;
                }
                if keys.iter().any(|(f, v)| *f == field && *v == value) {
                    return Err(SaError::conflict(format!(
                        "{} with {} '{}' already exists",
                        T::TYPE_NAME,
                        field,
                        value
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn find(&self, id: &str) -> SaResult<Option<T>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id() == id).cloned())
    }

    async fn list(&self, pagination: Pagination) -> SaResult<Page<T>> {
        let records = self.records.read().await;
        Ok(Page {
            items: records
                .iter()
                .skip(pagination.offset)
                .take(pagination.limit)
                .cloned()
                .collect(),
            total: records.len(),
            limit: pagination.limit,
            offset: pagination.offset,
        })
    }

    async fn filter(&self, predicate: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> SaResult<Vec<T>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| predicate(r)).cloned().collect())
    }

    async fn insert(&self, record: T) -> SaResult<T> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(SaError::conflict(format!(
                "{} with id '{}' already exists",
                T::TYPE_NAME,
                record.id()
            )));
        }
        Self::check_unique(&records, &record)?;
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: T) -> SaResult<T> {
        let mut records = self.records.write().await;
        Self::check_unique(&records, &record)?;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| SaError::not_found(T::TYPE_NAME, record.id()))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: &str) -> SaResult<Option<T>> {
        let mut records = self.records.write().await;
        let position = records.iter().position(|r| r.id() == id);
        Ok(position.map(|index| records.remove(index)))
    }

    async fn count(&self) -> SaResult<usize> {
        Ok(self.records.read().await.len())
    }
}
