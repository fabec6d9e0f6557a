//! Named sequence counters
//!
//! Records carry human-readable codes (`STAFF0001`, `STUD0007`, `USER0001`)
//! minted from a monotonically increasing counter per code family.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::SaResult;

/// Atomic-increment counter store keyed by counter name
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Increment the named counter and return the new value (first call yields 1)
    async fn next_value(&self, name: &str) -> SaResult<u64>;
}

/// Code families minted from a [`SequenceStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Staff,
    Student,
    User,
}

impl CodeKind {
    /// Counter name in the sequence store
    pub fn counter_name(&self) -> &'static str {
        match self {
            Self::Staff => "staffCode",
            Self::Student => "studentCode",
            Self::User => "userId",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Staff => "STAFF",
            Self::Student => "STUD",
            Self::User => "USER",
        }
    }

    /// Format a sequence number as a zero-padded code
    pub fn format(&self, seq: u64) -> String {
        format!("{}{:04}", self.prefix(), seq)
    }
}

/// Allocate the next code of the given family
pub async fn next_code(store: &dyn SequenceStore, kind: CodeKind) -> SaResult<String> {
    let seq = store.next_value(kind.counter_name()).await?;
    Ok(kind.format(seq))
}

/// In-memory sequence store
#[derive(Default)]
pub struct MemorySequenceStore {
    counters: DashMap<String, AtomicU64>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a counter at a given value, e.g. after importing existing records
    pub fn seed(&self, name: impl Into<String>, value: u64) {
        self.counters.insert(name.into(), AtomicU64::new(value));
    }
}

#[async_trait]
impl SequenceStore for MemorySequenceStore {
    async fn next_value(&self, name: &str) -> SaResult<u64> {
        let counter = self
            .counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0));
        Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
