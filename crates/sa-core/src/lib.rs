//! # sa-core
//!
//! Core types, traits, and utilities for School Admin RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types and the validation error collection
//! - Configuration types and layered loading
//! - Sequence counters used to mint human-readable record codes
//! - Entity traits implemented by the stored records

pub mod config;
pub mod counter;
pub mod error;
pub mod traits;

pub use counter::*;
pub use error::*;
pub use traits::{new_id, Entity, Id, Timestamped};
