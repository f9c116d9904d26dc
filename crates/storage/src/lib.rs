//! Storage abstraction and implementations for Hifz progress data.
//!
//! This crate provides a trait-based storage interface with a flat JSON file
//! implementation and an in-memory one.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;
pub mod retry;

pub use trait_::{Storage, StorageError, Result};
pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
pub use retry::RetryPolicy;
