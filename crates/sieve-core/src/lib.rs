//! # sieve-core
//!
//! Core types shared by the Sieve crates.
//!
//! This crate provides the foundational building blocks used by the query layer:
//! - Schema (trusted configuration) error types
//! - Pagination configuration loaded from the environment
//! - Page offset/limit math and page-link windows

pub mod config;
pub mod error;
pub mod pagination;

pub use config::{ConfigError, PaginationConfig, SieveConfig};
pub use error::*;
pub use pagination::*;
