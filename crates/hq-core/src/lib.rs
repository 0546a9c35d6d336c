//! # hq-core
//!
//! Core types, traits, and utilities for Hiqual RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - The dynamic `Value` carried through conditions, parameters and rows
//! - The `Model` trait for objects addressed by property paths
//! - Declared property types and write policies
//! - Pagination types and element-collection combinators
//! - Configuration types

pub mod collection;
pub mod config;
pub mod error;
pub mod pagination;
pub mod traits;
pub mod types;
pub mod value;

pub use collection::*;
pub use config::{ConfigError, HqConfig, PathDefaults, SearchDefaults};
pub use error::*;
pub use pagination::*;
pub use traits::*;
pub use types::*;
pub use value::*;
