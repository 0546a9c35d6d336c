//! # hq-path
//!
//! Compiles dotted property paths against registered model types into
//! reusable accessor chains.
//!
//! - `schema`: model type descriptions and the registry
//! - `accessor`: compiled `PathAccessor` with best-effort reads and policy-driven writes
//! - `coerce`: conversion between collection kinds
//! - `cache`: concurrent accessor cache

pub mod accessor;
pub mod cache;
pub mod coerce;
pub mod schema;

pub use accessor::{PathAccessor, Segment};
pub use cache::AccessorCache;
pub use coerce::{coerce, empty_collection};
pub use schema::{ModelType, ModelTypeBuilder, Property, SchemaRegistry, Slot};
