//! # hq-db
//!
//! Execution layer for Hiqual RS.
//!
//! Built queries are handed to an external data source through the
//! `QueryExecutor` trait. Projection rows come back as alias tuples and are
//! turned into model objects by writing each value through a property path.
//!
//! ## Example
//!
//! ```ignore
//! use hq_db::{QueryRunner, MemoryQueryExecutor};
//!
//! let runner = QueryRunner::new(MemoryQueryExecutor::new(rows), cache);
//! let page = runner.paginated_list_as::<Person>(&query).await?;
//! ```

pub mod executor;
pub mod query_executor;
pub mod transformer;

pub use executor::{MemoryQueryExecutor, QueryExecutor, QueryRequest, Row};
pub use query_executor::QueryRunner;
pub use transformer::AliasToBeanTransformer;
