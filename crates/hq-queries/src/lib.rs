//! # hq-queries
//!
//! Query layer for Hiqual RS.
//!
//! Turns a declarative result-set configuration (filters, orderings, text
//! search, fetched properties, page window) into parameterized query text.
//!
//! ## Structure
//!
//! - `filters` - Condition trees and their renderer
//! - `sorts` - Sort orders and directions
//! - `fetch` - Properties selected into result rows
//! - `search` - Search tokenizing and the search fragment
//! - `params` - Named parameters and executor bindings
//! - `result_set` - Result-set configuration and its builder
//! - `builder` - Query assembly
//!
//! ## Example
//!
//! ```
//! use hq_queries::{ConditionNode, QueryBuilder, ResultSetConfigBuilder};
//!
//! let config = ResultSetConfigBuilder::new()
//!     .fetch("name")
//!     .condition(ConditionNode::eq("age", 42))
//!     .add_order("name", "asc")
//!     .build()
//!     .unwrap();
//!
//! let query = QueryBuilder::new(config)
//!     .from_clause("FROM Person p")
//!     .add_default_substitution("p")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     query.main_query(),
//!     "SELECT p.name AS name FROM Person p WHERE 1 = 1 AND p.age = :age ORDER BY p.name ASC"
//! );
//! ```

pub mod builder;
pub mod fetch;
pub mod filters;
pub mod params;
pub mod result_set;
pub mod search;
pub mod sorts;

// Re-exports for convenience
pub use builder::{Query, QueryBuilder};
pub use fetch::FetchableProperty;
pub use filters::{render, ConditionNode, GroupOperator, Operator};
pub use params::{Binding, Parameters};
pub use result_set::{ResultSetConfig, ResultSetConfigBuilder};
pub use search::{render_search, tokenize_and_wildcard, PropertyExpression, SearchOptions, TextKind, TextSearchExpressions};
pub use sorts::{SortCriterion, SortDirection, SortOrder};
