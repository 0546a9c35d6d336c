//! Query execution boundary
//!
//! The data source that runs query text is external; it is reached through
//! the `QueryExecutor` trait.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use hq_core::{HqResult, Model, Value};
use hq_queries::{Binding, Query};
use tokio::sync::RwLock;

/// Query text plus everything needed to run it
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub text: String,
    pub bindings: BTreeMap<String, Binding>,
    pub first_result: Option<usize>,
    pub max_results: Option<usize>,
}

impl QueryRequest {
    /// Row query, windowed by the query's page
    pub fn main(query: &Query) -> Self {
        Self {
            text: query.main_query(),
            bindings: query.bindings(),
            first_result: query.page().map(|p| p.start),
            max_results: query.page().map(|p| p.size),
        }
    }

    /// Unwindowed count query
    pub fn count(query: &Query) -> Self {
        Self {
            text: query.count_query(),
            bindings: query.bindings(),
            first_result: None,
            max_results: None,
        }
    }
}

/// A raw result row
pub enum Row {
    /// One value per select alias
    Tuple(Vec<Option<Value>>),
    /// A whole object
    Object(Box<dyn Model>),
}

impl Clone for Row {
    fn clone(&self) -> Self {
        match self {
            Row::Tuple(values) => Row::Tuple(values.clone()),
            Row::Object(model) => Row::Object(model.clone_model()),
        }
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Tuple(values) => f.debug_tuple("Tuple").field(values).finish(),
            Row::Object(model) => f.debug_tuple("Object").field(model).finish(),
        }
    }
}

/// Runs query text against a data source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Rows of a main query
    async fn fetch(&self, request: &QueryRequest) -> HqResult<Vec<Row>>;

    /// Single count of a count query
    async fn count(&self, request: &QueryRequest) -> HqResult<i64>;
}

/// In-memory executor for tests and fixtures
///
/// Serves fixed rows, windowed by the request. Every request is kept in a
/// log that only grows; long-lived instances should turn it off with
/// `without_request_log`.
pub struct MemoryQueryExecutor {
    rows: Vec<Row>,
    total: Option<i64>,
    log_requests: bool,
    requests: RwLock<Vec<QueryRequest>>,
}

impl MemoryQueryExecutor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            total: None,
            log_requests: true,
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Report `total` from count queries instead of the row count
    pub fn with_total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }

    /// Stop recording requests
    pub fn without_request_log(mut self) -> Self {
        self.log_requests = false;
        self
    }

    pub async fn requests(&self) -> Vec<QueryRequest> {
        self.requests.read().await.clone()
    }

    async fn record(&self, request: &QueryRequest) {
        if self.log_requests {
            self.requests.write().await.push(request.clone());
        }
    }
}

#[async_trait]
impl QueryExecutor for MemoryQueryExecutor {
    async fn fetch(&self, request: &QueryRequest) -> HqResult<Vec<Row>> {
        self.record(request).await;
        Ok(self
            .rows
            .iter()
            .skip(request.first_result.unwrap_or(0))
            .take(request.max_results.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, request: &QueryRequest) -> HqResult<i64> {
        self.record(request).await;
        Ok(self.total.unwrap_or(self.rows.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hq_queries::{QueryBuilder, ResultSetConfigBuilder};

    fn query() -> Query {
        let config = ResultSetConfigBuilder::new()
            .fetch("name")
            .by_ids(Vec::new())
            .offset(1)
            .fetch_size(2)
            .build()
            .unwrap();
        QueryBuilder::new(config)
            .from_clause("FROM Person p")
            .add_default_substitution("p")
            .build()
            .unwrap()
    }

    fn tuple(name: &str) -> Row {
        Row::Tuple(vec![Some(Value::from(name))])
    }

    #[test]
    fn test_requests() {
        let query = query();
        let main = QueryRequest::main(&query);
        assert_eq!(main.first_result, Some(1));
        assert_eq!(main.max_results, Some(2));
        assert_eq!(main.bindings["entityId"], Binding::List(vec![None]));

        let count = QueryRequest::count(&query);
        assert!(count.text.starts_with("SELECT COUNT(*) FROM Person p"));
        assert_eq!(count.first_result, None);
    }

    #[tokio::test]
    async fn test_memory_executor_windows_rows() {
        let executor = MemoryQueryExecutor::new(vec![tuple("a"), tuple("b"), tuple("c"), tuple("d")]);
        let query = query();

        let rows = executor.fetch(&QueryRequest::main(&query)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], Row::Tuple(values) if values[0] == Some(Value::from("b"))));

        assert_eq!(executor.count(&QueryRequest::count(&query)).await.unwrap(), 4);
        assert_eq!(executor.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_executor_total_override() {
        let executor = MemoryQueryExecutor::new(vec![tuple("a")]).with_total(40);
        let count = executor.count(&QueryRequest::count(&query())).await.unwrap();
        assert_eq!(count, 40);
    }

    #[tokio::test]
    async fn test_memory_executor_without_request_log() {
        let executor = MemoryQueryExecutor::new(vec![tuple("a"), tuple("b")]).without_request_log();
        let query = query();

        for _ in 0..3 {
            executor.fetch(&QueryRequest::main(&query)).await.unwrap();
            executor.count(&QueryRequest::count(&query)).await.unwrap();
        }
        assert!(executor.requests().await.is_empty());
    }
}
