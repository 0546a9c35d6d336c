//! Query Runner
//!
//! Runs built queries through a `QueryExecutor` and turns the raw rows into
//! model objects: projection rows through the alias transformer, object
//! rows as they are.

use std::sync::Arc;

use hq_core::{downcast_model, Describe, HqError, HqResult, Model, PaginatedResult};
use hq_path::AccessorCache;
use hq_queries::fetch::ALIAS_SEPARATOR;
use hq_queries::Query;
use tracing::{info, instrument};

use crate::executor::{QueryExecutor, QueryRequest, Row};
use crate::transformer::AliasToBeanTransformer;

pub struct QueryRunner<E: QueryExecutor> {
    executor: E,
    cache: Arc<AccessorCache>,
}

impl<E: QueryExecutor> QueryRunner<E> {
    pub fn new(executor: E, cache: Arc<AccessorCache>) -> Self {
        Self { executor, cache }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// All rows of the query's window
    #[instrument(skip(self, query), fields(target_type = ?query.target_type()))]
    pub async fn plain_list(&self, query: &Query) -> HqResult<Vec<Box<dyn Model>>> {
        let rows = self.executor.fetch(&QueryRequest::main(query)).await?;
        let models = self.materialize(query, rows)?;
        info!(rows = models.len(), "fetched rows");
        Ok(models)
    }

    /// Rows of the query's window with the total row count
    ///
    /// Without a page window the total is the number of rows fetched.
    #[instrument(skip(self, query), fields(target_type = ?query.target_type()))]
    pub async fn paginated_list(&self, query: &Query) -> HqResult<PaginatedResult<Box<dyn Model>>> {
        let rows = self.executor.fetch(&QueryRequest::main(query)).await?;
        let models = self.materialize(query, rows)?;

        let result = match query.page() {
            Some(page) => {
                let total = self.total(query).await?;
                PaginatedResult::new(models, page.start, total)
            }
            None => PaginatedResult::from_rows(models),
        };
        info!(
            rows = result.len(),
            offset = result.offset(),
            total = result.total_size(),
            "fetched page"
        );
        Ok(result)
    }

    /// Typed variant of `plain_list`
    pub async fn plain_list_as<T: Describe>(&self, query: &Query) -> HqResult<Vec<T>> {
        self.plain_list(query)
            .await?
            .into_iter()
            .map(downcast)
            .collect()
    }

    /// Typed variant of `paginated_list`
    pub async fn paginated_list_as<T: Describe>(&self, query: &Query) -> HqResult<PaginatedResult<T>> {
        let result = self.paginated_list(query).await?;
        let (offset, total) = (result.offset(), result.total_size());
        let rows = result
            .into_rows()
            .into_iter()
            .map(downcast)
            .collect::<HqResult<Vec<T>>>()?;
        Ok(PaginatedResult::new(rows, offset, total))
    }

    /// Number of rows matched by the query, ignoring its window
    #[instrument(skip(self, query), fields(target_type = ?query.target_type()))]
    pub async fn count(&self, query: &Query) -> HqResult<usize> {
        self.total(query).await
    }

    async fn total(&self, query: &Query) -> HqResult<usize> {
        let count = self.executor.count(&QueryRequest::count(query)).await?;
        usize::try_from(count)
            .map_err(|_| HqError::Execution(format!("count query returned {}", count)))
    }

    fn materialize(&self, query: &Query, rows: Vec<Row>) -> HqResult<Vec<Box<dyn Model>>> {
        if !query.is_projection() {
            return rows
                .into_iter()
                .map(|row| match row {
                    Row::Object(model) => Ok(model),
                    Row::Tuple(_) => Err(HqError::Execution(
                        "tuple row for a query without fetched properties".to_string(),
                    )),
                })
                .collect();
        }

        let target = query.target_type().ok_or_else(|| {
            HqError::InvalidArgument("projection query has no target type".to_string())
        })?;
        let transformer = AliasToBeanTransformer::new(target, Arc::clone(&self.cache))
            .use_path_separator(ALIAS_SEPARATOR)
            .class_replacements(query.class_replacements());
        rows.into_iter()
            .map(|row| match row {
                Row::Tuple(values) => transformer.transform_tuple(values, query.aliases()),
                Row::Object(model) => Ok(model),
            })
            .collect()
    }
}

fn downcast<T: Describe>(model: Box<dyn Model>) -> HqResult<T> {
    let found = model.model_name();
    downcast_model::<T>(model).ok_or_else(|| {
        HqError::Execution(format!("expected {} row, found {}", T::MODEL_NAME, found))
    })
}
