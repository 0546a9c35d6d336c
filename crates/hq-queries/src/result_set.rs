//! Result-set configuration
//!
//! Describes which rows a caller wants: page window, orderings, free-text
//! search, fetched properties and the filter tree. The builder validates
//! everything once in `build`.

use std::collections::HashSet;
use std::ops::Range;

use hq_core::{HqError, HqResult, PageWindow, Value};

use crate::fetch::{FetchableProperty, ALIAS_SEPARATOR};
use crate::filters::{ConditionNode, Operator};
use crate::search::TextSearchExpressions;
use crate::sorts::{SortCriterion, SortDirection, SortOrder};

/// Validated result-set configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSetConfig {
    page: Option<PageWindow>,
    orders: SortOrder,
    search_expressions: Option<TextSearchExpressions>,
    search: Option<String>,
    fetch: Vec<FetchableProperty>,
    condition: Option<ConditionNode>,
}

impl ResultSetConfig {
    pub fn builder() -> ResultSetConfigBuilder {
        ResultSetConfigBuilder::new()
    }

    /// Every row
    pub fn all() -> Self {
        Self {
            page: Some(PageWindow::all()),
            ..Self::default()
        }
    }

    /// Only the first row
    pub fn first() -> Self {
        Self {
            page: Some(PageWindow::first()),
            ..Self::default()
        }
    }

    /// No rows, only the total count
    pub fn count_only() -> Self {
        Self {
            page: Some(PageWindow::count_only()),
            ..Self::default()
        }
    }

    pub fn page(&self) -> Option<PageWindow> {
        self.page
    }

    /// Requested row positions; unbounded without a page window
    pub fn range(&self) -> Range<usize> {
        self.page.unwrap_or_else(PageWindow::all).range()
    }

    pub fn orders(&self) -> &SortOrder {
        &self.orders
    }

    pub fn text_search_expressions(&self) -> Option<&TextSearchExpressions> {
        self.search_expressions.as_ref()
    }

    /// Search string; never blank
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn fetch(&self) -> &[FetchableProperty] {
        &self.fetch
    }

    pub fn condition(&self) -> Option<&ConditionNode> {
        self.condition.as_ref()
    }
}

/// Builder for result-set configurations
#[derive(Debug, Default)]
pub struct ResultSetConfigBuilder {
    offset: Option<usize>,
    fetch_size: Option<usize>,
    orders: SortOrder,
    search_expressions: Option<TextSearchExpressions>,
    search: Option<String>,
    fetch: Vec<FetchableProperty>,
    condition: Option<ConditionNode>,
    error: Option<HqError>,
}

impl ResultSetConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn base_on(config: &ResultSetConfig) -> Self {
        Self {
            offset: config.page.map(|p| p.start),
            fetch_size: config.page.map(|p| p.size),
            orders: config.orders.clone(),
            search_expressions: config.search_expressions.clone(),
            search: config.search.clone(),
            fetch: config.fetch.clone(),
            condition: config.condition.clone(),
            error: None,
        }
    }

    // Page window

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn fetch_size(mut self, size: usize) -> Self {
        self.fetch_size = Some(size);
        self
    }

    pub fn page(mut self, page: PageWindow) -> Self {
        self.offset = Some(page.start);
        self.fetch_size = Some(page.size);
        self
    }

    pub fn all_results(self) -> Self {
        self.page(PageWindow::all())
    }

    pub fn one_result(self) -> Self {
        self.page(PageWindow::first())
    }

    pub fn no_result(self) -> Self {
        self.page(PageWindow::count_only())
    }

    // Orderings

    /// Replace the orderings; `direction` must be `asc` or `desc`
    pub fn order(mut self, property: &str, direction: &str) -> Self {
        self.orders.clear();
        self.add_order(property, direction)
    }

    pub fn add_order(mut self, property: &str, direction: &str) -> Self {
        match SortDirection::parse(property, direction) {
            Ok(direction) => {
                self.orders.add(SortCriterion::new(property, direction));
            }
            Err(e) => self.defer(e),
        }
        self
    }

    /// Replace the orderings with one criterion
    pub fn order_by(mut self, criterion: SortCriterion) -> Self {
        self.orders = SortOrder::new().then(criterion);
        self
    }

    pub fn then_by(mut self, criterion: SortCriterion) -> Self {
        self.orders.add(criterion);
        self
    }

    pub fn clear_order(mut self) -> Self {
        self.orders.clear();
        self
    }

    // Search

    pub fn text_search_expressions(mut self, expressions: TextSearchExpressions) -> Self {
        self.search_expressions = Some(expressions);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    // Fetched properties

    /// Fetch `this.<name>` under the alias derived from `name`
    pub fn fetch(self, name: &str) -> Self {
        self.fetch_property(FetchableProperty::new(name))
    }

    pub fn fetch_all<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        names.into_iter().fold(self, |builder, name| builder.fetch(name))
    }

    /// Fetch `name` through a left outer join on `join`
    pub fn fetch_joined(self, name: &str, join: &str) -> Self {
        self.fetch_property(FetchableProperty::new(name).with_join(join))
    }

    /// Add a property; a property of the same name is replaced in place
    pub fn fetch_property(mut self, property: FetchableProperty) -> Self {
        match self.fetch.iter_mut().find(|p| p.name() == property.name()) {
            Some(existing) => *existing = property,
            None => self.fetch.push(property),
        }
        self
    }

    // Conditions

    /// Replace the filter tree
    pub fn condition(mut self, condition: ConditionNode) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Conjoin with the existing filter tree
    pub fn and_condition(mut self, condition: ConditionNode) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and_also(condition),
            None => condition,
        });
        self
    }

    pub fn and_not_condition(self, condition: ConditionNode) -> Self {
        self.and_condition(ConditionNode::not(condition))
    }

    /// Select the row with this id, replacing existing filters
    pub fn by_id(self, id: i64) -> Self {
        self.condition(ConditionNode::named(
            "id",
            Operator::Eq,
            "entityId",
            Some(Value::Int(id)),
        ))
    }

    pub fn by_ids(self, ids: impl IntoIterator<Item = i64>) -> Self {
        let ids = ids.into_iter().map(Value::Int).collect();
        self.condition(ConditionNode::named(
            "id",
            Operator::In,
            "entityId",
            Some(Value::List(ids)),
        ))
    }

    pub fn by_code(self, code: &str) -> Self {
        self.condition(ConditionNode::named(
            "code",
            Operator::Eq,
            "entityCode",
            Some(Value::from(code)),
        ))
    }

    pub fn by_codes<'a>(self, codes: impl IntoIterator<Item = &'a str>) -> Self {
        let codes = codes.into_iter().map(Value::from).collect();
        self.condition(ConditionNode::named(
            "code",
            Operator::In,
            "entityCode",
            Some(Value::List(codes)),
        ))
    }

    fn defer(&mut self, error: HqError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Validate and build
    pub fn build(self) -> HqResult<ResultSetConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }
        validate_aliases(self.fetch.iter().map(|p| p.name()))?;

        let page = match (self.offset, self.fetch_size) {
            (None, None) => None,
            (offset, size) => Some(PageWindow::new(
                offset.unwrap_or(0),
                size.unwrap_or(usize::MAX),
            )),
        };
        let search = self.search.filter(|text| !text.trim().is_empty());

        Ok(ResultSetConfig {
            page,
            orders: self.orders,
            search_expressions: self.search_expressions,
            search,
            fetch: self.fetch,
            condition: self.condition,
        })
    }
}

/// Names must not contain the alias separator and must map to distinct aliases
pub(crate) fn validate_aliases<'a>(names: impl IntoIterator<Item = &'a str>) -> HqResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        let alias = crate::fetch::to_alias(name);
        if name.contains(ALIAS_SEPARATOR) || !seen.insert(alias.clone()) {
            return Err(HqError::AliasCollision { alias });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window() {
        let config = ResultSetConfigBuilder::new().offset(20).fetch_size(10).build().unwrap();
        assert_eq!(config.page(), Some(PageWindow::new(20, 10)));
        assert_eq!(config.range(), 20..30);

        let open_ended = ResultSetConfigBuilder::new().offset(5).build().unwrap();
        assert_eq!(open_ended.page(), Some(PageWindow::new(5, usize::MAX)));

        let unpaged = ResultSetConfigBuilder::new().build().unwrap();
        assert_eq!(unpaged.page(), None);
        assert_eq!(unpaged.range(), 0..usize::MAX);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ResultSetConfig::first().range(), 0..1);
        assert_eq!(ResultSetConfig::count_only().page(), Some(PageWindow::count_only()));
        assert_eq!(ResultSetConfig::all().page(), Some(PageWindow::all()));
        assert_eq!(
            ResultSetConfigBuilder::new().one_result().build().unwrap(),
            ResultSetConfig::first()
        );
    }

    #[test]
    fn test_orders() {
        let config = ResultSetConfigBuilder::new()
            .add_order("name", "asc")
            .add_order("this.age", "DESC")
            .build()
            .unwrap();
        assert_eq!(config.orders().len(), 2);
        assert_eq!(config.orders().criteria()[1].property, "age");

        let replaced = ResultSetConfigBuilder::base_on(&config).order("id", "desc").build().unwrap();
        assert_eq!(replaced.orders().len(), 1);

        let err = ResultSetConfigBuilder::new().order("name", "up").build().unwrap_err();
        assert_eq!(err.error_code(), "invalid_argument");
    }

    #[test]
    fn test_blank_search_is_absent() {
        let config = ResultSetConfigBuilder::new().search("   ").build().unwrap();
        assert_eq!(config.search(), None);

        let config = ResultSetConfigBuilder::new().search("abc").build().unwrap();
        assert_eq!(config.search(), Some("abc"));
    }

    #[test]
    fn test_fetch_aliases() {
        let config = ResultSetConfigBuilder::new()
            .fetch_all(["name", "address.city"])
            .fetch_joined("address.city", "address")
            .build()
            .unwrap();
        assert_eq!(config.fetch().len(), 2);
        assert_eq!(config.fetch()[1].join(), Some("address"));

        let err = ResultSetConfigBuilder::new().fetch("first_name").build().unwrap_err();
        assert!(matches!(err, HqError::AliasCollision { ref alias } if alias == "first_name"));
    }

    #[test]
    fn test_conditions() {
        let config = ResultSetConfigBuilder::new()
            .and_condition(ConditionNode::eq("a", 1))
            .and_not_condition(ConditionNode::eq("b", 2))
            .build()
            .unwrap();
        assert_eq!(
            config.condition(),
            Some(&ConditionNode::and([
                ConditionNode::eq("a", 1),
                ConditionNode::not(ConditionNode::eq("b", 2)),
            ]))
        );

        // Convenience filters replace the existing tree
        let by_ids = ResultSetConfigBuilder::base_on(&config).by_ids([1, 2]).build().unwrap();
        match by_ids.condition() {
            Some(ConditionNode::Simple { parameter, operator, .. }) => {
                assert_eq!(parameter, "entityId");
                assert_eq!(*operator, Operator::In);
            }
            other => panic!("unexpected {:?}", other),
        }

        let by_code = ResultSetConfigBuilder::new().by_code("PL").build().unwrap();
        assert_eq!(by_code.condition().unwrap().property_names(), vec!["code"]);
    }
}
