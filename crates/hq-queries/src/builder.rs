//! Query Builder
//!
//! Assembles select, from, where and order-by clauses from a
//! `ResultSetConfig` plus query-specific configuration. Property paths are
//! turned into query expressions by regex substitutions applied in
//! registration order; a left outer join registers its own substitution so
//! later paths through the joined property use the join alias.

use std::collections::{BTreeMap, HashMap};

use hq_core::{HqConfig, HqError, HqResult, PageWindow, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::filters::render;
use crate::params::{Binding, Parameters};
use crate::result_set::{validate_aliases, ResultSetConfig};
use crate::search::{render_search, SearchOptions};

/// Pattern of the default `this.<path>` substitution
const DEFAULT_SUBSTITUTION: &str = r"\bthis\.([\w\.]+)\b";

static DEFAULT_SUBSTITUTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_SUBSTITUTION).unwrap());

fn with_this(property: &str) -> String {
    if property.starts_with("this.") {
        property.to_string()
    } else {
        format!("this.{}", property)
    }
}

fn without_this(property: &str) -> &str {
    property.strip_prefix("this.").unwrap_or(property)
}

/// Alias of a joined path
fn join_alias(path: &str) -> String {
    format!("_{}", path.replace('.', "_"))
}

/// Configuration step, kept in registration order
#[derive(Debug, Clone)]
enum Step {
    Substitution { pattern: String, replacement: String },
    Join(String),
}

/// Compiled substitutions, applied in order
#[derive(Default)]
struct Substitutions {
    rules: Vec<(String, Regex, String)>,
}

impl Substitutions {
    /// Register a rule; an already registered pattern keeps its position
    fn add(&mut self, pattern: &str, replacement: &str) -> HqResult<()> {
        if let Some(rule) = self.rules.iter_mut().find(|(p, _, _)| p == pattern) {
            rule.2 = replacement.to_string();
            return Ok(());
        }
        let regex = if pattern == DEFAULT_SUBSTITUTION {
            DEFAULT_SUBSTITUTION_PATTERN.clone()
        } else {
            Regex::new(pattern).map_err(|e| {
                HqError::InvalidArgument(format!("invalid substitution '{}': {}", pattern, e))
            })?
        };
        self.rules.push((pattern.to_string(), regex, replacement.to_string()));
        Ok(())
    }

    fn apply(&self, expression: &str) -> String {
        self.rules
            .iter()
            .fold(expression.to_string(), |current, (_, regex, replacement)| {
                regex.replace_all(&current, replacement.as_str()).into_owned()
            })
    }
}

/// Builder for a query over one result-set configuration
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: ResultSetConfig,
    target_type: Option<String>,
    from_clause: String,
    default_select: Option<String>,
    steps: Vec<Step>,
    where_conditions: Vec<String>,
    custom_where: Option<String>,
    default_order: Option<String>,
    additional: Vec<(String, String)>,
    class_replacements: BTreeMap<String, String>,
    parameters: Parameters,
    search_options: SearchOptions,
}

impl QueryBuilder {
    pub fn new(config: ResultSetConfig) -> Self {
        Self {
            config,
            target_type: None,
            from_clause: String::new(),
            default_select: None,
            steps: Vec::new(),
            where_conditions: Vec::new(),
            custom_where: None,
            default_order: None,
            additional: Vec::new(),
            class_replacements: BTreeMap::new(),
            parameters: Parameters::new(),
            search_options: SearchOptions::default(),
        }
    }

    /// Registered model type the fetched rows are turned into
    pub fn target_type(mut self, name: impl Into<String>) -> Self {
        self.target_type = Some(name.into());
        self
    }

    /// Apply library configuration (search defaults)
    pub fn with_config(mut self, config: &HqConfig) -> Self {
        self.search_options = SearchOptions::from(&config.search);
        self
    }

    pub fn search_options(mut self, options: SearchOptions) -> Self {
        self.search_options = options;
        self
    }

    pub fn from_clause(mut self, from: impl Into<String>) -> Self {
        self.from_clause = from.into();
        self
    }

    /// Select clause used when no properties are fetched
    pub fn default_select_clause(mut self, select: impl Into<String>) -> Self {
        self.default_select = Some(select.into());
        self
    }

    /// Regex substitution applied to property expressions
    pub fn add_substitution(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.steps.push(Step::Substitution {
            pattern: pattern.into(),
            replacement: replacement.into(),
        });
        self
    }

    /// Rewrite `this.<path>` to `<alias>.<path>`
    pub fn add_default_substitution(self, alias: &str) -> Self {
        self.add_substitution(DEFAULT_SUBSTITUTION, format!("{}.$1", alias))
    }

    pub fn add_unconditional_where_condition(mut self, fragment: impl Into<String>) -> Self {
        self.where_conditions.push(fragment.into());
        self
    }

    /// Add `fragment` and bind `name` only when a value is present
    pub fn add_conditional_where_condition(
        mut self,
        fragment: impl Into<String>,
        name: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        if let Some(value) = value {
            self.where_conditions.push(fragment.into());
            self.parameters.set(name, value);
        }
        self
    }

    pub fn where_clause_custom_part(mut self, fragment: impl Into<String>) -> Self {
        self.custom_where = Some(fragment.into());
        self
    }

    /// Order used when the configuration has none; rendered verbatim
    pub fn default_order(mut self, order: impl Into<String>) -> Self {
        self.default_order = Some(order.into());
        self
    }

    /// Extra select item, only rendered alongside fetched properties
    pub fn add_additional_property(mut self, expression: impl Into<String>, alias: impl Into<String>) -> Self {
        let expression = expression.into();
        let alias = alias.into();
        match self.additional.iter_mut().find(|(e, _)| *e == expression) {
            Some(existing) => existing.1 = alias,
            None => self.additional.push((expression, alias)),
        }
        self
    }

    pub fn add_left_outer_join(mut self, path: impl Into<String>) -> Self {
        self.steps.push(Step::Join(path.into()));
        self
    }

    /// Instantiate `type_name` for the nested object at `path` of each row
    pub fn add_property_class_replacement(mut self, path: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.class_replacements.insert(path.into(), type_name.into());
        self
    }

    pub fn set_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.set(name, value);
        self
    }

    /// Bind `name` and reference it in the where clause as `:name = :name`
    pub fn set_main_query_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.where_conditions.push(format!(":{} = :{}", name, name));
        self.parameters.set(name, value);
        self
    }

    fn register_join(
        path: &str,
        substitutions: &mut Substitutions,
        joins: &mut Vec<(String, String)>,
    ) -> HqResult<()> {
        let transformed = substitutions.apply(path);
        let alias = join_alias(&transformed);
        substitutions.add(
            &format!("^{}\\.", regex::escape(&transformed)),
            &format!("{}.", alias),
        )?;
        if !joins.iter().any(|(joined, _)| *joined == transformed) {
            joins.push((transformed, alias));
        }
        Ok(())
    }

    /// Derive expressions and render the query
    pub fn build(self) -> HqResult<Query> {
        let mut substitutions = Substitutions::default();
        let mut joins: Vec<(String, String)> = Vec::new();
        for step in &self.steps {
            match step {
                Step::Substitution { pattern, replacement } => substitutions.add(pattern, replacement)?,
                Step::Join(path) => Self::register_join(path, &mut substitutions, &mut joins)?,
            }
        }
        for property in self.config.fetch() {
            if let Some(join) = property.join() {
                Self::register_join(&with_this(join), &mut substitutions, &mut joins)?;
            }
        }

        validate_aliases(
            self.config
                .fetch()
                .iter()
                .map(|p| p.name())
                .chain(self.additional.iter().map(|(_, alias)| alias.as_str())),
        )?;

        let select_clause = if self.config.fetch().is_empty() {
            self.default_select.clone().unwrap_or_default()
        } else {
            let items: Vec<String> = self
                .config
                .fetch()
                .iter()
                .map(|p| format!("{} AS {}", substitutions.apply(p.expression()), p.alias()))
                .chain(
                    self.additional
                        .iter()
                        .map(|(expression, alias)| format!("{} AS {}", expression, alias.replace('.', "_"))),
                )
                .collect();
            format!("SELECT {}", items.join(", "))
        };

        let mut from_clause = self.from_clause.clone();
        for (path, alias) in &joins {
            from_clause.push_str(&format!(" LEFT OUTER JOIN {} AS {}", path, alias));
        }

        let mut parameters = self.parameters.clone();
        let mut where_clause = String::from("WHERE 1 = 1");
        for fragment in &self.where_conditions {
            where_clause.push_str(" AND ");
            where_clause.push_str(fragment);
        }

        if let Some(condition) = self.config.condition() {
            let expressions: HashMap<&str, String> = condition
                .property_names()
                .into_iter()
                .map(|name| (without_this(name), substitutions.apply(&with_this(name))))
                .collect();
            let resolve = |property: &str| {
                expressions
                    .get(without_this(property))
                    .cloned()
                    .unwrap_or_else(|| substitutions.apply(&with_this(property)))
            };
            where_clause.push_str(" AND ");
            render(condition, &resolve, &mut where_clause, &mut parameters)?;
        }

        let autocomplete = match (self.config.search(), self.config.text_search_expressions()) {
            (Some(text), Some(searched)) => {
                let expressions: Vec<String> = searched
                    .expressions()
                    .iter()
                    .map(|e| substitutions.apply(e.expression()))
                    .collect();
                render_search(text, &expressions, &self.search_options)
            }
            _ => None,
        };
        if let Some(fragment) = &autocomplete {
            where_clause.push_str(" AND ");
            where_clause.push_str(fragment);
        }

        if let Some(custom) = self.custom_where.as_deref().filter(|c| !c.trim().is_empty()) {
            where_clause.push_str(&format!(" AND ({})", custom));
        }

        let order_clause = if !self.config.orders().is_empty() {
            let items: Vec<String> = self
                .config
                .orders()
                .criteria()
                .iter()
                .map(|c| c.render(&substitutions.apply(&with_this(&c.property))))
                .collect();
            format!("ORDER BY {}", items.join(", "))
        } else if let Some(order) = &self.default_order {
            format!("ORDER BY {}", order)
        } else {
            String::new()
        };

        let query = Query {
            select_clause,
            from_clause,
            where_clause,
            order_clause,
            autocomplete,
            parameters,
            page: self.config.page(),
            aliases: self
                .config
                .fetch()
                .iter()
                .map(|p| p.alias())
                .collect(),
            target_type: self.target_type,
            class_replacements: self.class_replacements,
        };

        debug!(
            query = %query.main_query(),
            parameters = query.parameters.len(),
            "built query"
        );

        Ok(query)
    }
}

/// Rendered query with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    select_clause: String,
    from_clause: String,
    where_clause: String,
    order_clause: String,
    autocomplete: Option<String>,
    parameters: Parameters,
    page: Option<PageWindow>,
    aliases: Vec<String>,
    target_type: Option<String>,
    class_replacements: BTreeMap<String, String>,
}

impl Query {
    pub fn select_clause(&self) -> &str {
        &self.select_clause
    }

    pub fn from_clause(&self) -> &str {
        &self.from_clause
    }

    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    pub fn order_clause(&self) -> &str {
        &self.order_clause
    }

    /// Search fragment alone, if the configuration searches
    pub fn autocomplete_condition(&self) -> Option<&str> {
        self.autocomplete.as_deref()
    }

    /// Select, from, where and order-by clauses
    pub fn main_query(&self) -> String {
        [
            self.select_clause.as_str(),
            self.from_clause.as_str(),
            self.where_clause.as_str(),
            self.order_clause.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Row count over the same from and where clauses
    pub fn count_query(&self) -> String {
        ["SELECT COUNT(*)", self.from_clause.as_str(), self.where_clause.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn bindings(&self) -> BTreeMap<String, Binding> {
        self.parameters.bindings()
    }

    pub fn page(&self) -> Option<PageWindow> {
        self.page
    }

    /// Select aliases of the fetched properties, in select order
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Whether rows come back as alias tuples rather than whole objects
    pub fn is_projection(&self) -> bool {
        !self.aliases.is_empty()
    }

    pub fn target_type(&self) -> Option<&str> {
        self.target_type.as_deref()
    }

    pub fn class_replacements(&self) -> &BTreeMap<String, String> {
        &self.class_replacements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ConditionNode;
    use crate::result_set::ResultSetConfigBuilder;
    use crate::search::TextSearchExpressions;

    fn person_query(config: ResultSetConfig) -> QueryBuilder {
        QueryBuilder::new(config)
            .target_type("Person")
            .from_clause("FROM Person p")
            .default_select_clause("SELECT p")
            .add_default_substitution("p")
    }

    #[test]
    fn test_full_query() {
        let config = ResultSetConfigBuilder::new()
            .fetch("name")
            .fetch_joined("address.city", "address")
            .condition(ConditionNode::eq("address.city", "Oslo").and_also(ConditionNode::is_null("name")))
            .add_order("name", "asc")
            .offset(0)
            .fetch_size(10)
            .build()
            .unwrap();
        let query = person_query(config).build().unwrap();

        assert_eq!(query.select_clause(), "SELECT p.name AS name, _p_address.city AS address_city");
        assert_eq!(query.from_clause(), "FROM Person p LEFT OUTER JOIN p.address AS _p_address");
        assert_eq!(
            query.where_clause(),
            "WHERE 1 = 1 AND (_p_address.city = :address_city AND p.name IS NULL)"
        );
        assert_eq!(query.order_clause(), "ORDER BY p.name ASC");
        assert_eq!(
            query.count_query(),
            "SELECT COUNT(*) FROM Person p LEFT OUTER JOIN p.address AS _p_address \
             WHERE 1 = 1 AND (_p_address.city = :address_city AND p.name IS NULL)"
        );
        assert!(query.main_query().starts_with("SELECT p.name AS name"));
        assert!(query.main_query().ends_with("ORDER BY p.name ASC"));
        assert_eq!(query.aliases(), &["name".to_string(), "address_city".to_string()]);
        assert_eq!(query.page(), Some(PageWindow::new(0, 10)));
        assert_eq!(query.parameters().get("address_city"), Some(&Value::from("Oslo")));
    }

    #[test]
    fn test_default_clauses() {
        let query = person_query(ResultSetConfig::default())
            .default_order("p.id DESC")
            .build()
            .unwrap();
        assert_eq!(query.main_query(), "SELECT p FROM Person p WHERE 1 = 1 ORDER BY p.id DESC");
        assert!(!query.is_projection());
        assert_eq!(query.page(), None);
    }

    #[test]
    fn test_duplicate_join() {
        let config = ResultSetConfigBuilder::new()
            .fetch_joined("address.city", "address")
            .build()
            .unwrap();
        let query = person_query(config)
            .add_left_outer_join("this.address")
            .add_left_outer_join("this.address")
            .build()
            .unwrap();
        assert_eq!(query.from_clause().matches("LEFT OUTER JOIN").count(), 1);
    }

    #[test]
    fn test_join_sees_earlier_substitutions_only() {
        let query = QueryBuilder::new(ResultSetConfig::default())
            .from_clause("FROM Person p")
            .add_left_outer_join("this.address")
            .add_default_substitution("p")
            .build()
            .unwrap();
        assert_eq!(query.from_clause(), "FROM Person p LEFT OUTER JOIN this.address AS _this_address");
    }

    #[test]
    fn test_where_fragments_in_order() {
        let query = person_query(ResultSetConfig::default())
            .add_unconditional_where_condition("p.active = true")
            .add_conditional_where_condition("p.age > :minAge", "minAge", Some(Value::Int(18)))
            .add_conditional_where_condition("p.kind = :kind", "kind", None)
            .set_main_query_parameter("tenant", Value::Int(7))
            .where_clause_custom_part("p.deleted = false")
            .build()
            .unwrap();
        assert_eq!(
            query.where_clause(),
            "WHERE 1 = 1 AND p.active = true AND p.age > :minAge AND :tenant = :tenant AND (p.deleted = false)"
        );
        assert_eq!(query.parameters().len(), 2);
        assert!(query.parameters().get("kind").is_none());
    }

    #[test]
    fn test_empty_in_binding() {
        let config = ResultSetConfigBuilder::new().by_ids(Vec::new()).build().unwrap();
        let query = person_query(config).build().unwrap();
        assert_eq!(query.where_clause(), "WHERE 1 = 1 AND p.id IN (:entityId)");
        assert_eq!(query.bindings()["entityId"], Binding::List(vec![None]));
    }

    #[test]
    fn test_search_fragment() {
        let config = ResultSetConfigBuilder::new()
            .text_search_expressions(TextSearchExpressions::new().add_plain("name").add_numeric("age"))
            .search("ann")
            .build()
            .unwrap();
        let query = person_query(config).build().unwrap();
        let expected = "(((LOWER(p.name) LIKE LOWER('%ann%')) OR (LOWER(str(p.age)) LIKE LOWER('%ann%'))))";
        assert_eq!(query.autocomplete_condition(), Some(expected));
        assert_eq!(query.where_clause(), format!("WHERE 1 = 1 AND {}", expected));
    }

    #[test]
    fn test_search_options_from_config() {
        let mut config = HqConfig::default();
        config.search.case_sensitive = true;
        config.search.leading_wildcard = false;

        let result_set = ResultSetConfigBuilder::new()
            .text_search_expressions(TextSearchExpressions::new().add_plain("name"))
            .search("ann")
            .build()
            .unwrap();
        let query = person_query(result_set).with_config(&config).build().unwrap();
        assert_eq!(query.autocomplete_condition(), Some("(((p.name LIKE 'ann%')))"));
    }

    #[test]
    fn test_additional_properties() {
        let config = ResultSetConfigBuilder::new().fetch("name").build().unwrap();
        let query = person_query(config.clone())
            .add_additional_property("count(p.pets)", "pets")
            .build()
            .unwrap();
        assert_eq!(query.select_clause(), "SELECT p.name AS name, count(p.pets) AS pets");

        let err = person_query(config)
            .add_additional_property("p.name", "name")
            .build()
            .unwrap_err();
        assert!(matches!(err, HqError::AliasCollision { .. }));
    }

    #[test]
    fn test_invalid_substitution() {
        let err = person_query(ResultSetConfig::default())
            .add_substitution("(", "x")
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_argument");
    }

    #[test]
    fn test_parameter_conflict_with_condition() {
        let config = ResultSetConfigBuilder::new()
            .condition(ConditionNode::eq("age", 3))
            .build()
            .unwrap();
        let err = person_query(config)
            .set_parameter("age", Value::Int(4))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_argument");
    }
}
