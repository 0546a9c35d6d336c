//! Sort orders
//!
//! Orderings name a property path and a direction; the query builder turns
//! each path into an expression when rendering `ORDER BY`.

use hq_core::{HqError, HqResult};
use serde::{Deserialize, Serialize};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 1-9, oldest first)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest first)
    Desc,
}

impl SortDirection {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Parse, rejecting anything but asc/desc
    pub fn parse(property: &str, s: &str) -> HqResult<Self> {
        Self::from_str(s).ok_or_else(|| {
            HqError::InvalidArgument(format!(
                "sort order must be either 'asc' or 'desc', got '{}' for {}",
                s, property
            ))
        })
    }

    /// Keyword used in `ORDER BY`
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A single sort criterion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortCriterion {
    /// Property path, without the `this.` prefix
    pub property: String,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        let property = property.into();
        let property = property
            .strip_prefix("this.")
            .map(str::to_string)
            .unwrap_or(property);
        Self {
            property,
            direction,
        }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Desc)
    }

    /// `ORDER BY` item for the given expression
    pub fn render(&self, expression: &str) -> String {
        format!("{} {}", expression, self.direction.keyword())
    }
}

/// Ordered list of sort criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    criteria: Vec<SortCriterion>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self { criteria: vec![] }
    }

    pub fn add(&mut self, criterion: SortCriterion) -> &mut Self {
        self.criteria.push(criterion);
        self
    }

    /// Add a sort criterion (builder pattern)
    pub fn then(mut self, criterion: SortCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn criteria(&self) -> &[SortCriterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn clear(&mut self) {
        self.criteria.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::from_str("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::from_str("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::Desc.keyword(), "DESC");
        assert!(SortDirection::parse("name", "sideways").is_err());
    }

    #[test]
    fn test_sort_criterion() {
        let criterion = SortCriterion::asc("this.created");
        assert_eq!(criterion.property, "created");
        assert_eq!(criterion.render("p.created"), "p.created ASC");
        assert_eq!(SortCriterion::desc("updated").render("p.updated"), "p.updated DESC");
    }

    #[test]
    fn test_sort_order() {
        let mut order = SortOrder::new()
            .then(SortCriterion::desc("updated"))
            .then(SortCriterion::asc("id"));
        order.add(SortCriterion::asc("name"));

        assert_eq!(order.len(), 3);
        assert_eq!(order.criteria()[0].direction, SortDirection::Desc);
        assert_eq!(order.criteria()[2].property, "name");

        order.clear();
        assert!(order.is_empty());
    }
}
