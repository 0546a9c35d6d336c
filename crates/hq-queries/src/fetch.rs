//! Fetched properties
//!
//! A fetched property is selected under an alias derived from its name; the
//! row transformer later splits that alias back into a property path.

use serde::{Deserialize, Serialize};

/// Separator replacing `.` in select aliases
pub const ALIAS_SEPARATOR: char = '_';

/// A property selected into the result rows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchableProperty {
    name: String,
    expression: String,
    join: Option<String>,
}

impl FetchableProperty {
    /// Fetch `name`, selected as `this.<name>`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name
            .strip_prefix("this.")
            .map(str::to_string)
            .unwrap_or(name);
        Self {
            expression: format!("this.{}", name),
            name,
            join: None,
        }
    }

    /// Fetch `name` computed by a custom expression
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    /// Require a left outer join on `path` to fetch this property
    pub fn with_join(mut self, path: impl Into<String>) -> Self {
        self.join = Some(path.into());
        self
    }

    pub fn without_join(mut self) -> Self {
        self.join = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn join(&self) -> Option<&str> {
        self.join.as_deref()
    }

    /// Select alias: the name with `.` replaced by `_`
    pub fn alias(&self) -> String {
        to_alias(&self.name)
    }
}

pub fn to_alias(name: &str) -> String {
    name.replace('.', &ALIAS_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let property = FetchableProperty::new("address.city");
        assert_eq!(property.expression(), "this.address.city");
        assert_eq!(property.alias(), "address_city");
        assert_eq!(property.join(), None);

        let prefixed = FetchableProperty::new("this.name");
        assert_eq!(prefixed.name(), "name");
        assert_eq!(prefixed.expression(), "this.name");
    }

    #[test]
    fn test_custom_expression_and_join() {
        let property = FetchableProperty::new("owner.name")
            .with_expression("upper(this.owner.name)")
            .with_join("owner");
        assert_eq!(property.expression(), "upper(this.owner.name)");
        assert_eq!(property.join(), Some("owner"));
        assert_eq!(property.without_join().join(), None);
    }
}
