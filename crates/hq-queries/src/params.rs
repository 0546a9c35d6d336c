//! Named query parameters
//!
//! Parameters are collected while rendering and handed to the executor as
//! bindings; collection values bind as lists.

use std::collections::BTreeMap;

use hq_core::{HqError, HqResult, Value};

/// Named parameter values, ordered by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value; re-binding a name to the same value is a no-op
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> HqResult<()> {
        let name = name.into();
        match self.0.get(&name) {
            Some(existing) if *existing != value => Err(HqError::InvalidArgument(format!(
                "parameter '{}' is already bound to {}, cannot rebind to {}",
                name, existing, value
            ))),
            Some(_) => Ok(()),
            None => {
                self.0.insert(name, value);
                Ok(())
            }
        }
    }

    /// Bind a value under `base` or the first free `base_N`
    ///
    /// A name already holding the same value is reused. Returns the name used.
    pub fn bind_unique(&mut self, base: &str, value: Value) -> String {
        let mut name = base.to_string();
        let mut suffix = 0;
        loop {
            match self.0.get(&name) {
                Some(existing) if *existing == value => return name,
                Some(_) => {
                    suffix += 1;
                    name = format!("{}_{}", base, suffix);
                }
                None => {
                    self.0.insert(name.clone(), value);
                    return name;
                }
            }
        }
    }

    /// Bind a value, replacing any previous one
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Executor-facing bindings
    pub fn bindings(&self) -> BTreeMap<String, Binding> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), Binding::from_value(value)))
            .collect()
    }
}

/// How a parameter is bound at execution
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Scalar(Value),
    /// Parameter list; an empty collection binds a single null
    List(Vec<Option<Value>>),
}

impl Binding {
    pub fn from_value(value: &Value) -> Self {
        match value.clone().into_elements() {
            Ok(items) if items.is_empty() => Binding::List(vec![None]),
            Ok(items) => Binding::List(items.into_iter().map(Some).collect()),
            Err(scalar) => Binding::Scalar(scalar),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Binding::List(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_conflicts() {
        let mut params = Parameters::new();
        params.bind("id", Value::Int(1)).unwrap();
        params.bind("id", Value::Int(1)).unwrap();
        assert_eq!(params.len(), 1);

        let err = params.bind("id", Value::Int(2)).unwrap_err();
        assert_eq!(err.error_code(), "invalid_argument");

        params.set("id", Value::Int(2));
        assert_eq!(params.get("id"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_bind_unique() {
        let mut params = Parameters::new();
        assert_eq!(params.bind_unique("age", Value::Int(18)), "age");
        assert_eq!(params.bind_unique("age", Value::Int(65)), "age_1");
        assert_eq!(params.bind_unique("age", Value::Int(70)), "age_2");
        // same value reuses the earlier name
        assert_eq!(params.bind_unique("age", Value::Int(65)), "age_1");
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("age_2"), Some(&Value::Int(70)));
    }

    #[test]
    fn test_bindings() {
        let mut params = Parameters::new();
        params.set("name", Value::from("x"));
        params.set("ids", Value::List(vec![Value::Int(1), Value::Int(2)]));
        params.set("none", Value::Array(Vec::new()));

        let bindings = params.bindings();
        assert_eq!(bindings["name"], Binding::Scalar(Value::from("x")));
        assert_eq!(
            bindings["ids"],
            Binding::List(vec![Some(Value::Int(1)), Some(Value::Int(2))])
        );
        assert_eq!(bindings["none"], Binding::List(vec![None]));
        assert!(bindings["none"].is_list());
    }
}
