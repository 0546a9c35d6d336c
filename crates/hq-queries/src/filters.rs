//! Condition trees
//!
//! A filter is a closed tree of simple comparisons, ranges, negations and
//! AND/OR groups. Rendering walks the tree once, writing a parameterized
//! fragment and collecting the values bound to its named parameters.

use std::fmt;

use hq_core::{HqError, HqResult, Value};
use serde::{Deserialize, Serialize};

use crate::params::Parameters;

/// Comparison operators of a simple condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Equals (=)
    Eq,
    /// Not equals (!=)
    NotEq,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    GtOrEq,
    /// Less than or equal (<=)
    LtOrEq,
    Like,
    /// Expression in a parameter list
    In,
    /// Parameter is an element of a collection expression
    Contains,
}

impl Operator {
    /// Parse from the upper-case name
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EQ" => Some(Self::Eq),
            "NOT_EQ" => Some(Self::NotEq),
            "GT" => Some(Self::Gt),
            "LT" => Some(Self::Lt),
            "GT_OR_EQ" => Some(Self::GtOrEq),
            "LT_OR_EQ" => Some(Self::LtOrEq),
            "LIKE" => Some(Self::Like),
            "IN" => Some(Self::In),
            "CONTAINS" => Some(Self::Contains),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::NotEq => "NOT_EQ",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::GtOrEq => "GT_OR_EQ",
            Self::LtOrEq => "LT_OR_EQ",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::Contains => "CONTAINS",
        }
    }

    /// Fragment comparing `expression` with the `parameter` placeholder
    pub fn representation(&self, expression: &str, parameter: &str) -> String {
        match self {
            Self::Eq => format!("{} = {}", expression, parameter),
            Self::NotEq => format!("{} != {}", expression, parameter),
            Self::Gt => format!("{} > {}", expression, parameter),
            Self::Lt => format!("{} < {}", expression, parameter),
            Self::GtOrEq => format!("{} >= {}", expression, parameter),
            Self::LtOrEq => format!("{} <= {}", expression, parameter),
            Self::Like => format!("{} LIKE {}", expression, parameter),
            Self::In => format!("{} IN ({})", expression, parameter),
            Self::Contains => format!("{} IN ELEMENTS({})", parameter, expression),
        }
    }

    /// Whether an absent value is meaningful (null checks)
    pub fn accepts_absent(&self) -> bool {
        matches!(self, Self::Eq | Self::NotEq)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operator of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupOperator {
    And,
    Or,
}

impl GroupOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Fragment equivalent to a group with no children
    pub fn identity(&self) -> &'static str {
        match self {
            Self::And => "(1 = 1)",
            Self::Or => "(1 = 0)",
        }
    }
}

/// A node of a condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Simple {
        property: String,
        operator: Operator,
        parameter: String,
        value: Option<Value>,
    },
    Between {
        property: String,
        lower_parameter: String,
        lower: Value,
        upper_parameter: String,
        upper: Value,
    },
    Not(Box<ConditionNode>),
    Group {
        operator: GroupOperator,
        children: Vec<ConditionNode>,
    },
}

/// Default parameter name derived from a property path
fn parameter_for(property: &str) -> String {
    property.replace('.', "_")
}

/// Bind `value` under `name`
///
/// Default names move to a free `name_N` when taken by another value;
/// explicit names must not conflict.
fn bind_parameter(params: &mut Parameters, name: &str, default: bool, value: &Value) -> HqResult<String> {
    if default {
        Ok(params.bind_unique(name, value.clone()))
    } else {
        params.bind(name, value.clone())?;
        Ok(name.to_string())
    }
}

impl ConditionNode {
    pub fn simple(property: impl Into<String>, operator: Operator, value: Option<Value>) -> Self {
        let property = property.into();
        let parameter = parameter_for(&property);
        Self::Simple {
            property,
            operator,
            parameter,
            value,
        }
    }

    /// Simple condition with an explicit parameter name
    pub fn named(
        property: impl Into<String>,
        operator: Operator,
        parameter: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self::Simple {
            property: property.into(),
            operator,
            parameter: parameter.into(),
            value,
        }
    }

    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::simple(property, Operator::Eq, Some(value.into()))
    }

    pub fn not_eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::simple(property, Operator::NotEq, Some(value.into()))
    }

    pub fn gt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::simple(property, Operator::Gt, Some(value.into()))
    }

    pub fn lt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::simple(property, Operator::Lt, Some(value.into()))
    }

    pub fn gt_or_eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::simple(property, Operator::GtOrEq, Some(value.into()))
    }

    pub fn lt_or_eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::simple(property, Operator::LtOrEq, Some(value.into()))
    }

    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::simple(property, Operator::Like, Some(Value::Text(pattern.into())))
    }

    pub fn in_values<V: Into<Value>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::simple(property, Operator::In, Some(Value::List(values)))
    }

    pub fn contains(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::simple(property, Operator::Contains, Some(value.into()))
    }

    pub fn is_null(property: impl Into<String>) -> Self {
        Self::simple(property, Operator::Eq, None)
    }

    pub fn is_not_null(property: impl Into<String>) -> Self {
        Self::simple(property, Operator::NotEq, None)
    }

    /// Inclusive range with `<param>_from` / `<param>_to` parameters
    pub fn between(
        property: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        let property = property.into();
        let parameter = parameter_for(&property);
        Self::Between {
            lower_parameter: format!("{}_from", parameter),
            upper_parameter: format!("{}_to", parameter),
            property,
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn between_named(
        property: impl Into<String>,
        lower_parameter: impl Into<String>,
        lower: impl Into<Value>,
        upper_parameter: impl Into<String>,
        upper: impl Into<Value>,
    ) -> Self {
        Self::Between {
            property: property.into(),
            lower_parameter: lower_parameter.into(),
            lower: lower.into(),
            upper_parameter: upper_parameter.into(),
            upper: upper.into(),
        }
    }

    pub fn not(inner: ConditionNode) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn and(children: impl IntoIterator<Item = ConditionNode>) -> Self {
        Self::Group {
            operator: GroupOperator::And,
            children: children.into_iter().collect(),
        }
    }

    pub fn or(children: impl IntoIterator<Item = ConditionNode>) -> Self {
        Self::Group {
            operator: GroupOperator::Or,
            children: children.into_iter().collect(),
        }
    }

    /// Conjunction of this condition and `other`
    pub fn and_also(self, other: ConditionNode) -> Self {
        Self::and([self, other])
    }

    /// Property paths referenced anywhere in the tree, in visiting order
    pub fn property_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_properties(&mut names);
        names
    }

    fn collect_properties<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Simple { property, .. } | Self::Between { property, .. } => {
                names.push(property.as_str())
            }
            Self::Not(inner) => inner.collect_properties(names),
            Self::Group { children, .. } => {
                for child in children {
                    child.collect_properties(names);
                }
            }
        }
    }

    /// Render into a fresh fragment and parameter set
    pub fn render_with(&self, resolve: &dyn Fn(&str) -> String) -> HqResult<(String, Parameters)> {
        let mut out = String::new();
        let mut params = Parameters::new();
        render(self, resolve, &mut out, &mut params)?;
        Ok((out, params))
    }
}

/// Append the fragment for `node` to `out`, binding its values into `params`
///
/// `resolve` maps a property path to the query expression used for it.
/// Parameters carrying their derived default name are renamed on conflict.
pub fn render(
    node: &ConditionNode,
    resolve: &dyn Fn(&str) -> String,
    out: &mut String,
    params: &mut Parameters,
) -> HqResult<()> {
    match node {
        ConditionNode::Simple {
            property,
            operator,
            parameter,
            value,
        } => {
            let expression = resolve(property);
            match (value, operator) {
                (Some(value), _) => {
                    let default = *parameter == parameter_for(property);
                    let name = bind_parameter(params, parameter, default, value)?;
                    out.push_str(&operator.representation(&expression, &format!(":{}", name)));
                }
                (None, Operator::Eq) => {
                    out.push_str(&expression);
                    out.push_str(" IS NULL");
                }
                (None, Operator::NotEq) => {
                    out.push_str(&expression);
                    out.push_str(" IS NOT NULL");
                }
                (None, operator) => {
                    return Err(HqError::InvalidCondition {
                        property: property.clone(),
                        operator: operator.to_string(),
                    });
                }
            }
        }
        ConditionNode::Between {
            property,
            lower_parameter,
            lower,
            upper_parameter,
            upper,
        } => {
            let base = parameter_for(property);
            let lower_default = *lower_parameter == format!("{}_from", base);
            let upper_default = *upper_parameter == format!("{}_to", base);
            let lower_name = bind_parameter(params, lower_parameter, lower_default, lower)?;
            let upper_name = bind_parameter(params, upper_parameter, upper_default, upper)?;
            out.push_str(&format!(
                "{} BETWEEN :{} AND :{}",
                resolve(property),
                lower_name,
                upper_name
            ));
        }
        ConditionNode::Not(inner) => {
            out.push_str("NOT (");
            render(inner, resolve, out, params)?;
            out.push(')');
        }
        ConditionNode::Group { operator, children } => {
            if children.is_empty() {
                out.push_str(operator.identity());
                return Ok(());
            }
            out.push('(');
            for (index, child) in children.iter().enumerate() {
                if index > 0 {
                    out.push(' ');
                    out.push_str(operator.as_str());
                    out.push(' ');
                }
                render(child, resolve, out, params)?;
            }
            out.push(')');
        }
    }
    Ok(())
}
