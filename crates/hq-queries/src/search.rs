//! Full-text search
//!
//! A search string is split into at most `token_limit` wildcarded tokens.
//! Every token must match at least one searched expression, so the fragment
//! is an AND over tokens of an OR over expressions.

use hq_core::SearchDefaults;
use serde::{Deserialize, Serialize};

/// Tokenizer and matching options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub leading_wildcard: bool,
    pub trailing_wildcard: bool,
    pub case_sensitive: bool,
    pub token_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchDefaults::default())
    }
}

impl From<&SearchDefaults> for SearchOptions {
    fn from(defaults: &SearchDefaults) -> Self {
        Self {
            leading_wildcard: defaults.leading_wildcard,
            trailing_wildcard: defaults.trailing_wildcard,
            case_sensitive: defaults.case_sensitive,
            token_limit: defaults.token_limit,
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '.' | ',' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\'' | '<' | '>' | ':' | ';' | '|'
                | '\\' | '?' | '/' | '+'
        )
}

/// Split `text` into search tokens wrapped with `%`
///
/// SQL wildcard characters (`*`, `%`, `_`) inside a token become spaces;
/// tokens left blank are dropped and at most `limit` are kept.
pub fn tokenize_and_wildcard(text: &str, leading: bool, trailing: bool, limit: usize) -> Vec<String> {
    text.split(is_delimiter)
        .map(|token| token.replace(['*', '%', '_'], " "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .take(limit)
        .map(|token| {
            let mut wrapped = String::with_capacity(token.len() + 2);
            if leading {
                wrapped.push('%');
            }
            wrapped.push_str(&token);
            if trailing {
                wrapped.push('%');
            }
            wrapped
        })
        .collect()
}

fn lower(expression: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        expression.to_string()
    } else {
        format!("LOWER({})", expression)
    }
}

/// Search fragment over `expressions`, or `None` when nothing can match
pub fn render_search(text: &str, expressions: &[String], options: &SearchOptions) -> Option<String> {
    if expressions.is_empty() {
        return None;
    }
    let tokens = tokenize_and_wildcard(
        text,
        options.leading_wildcard,
        options.trailing_wildcard,
        options.token_limit,
    );
    if tokens.is_empty() {
        return None;
    }

    let clauses: Vec<String> = tokens
        .iter()
        .map(|token| {
            let literal = lower(&format!("'{}'", token), options.case_sensitive);
            let parts: Vec<String> = expressions
                .iter()
                .map(|expression| {
                    format!("({} LIKE {})", lower(expression, options.case_sensitive), literal)
                })
                .collect();
            format!("({})", parts.join(" OR "))
        })
        .collect();
    Some(format!("({})", clauses.join(" AND ")))
}

/// How a searched property is turned into text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Plain,
    Numeric,
    /// Rendered as zero-padded `yyyy-mm-dd`
    Date,
    /// Rendered as `ID<number>`
    Id,
    /// Stored codes translated to labels
    Dict(Vec<(String, String)>),
}

impl TextKind {
    fn tag(&self) -> u8 {
        match self {
            Self::Plain => 0,
            Self::Numeric => 1,
            Self::Date => 2,
            Self::Id => 3,
            Self::Dict(_) => 4,
        }
    }
}

/// A searched property and the expression producing its text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyExpression {
    name: String,
    expression: String,
    kind: TextKind,
}

impl PropertyExpression {
    pub fn new(name: impl Into<String>, expression: impl Into<String>, kind: TextKind) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn kind(&self) -> &TextKind {
        &self.kind
    }
}

/// Identity is the property name and kind
impl PartialEq for PropertyExpression {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind.tag() == other.kind.tag()
    }
}

impl Eq for PropertyExpression {}

/// Searched properties, in insertion order and free of duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSearchExpressions {
    expressions: Vec<PropertyExpression>,
}

impl TextSearchExpressions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, expression: PropertyExpression) -> Self {
        if !self.expressions.contains(&expression) {
            self.expressions.push(expression);
        }
        self
    }

    pub fn add_plain(self, name: &str) -> Self {
        self.add(PropertyExpression::new(name, format!("this.{}", name), TextKind::Plain))
    }

    pub fn add_numeric(self, name: &str) -> Self {
        self.add(PropertyExpression::new(
            name,
            format!("str(this.{})", name),
            TextKind::Numeric,
        ))
    }

    pub fn add_date(self, name: &str) -> Self {
        let expression = format!(
            "(trim(str(year(this.{0}))) \
             || '-' || (case when month(this.{0}) < 10 then '0' else '' end) || trim(str(month(this.{0}))) \
             || '-' || (case when day(this.{0}) < 10 then '0' else '' end) || trim(str(day(this.{0}))))",
            name
        );
        self.add(PropertyExpression::new(name, expression, TextKind::Date))
    }

    pub fn add_id(self, name: &str) -> Self {
        self.add(PropertyExpression::new(
            name,
            format!("'ID' || trim(str(this.{}))", name),
            TextKind::Id,
        ))
    }

    /// Search the labels of a coded property
    pub fn add_dict<C, L>(self, name: &str, labels: impl IntoIterator<Item = (C, L)>) -> Self
    where
        C: Into<String>,
        L: Into<String>,
    {
        let labels: Vec<(String, String)> = labels
            .into_iter()
            .map(|(code, label)| (code.into(), label.into()))
            .collect();
        let mut expression = format!("(case this.{}", name);
        for (code, label) in &labels {
            expression.push_str(&format!(
                " when '{}' then '{}'",
                code.replace('\'', "''"),
                label.replace('\'', "''")
            ));
        }
        expression.push_str(" end)");
        self.add(PropertyExpression::new(name, expression, TextKind::Dict(labels)))
    }

    pub fn expressions(&self) -> &[PropertyExpression] {
        &self.expressions
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}
