//! Filter expressions over entity fields and relations.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod parse;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Operator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "is_null")]
    IsNull,
    #[serde(rename = "is_not_null")]
    IsNotNull,
}

impl Operator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::Between
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// A literal on the right-hand side of a condition.
///
/// Untagged: integers are tried before floats so `3` stays an integer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    IntegerArray(Vec<i64>),
    NumberArray(Vec<f64>),
    StringArray(Vec<String>),
    Range { min: f64, max: f64 },
}

impl FilterValue {
    pub fn describe(&self) -> &'static str {
        match self {
            FilterValue::Null => "null",
            FilterValue::Boolean(_) => "boolean",
            FilterValue::Integer(_) => "integer",
            FilterValue::Number(_) => "number",
            FilterValue::String(_) => "string",
            FilterValue::IntegerArray(_) => "integer array",
            FilterValue::NumberArray(_) => "number array",
            FilterValue::StringArray(_) => "string array",
            FilterValue::Range { .. } => "range",
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

/// `column` is a field of the entity the condition is evaluated against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterCondition {
    pub column: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicalOperator {
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterGroup {
    pub operator: LogicalOperator,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

/// How many related rows must satisfy a collection sub-filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    /// Every related row matches.
    Every,
    /// At least one related row matches.
    Some,
    /// No related row matches.
    None,
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::Every => f.write_str("$every"),
            Quantifier::Some => f.write_str("$some"),
            Quantifier::None => f.write_str("$none"),
        }
    }
}

/// A sub-filter over the rows reached through a to-many `relation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionFilter {
    pub relation: String,
    pub quantifier: Quantifier,
    pub filter: Box<Filter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    Condition(FilterCondition),
    Group(FilterGroup),
    Not { filter: Box<Filter> },
    Collection(CollectionFilter),
}

impl Filter {
    pub fn condition(
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Filter::Condition(FilterCondition {
            column: column.into(),
            operator,
            value: value.into(),
        })
    }

    pub fn equals(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::condition(column, Operator::Equal, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::condition(column, Operator::IsNull, FilterValue::Null)
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::Group(FilterGroup {
            operator: LogicalOperator::And,
            filters,
        })
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Group(FilterGroup {
            operator: LogicalOperator::Or,
            filters,
        })
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Not {
            filter: Box::new(filter),
        }
    }

    pub fn collection(relation: impl Into<String>, quantifier: Quantifier, filter: Filter) -> Self {
        Filter::Collection(CollectionFilter {
            relation: relation.into(),
            quantifier,
            filter: Box::new(filter),
        })
    }

    pub fn every(relation: impl Into<String>, filter: Filter) -> Self {
        Self::collection(relation, Quantifier::Every, filter)
    }

    pub fn some(relation: impl Into<String>, filter: Filter) -> Self {
        Self::collection(relation, Quantifier::Some, filter)
    }

    pub fn none(relation: impl Into<String>, filter: Filter) -> Self {
        Self::collection(relation, Quantifier::None, filter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortOrder {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FilterRequest {
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub sort: Vec<SortOrder>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl FilterRequest {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortOrder {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}
