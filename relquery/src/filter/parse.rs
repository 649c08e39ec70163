//! Document-style filters, as ORM users write them:
//!
//! ```json
//! { "name": { "$like": "F%" }, "books": { "$every": { "title": "title" } } }
//! ```
//!
//! Keys of one object are AND-ed. A relation key takes `$every`, `$some` or
//! `$none`; a plain object under a relation key means `$some`.

use serde_json::{Map, Value};

use super::{Filter, FilterValue, Operator, Quantifier};
use crate::error::{Result, TranslateError};
use crate::model::{ModelRegistry, Table};

impl Filter {
    pub fn from_json(registry: &ModelRegistry, entity: &str, value: &Value) -> Result<Filter> {
        let table = registry
            .get_model(entity)
            .ok_or_else(|| TranslateError::UnknownEntity(entity.to_string()))?;
        Parser { registry }.object(entity, table, value)
    }
}

struct Parser<'r> {
    registry: &'r ModelRegistry,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn quantifier(key: &str) -> Option<Quantifier> {
    match key {
        "$every" => Some(Quantifier::Every),
        "$some" => Some(Quantifier::Some),
        "$none" => Some(Quantifier::None),
        _ => None,
    }
}

fn operator(key: &str) -> Option<Operator> {
    let op = match key {
        "$eq" => Operator::Equal,
        "$ne" => Operator::NotEqual,
        "$gt" => Operator::GreaterThan,
        "$gte" => Operator::GreaterThanOrEqual,
        "$lt" => Operator::LessThan,
        "$lte" => Operator::LessThanOrEqual,
        "$like" => Operator::Like,
        "$in" => Operator::In,
        "$nin" => Operator::NotIn,
        "$between" => Operator::Between,
        _ => return None,
    };
    Some(op)
}

fn conjunction(mut filters: Vec<Filter>) -> Filter {
    if filters.len() == 1 {
        filters.remove(0)
    } else {
        Filter::and(filters)
    }
}

impl Parser<'_> {
    fn object(&self, entity: &str, table: &Table, value: &Value) -> Result<Filter> {
        let map = value.as_object().ok_or_else(|| {
            TranslateError::predicate(
                entity,
                format!("expected a filter object, found {}", json_kind(value)),
            )
        })?;

        let filters = map
            .iter()
            .map(|(key, value)| self.entry(entity, table, key, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(conjunction(filters))
    }

    fn entry(&self, entity: &str, table: &Table, key: &str, value: &Value) -> Result<Filter> {
        match key {
            "$and" => Ok(Filter::and(self.list(entity, table, key, value)?)),
            "$or" => Ok(Filter::or(self.list(entity, table, key, value)?)),
            "$not" => Ok(Filter::not(self.object(entity, table, value)?)),
            k if k.starts_with('$') => Err(TranslateError::predicate(
                entity,
                format!("unknown operator `{k}`"),
            )),
            _ if table.relation(key).is_some() => self.relation(entity, table, key, value),
            _ if table.field(key).is_some() => field(entity, key, value),
            _ => Err(TranslateError::predicate(
                entity,
                format!("unknown field `{key}`"),
            )),
        }
    }

    fn list(&self, entity: &str, table: &Table, key: &str, value: &Value) -> Result<Vec<Filter>> {
        let items = value.as_array().ok_or_else(|| {
            TranslateError::predicate(
                entity,
                format!("`{key}` expects an array, found {}", json_kind(value)),
            )
        })?;
        items
            .iter()
            .map(|item| self.object(entity, table, item))
            .collect()
    }

    fn relation(&self, entity: &str, table: &Table, name: &str, value: &Value) -> Result<Filter> {
        let Some(relation) = table.relation(name) else {
            return Err(TranslateError::relationship(entity, name, "not declared"));
        };
        let target = self.registry.get_model(&relation.target).ok_or_else(|| {
            TranslateError::relationship(
                entity,
                name,
                format!("target entity `{}` is not registered", relation.target),
            )
        })?;
        let map: &Map<String, Value> = value.as_object().ok_or_else(|| {
            TranslateError::predicate(
                entity,
                format!("relation `{name}` expects an object, found {}", json_kind(value)),
            )
        })?;

        if !relation.is_to_many() {
            return Err(TranslateError::relationship(
                entity,
                name,
                "only to-many relations can be filtered through",
            ));
        }

        let quantified = map.keys().any(|k| quantifier(k).is_some());
        if !quantified {
            let sub = self.object(&relation.target, target, value)?;
            return Ok(Filter::some(name, sub));
        }

        let mut filters = Vec::with_capacity(map.len());
        for (key, sub) in map {
            let quantifier = quantifier(key).ok_or_else(|| {
                TranslateError::predicate(
                    entity,
                    format!("`{key}` cannot be mixed with collection operators on `{name}`"),
                )
            })?;
            let sub = self.object(&relation.target, target, sub)?;
            filters.push(Filter::collection(name, quantifier, sub));
        }
        Ok(conjunction(filters))
    }
}

fn field(entity: &str, column: &str, value: &Value) -> Result<Filter> {
    match value {
        Value::Null => Ok(Filter::is_null(column)),
        Value::Array(_) => Ok(Filter::condition(
            column,
            Operator::In,
            literal(entity, column, value)?,
        )),
        Value::Object(ops) => {
            if ops.is_empty() {
                return Err(TranslateError::predicate(
                    entity,
                    format!("empty operator object for `{column}`"),
                ));
            }
            let filters = ops
                .iter()
                .map(|(op, operand)| field_operator(entity, column, op, operand))
                .collect::<Result<Vec<_>>>()?;
            Ok(conjunction(filters))
        }
        _ => Ok(Filter::equals(column, literal(entity, column, value)?)),
    }
}

fn field_operator(entity: &str, column: &str, op: &str, operand: &Value) -> Result<Filter> {
    let operator = operator(op).ok_or_else(|| {
        TranslateError::predicate(entity, format!("unknown operator `{op}` on `{column}`"))
    })?;

    match (operator, operand) {
        (Operator::Equal, Value::Null) => Ok(Filter::is_null(column)),
        (Operator::NotEqual, Value::Null) => {
            Ok(Filter::condition(column, Operator::IsNotNull, FilterValue::Null))
        }
        (Operator::Between, Value::Array(bounds)) => match bounds.as_slice() {
            [min, max] => match (min.as_f64(), max.as_f64()) {
                (Some(min), Some(max)) => Ok(Filter::condition(
                    column,
                    Operator::Between,
                    FilterValue::Range { min, max },
                )),
                _ => Err(TranslateError::predicate(
                    entity,
                    format!("`$between` on `{column}` expects numeric bounds"),
                )),
            },
            _ => Err(TranslateError::predicate(
                entity,
                format!("`$between` on `{column}` expects [min, max]"),
            )),
        },
        (Operator::In | Operator::NotIn, Value::Array(_)) => {
            Ok(Filter::condition(column, operator, literal(entity, column, operand)?))
        }
        (Operator::In | Operator::NotIn | Operator::Between, other) => {
            Err(TranslateError::predicate(
                entity,
                format!("`{op}` on `{column}` expects an array, found {}", json_kind(other)),
            ))
        }
        (_, Value::Array(_) | Value::Object(_)) => Err(TranslateError::predicate(
            entity,
            format!("`{op}` on `{column}` expects a scalar, found {}", json_kind(operand)),
        )),
        _ => Ok(Filter::condition(column, operator, literal(entity, column, operand)?)),
    }
}

fn literal(entity: &str, column: &str, value: &Value) -> Result<FilterValue> {
    if let Value::Array(items) = value {
        if items.is_empty() {
            // An empty JSON array carries no element type; keep it empty.
            return Ok(FilterValue::StringArray(Vec::new()));
        }
    }
    if has_oversized_integer(value) {
        return Err(TranslateError::predicate(
            entity,
            format!("integer value for `{column}` does not fit in 64 bits"),
        ));
    }
    serde_json::from_value(value.clone()).map_err(|e| {
        TranslateError::predicate(
            entity,
            format!("unsupported value for `{column}`: {e}"),
        )
    })
}

// Untagged deserialization would otherwise turn these into rounded floats.
fn has_oversized_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_u64() && !n.is_i64(),
        Value::Array(items) => items.iter().any(has_oversized_integer),
        Value::Object(map) => map.values().any(has_oversized_integer),
        _ => false,
    }
}
