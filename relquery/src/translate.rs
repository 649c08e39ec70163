//! Filter tree to [`Fragment`] translation.
//!
//! Collection quantifiers become correlated subqueries over the related
//! table, joined back through the relation's foreign key:
//!
//! ```text
//! $some  (rel, P)  =>      EXISTS (SELECT 1 FROM rel r WHERE r.fk = parent.pk AND P)
//! $none  (rel, P)  =>  NOT EXISTS (SELECT 1 FROM rel r WHERE r.fk = parent.pk AND P)
//! $every (rel, P)  =>  NOT EXISTS (SELECT 1 FROM rel r WHERE r.fk = parent.pk AND (P) IS NOT TRUE)
//! ```
//!
//! SQL has no universal quantifier, so `$every` is "no counterexample
//! exists". `IS NOT TRUE` makes a related row whose predicate evaluates to
//! NULL a counterexample as well. Under [`EveryPolicy::RequireNonEmpty`] the
//! `$every` fragment is additionally conjoined with
//! `EXISTS (SELECT 1 FROM rel r WHERE r.fk = parent.pk)`.

use common::config::{EveryPolicy, TranslatorConfig};
use sea_orm::Value;
use tracing::debug;

use crate::error::{Result, TranslateError};
use crate::filter::{CollectionFilter, Filter, FilterCondition, FilterValue, LogicalOperator, Operator, Quantifier};
use crate::model::{Field, FieldType, ModelRegistry, Table};
use crate::plan::{ColumnRef, Fragment, Operand};

pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Resolves filters against a registry. Holds no per-call state, so one
/// translator can serve concurrent callers.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'r> {
    registry: &'r ModelRegistry,
    policy: EveryPolicy,
    max_depth: usize,
}

impl<'r> Translator<'r> {
    pub fn new(registry: &'r ModelRegistry) -> Self {
        Self {
            registry,
            policy: EveryPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_config(registry: &'r ModelRegistry, config: &TranslatorConfig) -> Self {
        Self::new(registry)
            .with_policy(config.every_policy)
            .with_max_depth(config.max_depth)
    }

    pub fn with_policy(mut self, policy: EveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn policy(&self) -> EveryPolicy {
        self.policy
    }

    pub fn registry(&self) -> &'r ModelRegistry {
        self.registry
    }

    /// Translate `filter` over `entity`, whose table is addressed by its registry alias.
    pub fn translate(&self, entity: &str, filter: &Filter) -> Result<Fragment> {
        let table = self
            .registry
            .get_model(entity)
            .ok_or_else(|| TranslateError::UnknownEntity(entity.to_string()))?;

        let scope = Scope {
            entity,
            table,
            alias: table.alias.clone(),
            depth: 0,
        };
        let mut pass = Pass {
            translator: self,
            aliases: 0,
        };
        let fragment = pass.filter(&scope, filter)?;

        debug!(entity, policy = ?self.policy, ?fragment, "translated filter");
        Ok(fragment)
    }

    /// `EVERY(relation, predicate)` over `entity` on its own.
    pub fn translate_every(&self, entity: &str, relation: &str, predicate: &Filter) -> Result<Fragment> {
        self.translate(entity, &Filter::every(relation, predicate.clone()))
    }
}

struct Scope<'a> {
    entity: &'a str,
    table: &'a Table,
    alias: String,
    depth: usize,
}

/// One translation run; numbers subquery aliases from 1.
struct Pass<'t, 'r> {
    translator: &'t Translator<'r>,
    aliases: usize,
}

impl Pass<'_, '_> {
    fn filter(&mut self, scope: &Scope<'_>, filter: &Filter) -> Result<Fragment> {
        match filter {
            Filter::Condition(condition) => translate_condition(scope, condition),
            Filter::Group(group) => {
                let parts = group
                    .filters
                    .iter()
                    .map(|f| self.filter(scope, f))
                    .collect::<Result<Vec<_>>>()?;
                Ok(match group.operator {
                    LogicalOperator::And => Fragment::and(parts),
                    LogicalOperator::Or => Fragment::or(parts),
                })
            }
            Filter::Not { filter } => Ok(Fragment::not(self.filter(scope, filter)?)),
            Filter::Collection(collection) => self.collection(scope, collection),
        }
    }

    fn collection(&mut self, scope: &Scope<'_>, collection: &CollectionFilter) -> Result<Fragment> {
        let registry = self.translator.registry;
        let name = collection.relation.as_str();

        let relation = scope
            .table
            .relation(name)
            .ok_or_else(|| TranslateError::relationship(scope.entity, name, "not declared"))?;
        if !relation.is_to_many() {
            return Err(TranslateError::relationship(
                scope.entity,
                name,
                format!("`{}` needs a to-many relation, found {:?}", collection.quantifier, relation.kind),
            ));
        }
        let (target_entity, target) = registry
            .get_model(&relation.target)
            .map(|table| (relation.target.as_str(), table))
            .ok_or_else(|| {
                TranslateError::relationship(
                    scope.entity,
                    name,
                    format!("target entity `{}` is not registered", relation.target),
                )
            })?;
        if target.field(&relation.foreign_key).is_none() {
            return Err(TranslateError::relationship(
                scope.entity,
                name,
                format!("foreign key `{}` is not a field of `{}`", relation.foreign_key, target_entity),
            ));
        }
        if scope.depth >= self.translator.max_depth {
            return Err(TranslateError::predicate(
                scope.entity,
                format!("collection filters nested deeper than {} levels", self.translator.max_depth),
            ));
        }

        let alias = self.next_alias(&target.name);
        let correlation = Fragment::ColumnEq(
            ColumnRef::new(&alias, &relation.foreign_key),
            ColumnRef::new(&scope.alias, &scope.table.primary_key),
        );
        let child = Scope {
            entity: target_entity,
            table: target,
            alias: alias.clone(),
            depth: scope.depth + 1,
        };
        let predicate = self.filter(&child, &collection.filter)?;

        let fragment = match collection.quantifier {
            Quantifier::Some => {
                Fragment::exists(&target.name, &alias, Fragment::and(vec![correlation, predicate]))
            }
            Quantifier::None => Fragment::not(Fragment::exists(
                &target.name,
                &alias,
                Fragment::and(vec![correlation, predicate]),
            )),
            Quantifier::Every => {
                let no_counterexample = Fragment::not(Fragment::exists(
                    &target.name,
                    &alias,
                    Fragment::and(vec![correlation.clone(), Fragment::not_true(predicate)]),
                ));
                match self.translator.policy {
                    EveryPolicy::Vacuous => no_counterexample,
                    EveryPolicy::RequireNonEmpty => Fragment::and(vec![
                        no_counterexample,
                        Fragment::exists(&target.name, &alias, correlation),
                    ]),
                }
            }
        };
        Ok(fragment)
    }

    fn next_alias(&mut self, table: &str) -> String {
        self.aliases += 1;
        let first_char = table
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or('t');
        format!("{}_{}", first_char, self.aliases)
    }
}

fn translate_condition(scope: &Scope<'_>, condition: &FilterCondition) -> Result<Fragment> {
    let field = scope.table.field(&condition.column).ok_or_else(|| {
        TranslateError::predicate(scope.entity, format!("unknown field `{}`", condition.column))
    })?;
    let column = ColumnRef::new(&scope.alias, &field.name);

    let operand = match condition.operator {
        Operator::IsNull | Operator::IsNotNull => Operand::None,
        Operator::In | Operator::NotIn => {
            let values = list_values(scope.entity, field, &condition.value)?;
            if values.is_empty() {
                // x IN () matches nothing; x NOT IN () matches everything.
                return Ok(match condition.operator {
                    Operator::In => Fragment::False,
                    _ => Fragment::True,
                });
            }
            Operand::List(values)
        }
        Operator::Between => match (&condition.value, field.field_type) {
            (FilterValue::Range { min, max }, FieldType::Number) => {
                Operand::Range(Value::from(*min), Value::from(*max))
            }
            (FilterValue::Range { .. }, ty) => {
                return Err(TranslateError::predicate(
                    scope.entity,
                    format!("`between` needs a number field, `{}` is {:?}", field.name, ty),
                ));
            }
            (other, _) => {
                return Err(TranslateError::predicate(
                    scope.entity,
                    format!("`between` on `{}` needs a range, got {}", field.name, other.describe()),
                ));
            }
        },
        op => {
            if op == Operator::Like && field.field_type != FieldType::String {
                return Err(TranslateError::predicate(
                    scope.entity,
                    format!("`like` needs a string field, `{}` is {:?}", field.name, field.field_type),
                ));
            }
            if op.is_ordering() && field.field_type == FieldType::Boolean {
                return Err(TranslateError::predicate(
                    scope.entity,
                    format!("`{op}` cannot order boolean field `{}`", field.name),
                ));
            }
            Operand::Single(scalar_value(scope.entity, field, &condition.value)?)
        }
    };

    Ok(Fragment::Compare {
        column,
        operator: condition.operator,
        operand,
    })
}

fn scalar_value(entity: &str, field: &Field, value: &FilterValue) -> Result<Value> {
    match (field.field_type, value) {
        (FieldType::String | FieldType::DateTime, FilterValue::String(s)) => Ok(Value::from(s.clone())),
        (FieldType::Number, FilterValue::Integer(i)) => Ok(Value::from(*i)),
        (FieldType::Number, FilterValue::Number(n)) => Ok(Value::from(*n)),
        (FieldType::Boolean, FilterValue::Boolean(b)) => Ok(Value::from(*b)),
        (_, FilterValue::Null) => Err(TranslateError::predicate(
            entity,
            format!("comparing `{}` with null; use is_null / is_not_null", field.name),
        )),
        (ty, other) => Err(TranslateError::predicate(
            entity,
            format!("`{}` is a {:?} field, got a {} value", field.name, ty, other.describe()),
        )),
    }
}

fn list_values(entity: &str, field: &Field, value: &FilterValue) -> Result<Vec<Value>> {
    let values = match (field.field_type, value) {
        (FieldType::String | FieldType::DateTime, FilterValue::StringArray(items)) => {
            items.iter().map(|s| Value::from(s.clone())).collect()
        }
        (FieldType::Number, FilterValue::IntegerArray(items)) => {
            items.iter().map(|i| Value::from(*i)).collect()
        }
        (FieldType::Number, FilterValue::NumberArray(items)) => {
            items.iter().map(|n| Value::from(*n)).collect()
        }
        // Untyped empty list, as parsed from `[]`.
        (_, FilterValue::StringArray(items)) if items.is_empty() => Vec::new(),
        (ty, other) => {
            return Err(TranslateError::predicate(
                entity,
                format!("`{}` is a {:?} field, got a {} for a list operator", field.name, ty, other.describe()),
            ));
        }
    };
    Ok(values)
}
