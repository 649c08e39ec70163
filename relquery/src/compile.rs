//! Renders [`Fragment`]s to SQL text plus bound values for a [`Dialect`].

use sea_orm::Value;

use crate::dialect::Dialect;
use crate::error::{Result, TranslateError};
use crate::filter::Operator;
use crate::plan::{ColumnRef, Fragment, Operand, Subquery};

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFragment {
    pub sql: String,
    pub values: Vec<Value>,
}

pub struct SqlCompiler<'d> {
    dialect: &'d dyn Dialect,
    values: Vec<Value>,
}

impl<'d> SqlCompiler<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    /// Fails with `UnsupportedBackend` before rendering anything if the
    /// fragment needs a subquery the dialect cannot evaluate.
    pub fn compile(mut self, fragment: &Fragment) -> Result<CompiledFragment> {
        if fragment.has_subquery() && !self.dialect.supports_correlated_subqueries() {
            return Err(TranslateError::UnsupportedBackend {
                backend: self.dialect.name().to_string(),
            });
        }

        self.values.reserve(fragment.value_count());
        let sql = self.render(fragment);
        Ok(CompiledFragment {
            sql,
            values: self.values,
        })
    }

    fn render(&mut self, fragment: &Fragment) -> String {
        match fragment {
            Fragment::True => "1 = 1".to_string(),
            Fragment::False => "1 = 0".to_string(),
            Fragment::And(parts) => self.join(parts, " AND "),
            Fragment::Or(parts) => self.join(parts, " OR "),
            Fragment::Not(inner) => match inner.as_ref() {
                Fragment::Exists(subquery) => format!("NOT {}", self.exists(subquery)),
                other => format!("NOT ({})", self.render(other)),
            },
            Fragment::NotTrue(inner) => format!("({}) IS NOT TRUE", self.render(inner)),
            Fragment::Compare {
                column,
                operator,
                operand,
            } => self.compare(column, *operator, operand),
            Fragment::ColumnEq(left, right) => format!("{} = {}", column_sql(left), column_sql(right)),
            Fragment::Exists(subquery) => self.exists(subquery),
        }
    }

    fn join(&mut self, parts: &[Fragment], separator: &str) -> String {
        parts
            .iter()
            .map(|part| match part {
                Fragment::And(_) | Fragment::Or(_) => format!("({})", self.render(part)),
                _ => self.render(part),
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn exists(&mut self, subquery: &Subquery) -> String {
        format!(
            "EXISTS (SELECT 1 FROM {} {} WHERE {})",
            subquery.table,
            subquery.alias,
            self.render(&subquery.filter)
        )
    }

    fn compare(&mut self, column: &ColumnRef, operator: Operator, operand: &Operand) -> String {
        let column = column_sql(column);
        match (operator, operand) {
            (Operator::IsNull | Operator::IsNotNull, _) => format!("{} {}", column, operator.to_sql()),
            (_, Operand::None) => format!("{} {} NULL", column, operator.to_sql()),
            (_, Operand::Single(value)) => {
                let placeholder = self.bind(value.clone());
                format!("{} {} {}", column, operator.to_sql(), placeholder)
            }
            (_, Operand::List(values)) => {
                let placeholders: Vec<String> = values.iter().map(|v| self.bind(v.clone())).collect();
                format!("{} {} ({})", column, operator.to_sql(), placeholders.join(", "))
            }
            (_, Operand::Range(min, max)) => {
                let min = self.bind(min.clone());
                let max = self.bind(max.clone());
                format!("{} BETWEEN {} AND {}", column, min, max)
            }
        }
    }

    fn bind(&mut self, value: Value) -> String {
        self.values.push(value);
        self.dialect.placeholder(self.values.len())
    }
}

fn column_sql(column: &ColumnRef) -> String {
    format!("{}.{}", column.alias, column.column)
}

/// Compile `fragment` for `dialect` in one call.
pub fn compile(dialect: &dyn Dialect, fragment: &Fragment) -> Result<CompiledFragment> {
    SqlCompiler::new(dialect).compile(fragment)
}
