use sea_orm::Value;
use tracing::debug;

use crate::compile::SqlCompiler;
use crate::dialect::Dialect;
use crate::error::{Result, TranslateError};
use crate::filter::{FilterRequest, SortDirection, SortOrder};
use crate::model::Table;
use crate::plan::Fragment;
use crate::translate::Translator;

/// What the top-level `SELECT` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The root entity's primary key.
    Ids,
    /// Every column of the root entity.
    Rows,
    /// A single `count` column. Sort, limit and offset are ignored.
    Count,
}

/// Builds full `SELECT` statements over one root entity from a [`FilterRequest`].
pub struct SqlQueryBuilder<'r> {
    translator: Translator<'r>,
}

impl<'r> SqlQueryBuilder<'r> {
    pub fn new(translator: Translator<'r>) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &Translator<'r> {
        &self.translator
    }

    /// Build SQL and its bound values for `entity` using `dialect` placeholders.
    pub fn build_query(
        &self,
        dialect: &dyn Dialect,
        entity: &str,
        filter_request: &FilterRequest,
        projection: Projection,
    ) -> Result<(String, Vec<Value>)> {
        let table = self
            .translator
            .registry()
            .get_model(entity)
            .ok_or_else(|| TranslateError::UnknownEntity(entity.to_string()))?;

        let select = match projection {
            Projection::Ids => format!("{}.{}", table.alias, table.primary_key),
            Projection::Rows => format!("{}.*", table.alias),
            Projection::Count => "COUNT(*) AS count".to_string(),
        };
        let mut final_query = format!("SELECT {} FROM {} {}", select, table.name, table.alias);
        let mut values = Vec::new();

        if let Some(filter) = &filter_request.filter {
            let fragment = self.translator.translate(entity, filter)?;
            if fragment != Fragment::True {
                let compiled = SqlCompiler::new(dialect).compile(&fragment)?;
                final_query = format!("{} WHERE {}", final_query, compiled.sql);
                values = compiled.values;
            }
        }

        if projection != Projection::Count {
            let order_by = Self::build_order_by(entity, table, &filter_request.sort)?;
            if !order_by.is_empty() {
                final_query = format!("{} {}", final_query, order_by);
            }

            match (filter_request.limit, filter_request.offset) {
                (Some(limit), _) => final_query = format!("{} LIMIT {}", final_query, limit),
                (None, Some(_)) if dialect.offset_requires_limit() => {
                    final_query = format!("{} LIMIT {}", final_query, i64::MAX)
                }
                (None, _) => {}
            }
            if let Some(offset) = filter_request.offset {
                final_query = format!("{} OFFSET {}", final_query, offset);
            }
        }

        debug!(entity, backend = dialect.name(), sql = %final_query, params = values.len(), "built filter query");
        Ok((final_query, values))
    }

    pub fn build_order_by(entity: &str, table: &Table, sorts: &[SortOrder]) -> Result<String> {
        if sorts.is_empty() {
            return Ok(String::new());
        }

        let sort_clauses = sorts
            .iter()
            .map(|sort| {
                let field = table.field(&sort.column).ok_or_else(|| {
                    TranslateError::predicate(entity, format!("cannot sort by unknown field `{}`", sort.column))
                })?;
                let direction = match sort.direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                Ok(format!("{}.{} {}", table.alias, field.name, direction))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(format!("ORDER BY {}", sort_clauses.join(", ")))
    }
}
