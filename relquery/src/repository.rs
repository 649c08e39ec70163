use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryResult, Statement};
use tracing::debug;

use crate::error::{QueryError, TranslateError};
use crate::filter::{Filter, FilterRequest};
use crate::query_builder::{Projection, SqlQueryBuilder};
use crate::translate::Translator;

/// Runs filter queries through any sea-orm connection.
///
/// The backend of the connection picks the SQL dialect, so one repository
/// serves Postgres pools and in-memory SQLite alike.
pub struct FilterRepository<'r> {
    builder: SqlQueryBuilder<'r>,
}

impl<'r> FilterRepository<'r> {
    pub fn new(translator: Translator<'r>) -> Self {
        Self {
            builder: SqlQueryBuilder::new(translator),
        }
    }

    fn statement<C: ConnectionTrait>(
        &self,
        db: &C,
        entity: &str,
        request: &FilterRequest,
        projection: Projection,
    ) -> Result<Statement, QueryError> {
        let backend = db.get_database_backend();
        let (sql, values) = self.builder.build_query(&backend, entity, request, projection)?;
        debug!("Executing filter query: {}", sql);
        debug!(params = ?values, "filter query parameters");
        Ok(Statement::from_sql_and_values(backend, sql, values))
    }

    /// Primary keys of the `entity` rows matching `request`.
    pub async fn find_ids<C: ConnectionTrait>(
        &self,
        db: &C,
        entity: &str,
        request: &FilterRequest,
    ) -> Result<Vec<i64>, QueryError> {
        let statement = self.statement(db, entity, request, Projection::Ids)?;
        let rows = db.query_all(statement).await?;
        let ids = rows
            .iter()
            .map(primary_key)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(entity, matched = ids.len(), "filter query finished");
        Ok(ids)
    }

    /// Matching models of sea-orm entity `E`, resolved through its table name.
    pub async fn find_all<E, C>(&self, db: &C, request: &FilterRequest) -> Result<Vec<E::Model>, QueryError>
    where
        E: EntityTrait,
        C: ConnectionTrait,
    {
        let entity = self.entity_for::<E>()?;
        let statement = self.statement(db, entity, request, Projection::Rows)?;
        let models = E::find().from_raw_sql(statement).all(db).await?;
        debug!(entity, matched = models.len(), "filter query finished");
        Ok(models)
    }

    pub async fn find_one<E, C>(&self, db: &C, filter: Filter) -> Result<Option<E::Model>, QueryError>
    where
        E: EntityTrait,
        C: ConnectionTrait,
    {
        let entity = self.entity_for::<E>()?;
        let request = FilterRequest::new(filter).limit(1);
        let statement = self.statement(db, entity, &request, Projection::Rows)?;
        Ok(E::find().from_raw_sql(statement).one(db).await?)
    }

    pub async fn find_one_or_fail<E, C>(&self, db: &C, filter: Filter) -> Result<E::Model, QueryError>
    where
        E: EntityTrait,
        C: ConnectionTrait,
    {
        let entity = self.entity_for::<E>()?;
        self.find_one::<E, C>(db, filter)
            .await?
            .ok_or_else(|| QueryError::NotFound {
                entity: entity.to_string(),
            })
    }

    /// Number of `entity` rows matching `filter`; no filter counts every row.
    pub async fn count<C: ConnectionTrait>(
        &self,
        db: &C,
        entity: &str,
        filter: Option<Filter>,
    ) -> Result<u64, QueryError> {
        let request = FilterRequest {
            filter,
            ..FilterRequest::default()
        };
        let statement = self.statement(db, entity, &request, Projection::Count)?;
        let count = match db.query_one(statement).await? {
            Some(row) => row.try_get::<i64>("", "count")?,
            None => 0,
        };
        Ok(count.max(0) as u64)
    }

    fn entity_for<E: EntityTrait>(&self) -> Result<&'r str, TranslateError> {
        let table_name = E::default().table_name().to_string();
        self.builder
            .translator()
            .registry()
            .get_by_table(&table_name)
            .map(|(entity, _)| entity)
            .ok_or(TranslateError::UnknownEntity(table_name))
    }
}

// Postgres keeps `INTEGER`/`SERIAL` keys as INT4, which does not decode as i64.
fn primary_key(row: &QueryResult) -> Result<i64, DbErr> {
    row.try_get_by_index::<i64>(0)
        .or_else(|_| row.try_get_by_index::<i32>(0).map(i64::from))
}
