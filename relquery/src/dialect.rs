use sea_orm::DbBackend;

/// The parts of SQL that differ between the backends a fragment is compiled for.
pub trait Dialect {
    fn name(&self) -> &'static str;

    /// Placeholder for the `index`-th bound value, counted from 1.
    fn placeholder(&self, index: usize) -> String;

    fn supports_correlated_subqueries(&self) -> bool {
        true
    }

    /// Whether `OFFSET` is only accepted after a `LIMIT`.
    fn offset_requires_limit(&self) -> bool {
        false
    }
}

impl Dialect for DbBackend {
    fn name(&self) -> &'static str {
        match self {
            DbBackend::Postgres => "postgres",
            DbBackend::Sqlite => "sqlite",
            DbBackend::MySql => "mysql",
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self {
            DbBackend::Postgres => format!("${}", index),
            DbBackend::Sqlite | DbBackend::MySql => "?".to_string(),
        }
    }

    fn offset_requires_limit(&self) -> bool {
        matches!(self, DbBackend::Sqlite | DbBackend::MySql)
    }
}
