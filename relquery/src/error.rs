use thiserror::Error;

/// Raised while turning a filter into a query fragment, before anything runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("invalid relationship `{relation}` on entity `{entity}`: {reason}")]
    InvalidRelationship {
        entity: String,
        relation: String,
        reason: String,
    },

    #[error("invalid predicate on entity `{entity}`: {reason}")]
    InvalidPredicate { entity: String, reason: String },

    #[error("backend `{backend}` cannot evaluate correlated subqueries")]
    UnsupportedBackend { backend: String },

    #[error("entity `{0}` is not registered")]
    UnknownEntity(String),
}

impl TranslateError {
    pub(crate) fn relationship(
        entity: impl Into<String>,
        relation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRelationship {
            entity: entity.into(),
            relation: relation.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn predicate(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPredicate {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

/// Raised when entity metadata is registered or loaded.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("`{0}` is not a valid SQL identifier")]
    InvalidIdentifier(String),

    #[error("alias `{0}` is reserved for generated subquery aliases")]
    ReservedAlias(String),

    #[error("relation `{relation}` on `{entity}` targets unregistered entity `{target}`")]
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("relation `{relation}` on `{entity}` uses foreign key `{foreign_key}` which `{holder}` does not declare")]
    UnknownForeignKey {
        entity: String,
        relation: String,
        foreign_key: String,
        holder: String,
    },

    #[error("relation `{relation}` on `{entity}` sets null on delete but its foreign key is not nullable")]
    NullableMismatch { entity: String, relation: String },

    #[error("entity `{entity}` has no primary key field `{primary_key}`")]
    UnknownPrimaryKey { entity: String, primary_key: String },

    #[error("failed to load schema from {path}: {reason}")]
    Load { path: String, reason: String },
}

/// Raised by the repository; keeps malformed queries apart from empty results.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("no `{entity}` matched the filter")]
    NotFound { entity: String },
}

pub type Result<T, E = TranslateError> = std::result::Result<T, E>;
