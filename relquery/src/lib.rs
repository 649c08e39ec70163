pub mod compile;
pub mod dialect;
pub mod error;
pub mod executable_utils;
pub mod filter;
pub mod model;
pub mod plan;
pub mod query_builder;
pub mod repository;
pub mod translate;

pub use common::config::EveryPolicy;
pub use compile::{CompiledFragment, SqlCompiler};
pub use dialect::Dialect;
pub use error::{MetadataError, QueryError, TranslateError};
pub use filter::{Filter, FilterRequest, Quantifier};
pub use model::{ModelRegistry, Relatable, Relation, Table};
pub use plan::Fragment;
pub use query_builder::{Projection, SqlQueryBuilder};
pub use repository::FilterRepository;
pub use translate::Translator;
