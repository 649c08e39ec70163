use clap::Parser;
use std::path::Path;
use common::config::Config;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing_subscriber::EnvFilter;

use crate::error::MetadataError;
use crate::model::ModelRegistry;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "relquery/config/relquery.yaml")]
    pub config: String,

    /// Entity the filter is evaluated against
    #[arg(short, long)]
    pub entity: String,

    /// Filter document, e.g. '{"books": {"$every": {"title": "title"}}}'
    #[arg(short, long)]
    pub filter: String,

    /// Run the query against the configured database and print matching ids
    #[arg(long)]
    pub execute: bool,
}

/// Parse arguments, load `.env` and the config file, and set up tracing.
pub fn initialize_executable() -> anyhow::Result<(Args, Config)> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = Config::load(&args.config)?.with_env_overrides();

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.translator.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(config = %args.config, "loaded configuration");
    tracing::debug!(?config, "configuration");

    Ok((args, config))
}

/// Load the entity schema. A relative `schema_path` is taken from the config
/// file's directory; without one, `schema.yaml` next to the config is used.
pub fn load_registry(config: &Config, config_path: impl AsRef<Path>) -> Result<ModelRegistry, MetadataError> {
    let base = config_path.as_ref().parent().unwrap_or_else(|| Path::new("."));
    let path = base.join(config.translator.schema_path.as_deref().unwrap_or("schema.yaml"));
    tracing::info!(schema = %path.display(), "loading entity schema");
    ModelRegistry::load(path)
}

pub async fn connect(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.common.database_url.clone());
    options.sqlx_logging(false);
    if config.common.database_url.starts_with("sqlite::memory:") {
        // each pooled connection would otherwise see its own empty database
        options.min_connections(1).max_connections(1);
    }
    Database::connect(options).await
}
