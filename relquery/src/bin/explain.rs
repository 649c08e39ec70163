use anyhow::Context;
use sea_orm::DbBackend;

use relquery::dialect::Dialect;
use relquery::executable_utils::{connect, initialize_executable, load_registry};
use relquery::filter::{Filter, FilterRequest};
use relquery::query_builder::{Projection, SqlQueryBuilder};
use relquery::repository::FilterRepository;
use relquery::translate::Translator;

fn backend_for(url: &str) -> anyhow::Result<DbBackend> {
    [DbBackend::Postgres, DbBackend::MySql, DbBackend::Sqlite]
        .into_iter()
        .find(|backend| backend.is_prefix_of(url))
        .ok_or_else(|| anyhow::anyhow!("unsupported database URL scheme: {url}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (args, config) = initialize_executable()?;
    let registry = load_registry(&config, &args.config)?;
    let translator = Translator::from_config(&registry, &config.translator);

    let document: serde_json::Value =
        serde_json::from_str(&args.filter).context("filter is not valid JSON")?;
    let filter = Filter::from_json(&registry, &args.entity, &document)?;
    let request = FilterRequest::new(filter);

    let backend = backend_for(&config.common.database_url)?;
    let (sql, values) = SqlQueryBuilder::new(translator).build_query(&backend, &args.entity, &request, Projection::Ids)?;
    println!("-- {} ({:?} policy)", backend.name(), translator.policy());
    println!("{sql}");
    for (index, value) in values.iter().enumerate() {
        println!("-- ${} = {:?}", index + 1, value);
    }

    if args.execute {
        let db = connect(&config).await?;
        let ids = FilterRepository::new(translator)
            .find_ids(&db, &args.entity, &request)
            .await?;
        println!("{} matching {}: {:?}", ids.len(), args.entity, ids);
    }

    Ok(())
}
