use std::sync::Arc;

use anyhow::{Context, bail};
use mediaserve::config::Config;
use mediaserve::db::{Database, SchemaStatus};
use mediaserve::http::router::Router;
use mediaserve::server;
use mediaserve::upnp::DescriptionFiles;

fn open_database(cfg: &Config) -> anyhow::Result<Database> {
    std::fs::create_dir_all(&cfg.db_dir)
        .with_context(|| format!("creating {}", cfg.db_dir.display()))?;

    let db = Database::open(&cfg.db_file())?;
    match db.schema_status()? {
        SchemaStatus::Current => {}
        SchemaStatus::NeedsInit => db.init_schema()?,
        SchemaStatus::NeedsUpgrade(version) => {
            tracing::warn!(version, "Database schema is too old, rebuilding");
            db.clear()?;
            db.init_schema()?;
        }
        SchemaStatus::Unsupported(version) => {
            bail!("database schema version {version} is newer than this build supports")
        }
    }
    Ok(db)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load();
    let db = Arc::new(open_database(&cfg)?);

    let router = Router::new(db)
        .with_descriptions(Arc::new(DescriptionFiles::new(cfg.descriptions_dir.clone())));

    tokio::select! {
        res = server::listener::run(&cfg, Arc::new(router)) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
