use clap::Parser;
use engine::LocalBlobStore;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod cli;
mod commands;
mod error;
mod output;
mod prompt;
mod settings;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> error::Result<()> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "shoplist={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context {
        database: parse_database(&settings.database()).await?,
        blobs: LocalBlobStore::new(&settings.blobs.root),
        timezone: settings.timezone()?,
    };
    tracing::debug!(timezone = %ctx.timezone, blobs = %settings.blobs.root.display(), "settings loaded");

    match cli.command {
        cli::Command::Register(args) => commands::register(&ctx, args).await,
        cli::Command::Import(args) => commands::import(&ctx, args).await,
        cli::Command::Report(args) => commands::report(&ctx, args).await,
        cli::Command::Trend(args) => commands::trend(&ctx, args).await,
        cli::Command::Products(args) => commands::products(&ctx, args).await,
        cli::Command::RemoveProduct(args) => commands::remove_product(&ctx, args).await,
    }
}

async fn parse_database(config: &Database) -> error::Result<sea_orm::DatabaseConnection> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
