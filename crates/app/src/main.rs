use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;
use telegram_bot::{ExpenseBot, TeloxideTransport};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expense_bot={level},telegram_bot={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let transport = TeloxideTransport::new(&settings.telegram.token, settings.telegram.timeout())?;
    let bot = ExpenseBot::builder()
        .config(settings.bot_config()?)
        .engine(engine)
        .transport(Arc::new(transport))
        .build()?;

    server::run(bot, settings.server_config()).await;
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
