use std::{error::Error, fs::File, path::PathBuf, time::Duration};

use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, ExpenseBook, Month, category_names, subcategories_of};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use telegram_bot::{TeloxideTransport, bot_status, register_webhook};

mod export;

#[derive(Parser, Debug)]
#[command(name = "expense_admin")]
#[command(about = "Admin utilities for the expense bot (users, categories, webhook, export)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./expenses.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Category(Category),
    Webhook(Webhook),
    /// Writes one month of expenses to a CSV file.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Allows a Telegram user to talk to the bot.
    Add(UserAddArgs),
    Remove(UserRemoveArgs),
    List,
}

#[derive(Args, Debug)]
struct UserAddArgs {
    #[arg(long)]
    telegram_id: i64,
    #[arg(long)]
    label: Option<String>,
}

#[derive(Args, Debug)]
struct UserRemoveArgs {
    #[arg(long)]
    telegram_id: i64,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Appends a row to the category sheet.
    Add(CategoryAddArgs),
    List,
}

#[derive(Args, Debug)]
struct CategoryAddArgs {
    /// Blank continues the category of the row above.
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    subcategory: String,
}

#[derive(Args, Debug)]
struct Webhook {
    /// Bot token (also read from `EXPENSE__TELEGRAM__TOKEN`).
    #[arg(long, env = "EXPENSE__TELEGRAM__TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: WebhookCommand,
}

#[derive(Subcommand, Debug)]
enum WebhookCommand {
    Set(WebhookSetArgs),
    Info,
}

#[derive(Args, Debug)]
struct WebhookSetArgs {
    #[arg(long)]
    url: String,
    #[arg(long)]
    secret: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Three letter month name, e.g. `Mar`.
    #[arg(long)]
    month: String,
    /// Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    out: PathBuf,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn engine(database_url: &str) -> Result<Engine, Box<dyn Error + Send + Sync>> {
    let db = connect_db(database_url).await?;
    Ok(Engine::builder().database(db).build().await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter("expense_admin=info,telegram_bot=info")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::User(User { command }) => {
            let engine = engine(&cli.database_url).await?;
            match command {
                UserCommand::Add(args) => {
                    engine.authorize_user(args.telegram_id, args.label).await?;
                    tracing::info!("authorized telegram user {}", args.telegram_id);
                    println!("authorized user: {}", args.telegram_id);
                }
                UserCommand::Remove(args) => {
                    if !engine.revoke_user(args.telegram_id).await? {
                        tracing::warn!("telegram user {} was not authorized", args.telegram_id);
                        eprintln!("user not found: {}", args.telegram_id);
                        std::process::exit(1);
                    }
                    tracing::info!("revoked telegram user {}", args.telegram_id);
                    println!("revoked user: {}", args.telegram_id);
                }
                UserCommand::List => {
                    for user in engine.authorized_users().await? {
                        match user.label {
                            Some(label) => println!("{}\t{label}", user.telegram_id),
                            None => println!("{}", user.telegram_id),
                        }
                    }
                }
            }
        }
        Command::Category(Category { command }) => {
            let engine = engine(&cli.database_url).await?;
            match command {
                CategoryCommand::Add(args) => {
                    engine
                        .add_category_row(&args.category, &args.subcategory)
                        .await?;
                    tracing::info!("category row {} / {} added", args.category, args.subcategory);
                    println!("added category row: {} / {}", args.category, args.subcategory);
                }
                CategoryCommand::List => {
                    let rows = engine.categories().await?;
                    for category in category_names(&rows) {
                        println!("{category}");
                        for subcategory in subcategories_of(&rows, &category) {
                            println!("  {subcategory}");
                        }
                    }
                }
            }
        }
        Command::Webhook(Webhook {
            token,
            timeout_secs,
            command,
        }) => {
            let transport = TeloxideTransport::new(&token, Duration::from_secs(timeout_secs))?;
            match command {
                WebhookCommand::Set(args) => {
                    register_webhook(&transport, &args.url, args.secret.as_deref()).await?;
                    tracing::info!(
                        "webhook registered ({})",
                        if args.secret.is_some() { "with secret" } else { "no secret" }
                    );
                    println!("webhook set: {}", args.url);
                }
                WebhookCommand::Info => {
                    let status = bot_status(&transport).await?;
                    println!("bot: @{} ({})", status.username, status.id);
                    println!(
                        "webhook: {}",
                        status.webhook_url.as_deref().unwrap_or("<none>")
                    );
                    println!("pending updates: {}", status.pending_updates);
                    if let Some(error) = status.last_error {
                        println!("last error: {error}");
                    }
                }
            }
        }
        Command::Export(args) => {
            let month: Month = args.month.parse()?;
            let year = args.year.unwrap_or_else(|| chrono::Local::now().year());
            let engine = engine(&cli.database_url).await?;
            let expenses = engine.month_expenses(year, month).await?;
            tracing::debug!("{} expenses found for {month} {year}", expenses.len());
            let written = export::write_csv(&expenses, File::create(&args.out)?)?;
            tracing::info!("export of {month} {year} written to {}", args.out.display());
            println!(
                "exported {written} expenses of {month} {year} to {}",
                args.out.display()
            );
        }
    }

    Ok(())
}
