use anyhow::Context;
use bookstore_kernel::settings::{Environment, Settings};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookstore", version, about = "Book catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve(EnvArg),
    /// Create the tables if they do not exist, then exit
    InitDb(EnvArg),
    /// Print the resolved configuration as JSON
    Config(EnvArg),
}

#[derive(Args)]
struct EnvArg {
    /// Environment to load (local, test, staging, production); defaults to BOOKSTORE_ENV
    #[arg(long)]
    env: Option<String>,
}

impl EnvArg {
    fn settings(&self) -> anyhow::Result<Settings> {
        let settings = match &self.env {
            Some(env) => Settings::load_for(env.parse::<Environment>()?),
            None => Settings::load(),
        };
        settings.with_context(|| "failed to load bookstore settings")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(env) => {
            let settings = env.settings()?;
            bookstore_telemetry::init(&settings.telemetry)?;
            bookstore_app::serve(settings).await
        }
        Command::InitDb(env) => {
            let settings = env.settings()?;
            bookstore_telemetry::init(&settings.telemetry)?;
            let registry = bookstore_app::build_registry();
            let db = bookstore_app::prepare_database(&settings, &registry).await?;
            db.close().await;
            tracing::info!(db = %settings.database.url, "schema applied");
            Ok(())
        }
        Command::Config(env) => {
            let settings = env.settings()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
