use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contacts_api::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contacts_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => cli::commands::init(cli.config.clone()).await,
        Commands::Migrate => cli::commands::migrate(config).await,
        Commands::Serve { host, port, memory } => {
            cli::commands::serve(config, host, port, memory).await
        }
        Commands::Promote { email, role } => cli::commands::promote(config, &email, role).await,
        Commands::Doctor => cli::commands::doctor(config).await,
    }
}
