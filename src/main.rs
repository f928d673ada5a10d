use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use giflist::app::AppContext;
use giflist::cli::{commands, Cli, Commands, SettingsAction};
use giflist::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Fetch {
            feed,
            sort,
            page_size,
            pages,
        } => {
            commands::fetch_feed(&ctx, feed, sort, page_size, pages).await?;
        }
        Commands::Browse => {
            commands::browse(&ctx).await?;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                commands::show_settings(&ctx).await?;
            }
            SettingsAction::Set {
                feed,
                sort,
                page_size,
            } => {
                commands::set_settings(&ctx, feed, sort, page_size).await?;
            }
        },
    }

    Ok(())
}
