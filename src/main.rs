use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use islander::app::AppContext;
use islander::cli::{commands, Cli, Commands, CookieAction};
use islander::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(&config)?;

    match cli.command {
        Commands::Forums => {
            commands::list_forums(&ctx).await?;
        }
        Commands::Channels => {
            commands::list_channels(&ctx).await?;
        }
        Commands::Cdn => {
            commands::show_cdn(&ctx).await?;
        }
        Commands::Timeline { channel, pages } => {
            commands::show_timeline(&ctx, channel, pages).await?;
        }
        Commands::Cookie { action } => match action {
            CookieAction::List => commands::list_cookies(&ctx)?,
            CookieAction::Add { name, token } => commands::add_cookie(&ctx, &name, &token)?,
            CookieAction::Import { payload } => commands::import_cookie(&ctx, &payload)?,
            CookieAction::Use { name } => commands::use_cookie(&ctx, &name)?,
            CookieAction::Clear => commands::clear_cookie(&ctx)?,
            CookieAction::Remove { name } => commands::remove_cookie(&ctx, &name)?,
        },
    }

    Ok(())
}
