pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "islander")]
#[command(about = "A command-line client for the island imageboard", long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List forum groups and their forums
    Forums,
    /// List timeline channels
    Channels,
    /// Show the CDN endpoints and the one selected for images
    Cdn,
    /// Print threads from a timeline
    Timeline {
        /// Timeline id (defaults to the first one the board lists)
        #[arg(short, long)]
        channel: Option<i64>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Manage posting cookies
    Cookie {
        #[command(subcommand)]
        action: CookieAction,
    },
}

#[derive(Subcommand)]
pub enum CookieAction {
    /// List saved cookies
    List,
    /// Save a cookie under a name
    Add {
        /// Name to save the cookie under
        name: String,
        /// The userhash value
        token: String,
    },
    /// Import a cookie from the JSON payload of the board's QR code
    Import {
        /// Payload such as {"cookie":"...","name":"..."}
        payload: String,
    },
    /// Use a saved cookie for requests
    Use {
        name: String,
    },
    /// Stop sending a cookie
    Clear,
    /// Delete a saved cookie
    Remove {
        name: String,
    },
}
