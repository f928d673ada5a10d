pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::SortOrder;

#[derive(Parser)]
#[command(name = "giflist")]
#[command(about = "Browse GIF and video posts from subreddit feeds", long_about = None)]
pub struct Cli {
    /// Path to the settings database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one or more pages of a feed and print the playable posts
    Fetch {
        /// Feed (subreddit) name; defaults to the saved one
        feed: Option<String>,

        /// Sort order
        #[arg(short, long, value_enum)]
        sort: Option<SortOrder>,

        /// Playable posts per page
        #[arg(short = 'n', long)]
        page_size: Option<usize>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },
    /// Interactive browser: type a feed name to switch feeds
    Browse,
    /// Show or change saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings
    Show,
    /// Update saved settings
    Set {
        /// Feed (subreddit) name
        #[arg(long)]
        feed: Option<String>,

        /// Sort order
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,

        /// Playable posts per page
        #[arg(long)]
        page_size: Option<usize>,
    },
}
