//! panlog - sync and browse appliance admin logs from the terminal
//!
//! Pulls configuration-audit and system-event logs from a management
//! appliance into a local cache, then searches and displays them offline.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use panlog_store::LogStore;

use crate::commands::{App, Category, View};
use crate::config::Registry;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "panlog")]
#[command(author, version, about = "Appliance admin log sync and viewer")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PANLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Cache directory for downloaded logs
    #[arg(long, env = "PANLOG_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Accept invalid TLS certificates (self-signed appliances)
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to an appliance and save it as the active profile
    Login {
        /// Appliance host (bare hostname/IP or full URL)
        host: String,

        /// Admin account name
        #[arg(short, long)]
        user: String,

        /// Password; prompted for when omitted
        #[arg(short, long, env = "PANLOG_PASSWORD")]
        password: Option<String>,
    },

    /// Fetch the most recent default window of entries
    Refresh {
        /// Log category to refresh
        #[arg(long, value_enum, default_value = "all")]
        category: Category,
    },

    /// Sync up to COUNT entries per category into the cache
    Sync {
        /// Entries to request per category
        #[arg(long, default_value_t = 5000)]
        count: u32,

        /// Log category to sync
        #[arg(long, value_enum, default_value = "all")]
        category: Category,
    },

    /// Display a grouped view of the cached logs
    Show {
        /// Which view to display
        #[arg(value_enum, default_value = "config")]
        view: View,

        /// Field to group the config view by (e.g. "Admin", "Command Type")
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Search the cached config log across every field
    Search {
        /// Substring to look for (case-insensitive)
        term: String,

        /// Also write the matches to a text file in the cache directory
        #[arg(long)]
        export: bool,
    },

    /// List, switch, or remove saved profiles
    Profiles {
        #[command(subcommand)]
        action: Option<ProfilesAction>,
    },

    /// Show or change persistent display options
    Options {
        /// Hide appliance-generated admins from grouped views
        #[arg(long)]
        hide_appliance_admins: Option<bool>,
    },

    /// Delete cached log files
    ClearCache {
        /// Clear every profile's cache, not just the active one
        #[arg(long)]
        all: bool,
    },

    /// Forget the active profile's token and delete its cached logs
    Logout,
}

#[derive(Subcommand)]
enum ProfilesAction {
    /// List saved profiles (default)
    List,

    /// Make another saved profile the active one
    Switch {
        /// Profile host
        host: String,
    },

    /// Remove a saved profile and its cached logs
    Remove {
        /// Profile host
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let registry_path = match &cli.config {
        Some(path) => path.clone(),
        None => Registry::config_path()?,
    };
    let registry = Registry::load_from(&registry_path)?;

    let cache_root = match &cli.cache_dir {
        Some(path) => path.clone(),
        None => LogStore::default_root()?,
    };

    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);
    let mut app = App {
        registry,
        registry_path,
        cache_root,
        insecure: cli.insecure,
    };

    match &cli.command {
        Commands::Login {
            host,
            user,
            password,
        } => {
            commands::login(&mut app, host, user, password.clone(), &ctx).await?;
        }

        Commands::Refresh { category } => {
            commands::refresh(&app, *category, &ctx).await?;
        }

        Commands::Sync { count, category } => {
            commands::sync(&app, *count, *category, &ctx).await?;
        }

        Commands::Show { view, group } => {
            commands::show(&app, *view, group.as_deref(), &ctx)?;
        }

        Commands::Search { term, export } => {
            commands::search(&app, term, *export, &ctx)?;
        }

        Commands::Profiles { action } => match action {
            None | Some(ProfilesAction::List) => commands::profiles_list(&app, &ctx),
            Some(ProfilesAction::Switch { host }) => {
                commands::profiles_switch(&mut app, host, &ctx)?;
            }
            Some(ProfilesAction::Remove { host }) => {
                commands::profiles_remove(&mut app, host, &ctx)?;
            }
        },

        Commands::Options {
            hide_appliance_admins,
        } => {
            commands::options(&mut app, *hide_appliance_admins, &ctx)?;
        }

        Commands::ClearCache { all } => {
            commands::clear_cache(&app, *all, &ctx)?;
        }

        Commands::Logout => {
            commands::logout(&mut app, &ctx)?;
        }
    }

    Ok(())
}
