// src/main.rs

//! wallabag-search: sync and search saved wallabag articles from the CLI.

use clap::{Parser, Subcommand};
use env_logger::Env;

use wallabag_search::config::{Config, TomlConfigStore};
use wallabag_search::error::Result;
use wallabag_search::plugin::WallabagPlugin;

#[derive(Parser, Debug)]
#[command(
    name = "wallabag-search",
    version,
    about = "Sync and search articles saved in a wallabag instance"
)]

/// CLI Arguments
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

/// CLI Commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch all articles once and rebuild the index
    Sync,
    /// Sync, then search the index for a term
    Search { term: String },
    /// Run the background refresh loop until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);
    let store = TomlConfigStore::new(&cli.config);
    let mut plugin = WallabagPlugin::new(config, Box::new(store))?;

    match cli.command {
        Command::Sync => {
            let count = plugin.rebuild_once().await?;
            println!("Indexed {count} articles");
        }
        Command::Search { term } => {
            plugin.rebuild_once().await?;
            let results = plugin.handle_query(&term);
            if results.is_empty() {
                println!("No articles match {term:?}");
            }
            for item in results {
                println!("{}\n    {}", item.text, item.subtext);
            }
        }
        Command::Watch => {
            plugin.load();
            log::info!("Watching; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            plugin.unload().await;
        }
    }

    Ok(())
}
