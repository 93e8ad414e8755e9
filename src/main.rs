//! Binary entrypoint for the sysrpg CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and create the data directory
//! - `play` - run the console transport against the configured store
//! - `status` - list stored players with level, rank and position
//!
//! See the library crate docs for module-level details: `sysrpg::`.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use sysrpg::config::Config;
use sysrpg::console::{ConsolePresenter, ConsoleSession, LineOutcome, HELP_TEXT};
use sysrpg::game::{
    load_catalog, rank_info, standard_world, title_for, Dispatcher, PlayerStore, SledStore,
    SledStoreBuilder,
};

#[derive(Parser)]
#[command(name = "sysrpg")]
#[command(about = "Player progression and world-state engine for a chat RPG")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Play from this terminal; `as <id>` picks the acting player
    Play,
    /// List stored players
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            info!("Initializing new sysrpg configuration");
            Config::create_default(&cli.config).await?;
            let config = Config::default();
            tokio::fs::create_dir_all(&config.storage.data_dir)
                .await
                .with_context(|| format!("creating {}", config.storage.data_dir))?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Play => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting sysrpg v{}", env!("CARGO_PKG_VERSION"));
            play(config).await?;
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let store = open_store(&config)?;
            show_status(&store)?;
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<SledStore> {
    let path = config.storage.db_path();
    SledStoreBuilder::new(&path)
        .open()
        .with_context(|| format!("opening player store at {}", path.display()))
}

async fn play(config: Config) -> Result<()> {
    let store = open_store(&config)?;
    let catalog = load_catalog(config.game.quests_file.as_deref().map(Path::new))
        .context("loading quest catalog")?;
    info!("{} quests in catalog", catalog.len());
    let dispatcher = Dispatcher::new(
        Arc::new(store),
        standard_world(&config.game),
        catalog,
        config.game.clone(),
    )
    .context("building the world")?
    .with_presenter(Arc::new(ConsolePresenter::stdout()));
    let mut session = ConsoleSession::new(Arc::new(dispatcher));

    println!("{}", HELP_TEXT);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match session.handle_line(&line) {
            Ok(LineOutcome::Quit) => break,
            Ok(LineOutcome::Help) => println!("{}", HELP_TEXT),
            Ok(LineOutcome::Switched(id)) => println!("(now acting as #{})", id),
            Ok(LineOutcome::Empty) | Ok(LineOutcome::Applied(_)) => {}
            Err(e) if e.is_store_failure() => {
                error!("store failure: {}", e);
                println!("error: {} (nothing was applied)", e);
            }
            Err(e) => println!("error: {}", e),
        }
    }
    info!("console session closed");
    Ok(())
}

fn show_status(store: &SledStore) -> Result<()> {
    let ids = store.list_player_ids()?;
    println!("Players: {}", ids.len());
    for id in ids {
        let player = store.get_player(id)?;
        let rank = rank_info(&player);
        println!(
            "#{:<6} {:<20} Lv {:<3} {:<24} {:<10} at {}",
            player.id,
            player.display_name,
            player.level,
            rank.name,
            title_for(player.rank_index),
            player.position
        );
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config.as_ref().and_then(|cfg| cfg.logging.file.clone());
    let opened = log_file.and_then(|file| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .ok()
    });
    match opened {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only when someone is watching it
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty && record.level() <= log::Level::Warn {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
