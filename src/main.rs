// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use mini_gallery::app::AppModel;
use mini_gallery::backends::camera::{CameraBackendManager, CameraBackendType, Facing};
use mini_gallery::config::Config;
use mini_gallery::storage::{FileStore, KeyValueStore, MemoryStore, PhotoStore};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

mod cli;

#[derive(Parser)]
#[command(name = "mini-gallery")]
#[command(about = "Take photos with a front or rear camera and keep them in a local gallery")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera backend (v4l2 or virtual)
    #[arg(long, global = true)]
    backend: Option<CameraBackendType>,

    /// Directory holding the persisted photo list
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Keep photos in memory only for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the terminal gallery (default)
    Terminal,

    /// List available cameras
    List,

    /// List stored photos
    Photos,

    /// Take a photo and add it to the gallery
    Photo {
        /// Camera to use (front or rear)
        #[arg(short, long)]
        facing: Option<Facing>,
    },

    /// Delete a stored photo
    Delete {
        /// Photo index (from 'mini-gallery photos')
        index: usize,
    },

    /// Write a stored photo to an image file
    Export {
        /// Photo index (from 'mini-gallery photos')
        index: usize,

        /// Output file or directory (default: ~/Pictures/mini-gallery/IMG_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let tui = matches!(cli.command, None | Some(Commands::Terminal));
    init_logging(tui);

    let mut config = Config::load();
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = Some(dir);
    }

    let store = open_store(&config, cli.ephemeral)?;

    match cli.command {
        None | Some(Commands::Terminal) => run_terminal(config, store),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photos) => cli::list_photos(&store),
        Some(Commands::Photo { facing }) => {
            let runtime = tokio::runtime::Runtime::new()?;
            cli::take_photo(config, store, facing, &runtime)
        }
        Some(Commands::Delete { index }) => cli::delete_photo(store, index),
        Some(Commands::Export { index, output }) => {
            let runtime = tokio::runtime::Runtime::new()?;
            cli::export_photo(&store, index, output, &runtime)
        }
    }
}

/// Initialize logging
///
/// Set the RUST_LOG environment variable to control the log level, e.g.
/// `RUST_LOG=debug` or `RUST_LOG=mini_gallery=info`. While the terminal UI
/// owns the screen, logs go to a file in the data directory.
fn init_logging(tui: bool) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    let log_file = if tui {
        Config::log_path().and_then(|path| {
            std::fs::create_dir_all(path.parent()?).ok()?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()
        })
    } else {
        None
    };

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .init(),
        // Logging to the terminal would corrupt the UI
        None if tui => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::sink)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(true)
            .with_level(true)
            .init(),
    }
}

fn open_store(config: &Config, ephemeral: bool) -> Result<PhotoStore, Box<dyn std::error::Error>> {
    let backing: Box<dyn KeyValueStore> = match config.storage_dir() {
        Some(dir) if !ephemeral => {
            let store = FileStore::open(dir)?;
            info!(dir = %store.dir().display(), "Using file store");
            Box::new(store)
        }
        Some(_) => Box::new(MemoryStore::new()),
        None => {
            warn!("No data directory, photos will not persist");
            Box::new(MemoryStore::new())
        }
    };
    Ok(PhotoStore::load(backing)?)
}

fn run_terminal(config: Config, store: PhotoStore) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let manager = CameraBackendManager::new(&config);
    let mut app = AppModel::new(config, manager, store);
    mini_gallery::terminal::run(&mut app, &runtime)
}
