// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use songsalvage_application::{default_download_dir, list_downloads, AppState};
use songsalvage_config::load as load_config;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Recover downloaded music: decrypt, transcode, and trace each track back to its catalog page.
#[derive(Debug, Parser)]
#[command(name = "songsalvage", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true, env = "SONGSALVAGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List music files in the client's download directory.
    List {
        /// Directory to list instead of the configured download directory.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Decrypt `.mflac`/`.mgg` files into `.flac`/`.ogg`.
    Decrypt {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Convert `.ogg` files into `.flac` with ffmpeg.
    Convert {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Do not record conversions in the conversion log.
        #[arg(long)]
        no_log: bool,
    },
    /// Print the catalog URL guessed for each file name.
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    let state = AppState::new(config);
    state.on_start();

    match cli.command {
        Command::List { dir } => {
            let dir = match dir.or_else(|| state.config.library.download_dir.clone()) {
                Some(dir) => dir,
                None => default_download_dir()?,
            };
            match list_downloads(&dir) {
                Ok(files) => {
                    for (index, file) in files.iter().enumerate() {
                        println!("{:4}. {}", index + 1, file.display());
                    }
                }
                Err(e) => {
                    error!(target: "cli", "{}", e);
                    return Err(e.into());
                }
            }
        }
        Command::Decrypt { input, output } => {
            let summary = state.decrypt_batch()?.run(&input, &output).await?;
            info!(target: "cli", ?summary, "decrypt finished");
        }
        Command::Convert {
            input,
            output,
            no_log,
        } => {
            let summary = state
                .transcode_batch()?
                .run(&input, &output, !no_log)
                .await?;
            info!(target: "cli", ?summary, "convert finished");
        }
        Command::Resolve { names } => {
            let resolver = state.resolver()?;
            for name in names {
                let url = resolver.guess_source_url(&name).await;
                println!("{}\t{}", name, url.as_deref().unwrap_or("-"));
            }
        }
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_level(true);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
