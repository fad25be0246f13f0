use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Target};
use fqcs_config::{AppConfig, AppConfigLoader};
use fqcs_console::app::{self, commands};
use log::LevelFilter;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const COMMAND_QUEUE: usize = 32;

/// Headless driver for the FQCS operator console.
#[derive(Debug, Parser)]
#[command(name = "fqcs-console", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read environment overrides from this file instead of `./.env`
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Development mode: canned login, no token scheduling
    #[arg(long)]
    dev: bool,

    /// Camera index to open at start-up
    #[arg(long)]
    camera: Option<u32>,

    /// Profile folder to load at start-up
    #[arg(long)]
    profiles: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if self.dev {
            config.dev = true;
        }
        if self.camera.is_some() {
            config.capture.camera_index = self.camera;
        }
        if let Some(folder) = &self.profiles {
            config.detection.config_folder = Some(folder.clone());
        }
    }
}

fn init_logger() {
    Builder::new()
        .target(Target::Stdout)
        .filter_level(LevelFilter::Warn)
        .filter_module("fqcs_console", LevelFilter::Debug)
        .filter_module("fqcs_config", LevelFilter::Info)
        .init();
}

async fn read_commands(tx: mpsc::Sender<commands::Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read stdin: {e}");
                break;
            }
        };
        match commands::parse(&line) {
            Ok(Some(command)) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let args = Args::parse();
    let mut loader = AppConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
    }
    let mut config = loader
        .load()
        .context("failed to load configuration")?
        .into_config();
    args.apply(&mut config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let result = runtime.block_on(async move {
        let console = app::build_console(&config)
            .await
            .context("failed to start console")?;

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        tokio::spawn(read_commands(tx));
        console.run(rx, |status| println!("{status}")).await;
        Ok::<_, anyhow::Error>(())
    });
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}
