use std::{io, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::*;

mod aggregate;
mod app;
mod config;
mod console;
mod entities;
mod error;
mod gateway;
mod persistence;
mod records;
mod reports;
mod store;

use crate::{
    app::RecordKeepApp, config::AppConfig, console::Console, persistence::FilePersistence,
};

/// Order and school record manager working on CSV/JSON files
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Directory holding the data files, overrides the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    app: AppKind,
}

#[derive(Debug, Subcommand)]
enum AppKind {
    /// E-commerce order manager (products.csv, orders.json)
    Shop,
    /// School record manager (students.json, teachers.csv)
    School,
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG controls verbosity, logs go to stderr so they don't mix with the menus
    env_logger::init();

    let args = Args::parse();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(dir) = args.data_dir {
        config.data.dir = dir.display().to_string();
    }
    info!("Reading data files from: {}", config.data.dir);

    let persistence = FilePersistence::new(&config.data);
    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    match args.app {
        AppKind::Shop => RecordKeepApp::run_shop(persistence, &config, &mut console),
        AppKind::School => RecordKeepApp::run_school(persistence, &config, &mut console),
    }
}
