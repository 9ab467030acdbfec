use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod cli;
mod config;
mod fetch;
mod media;
mod utils;
mod workflow;

use config::Config;
use media::{FormatFilter, MediaClient};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a link is a valid http(s) URL
    Check { url: String },
    /// Analyze a link and list its downloadable formats
    Analyze {
        url: String,
        /// Show only `all`, `video` or `audio` formats
        #[arg(short, long, default_value = "all")]
        filter: FormatFilter,
    },
    /// Analyze a link and download one of its formats
    Download {
        url: String,
        /// Format id as listed by `analyze`
        #[arg(short, long)]
        format: String,
        /// Directory to save into (defaults to `download.output_dir`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the configured service and whether it is reachable
    Status,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("LINKGRAB_CONFIG") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/linkgrab/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/linkgrab/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn load_config(args: &Args) -> Result<Config> {
    match get_config_path(args) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path)),
        None => Ok(Config::default()),
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.get_logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config);

    match get_config_path(&args) {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    let client = MediaClient::new(&config.api).context("Failed to initialize media client")?;

    let mut out = std::io::stdout();
    let ok = match args.command {
        Command::Check { url } => cli::check(&mut out, &url)?,
        Command::Analyze { url, filter } => {
            cli::analyze(&mut out, &client, &url, filter).await?
        }
        Command::Download {
            url,
            format,
            output,
        } => {
            let output_dir = output.unwrap_or_else(|| config.download.output_dir.clone());
            cli::download(&mut out, &config, &client, &url, &format, &output_dir).await?
        }
        Command::Status => {
            cli::status(&mut out, &config, &client)?;
            true
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
