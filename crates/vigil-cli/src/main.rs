mod commands;
mod terminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use vigil_core::MonitorConfig;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Proctored exam sessions", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a monitored exam session in this terminal
    Run {
        /// Directory of PNG frames standing in for the camera
        #[arg(short, long, default_value = "frames")]
        frames: PathBuf,
        /// Quiz to show before the session starts (defaults to config)
        #[arg(short, long)]
        quiz: Option<u64>,
    },
    /// Send one PNG image to the classification service
    Classify {
        /// Image file to classify
        image: PathBuf,
    },
    /// Show a quiz from the quiz content service
    Quiz {
        /// Quiz id (defaults to config)
        id: Option<u64>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the default config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = MonitorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { frames, quiz } => commands::run::run_command(config, &frames, quiz).await,
        Commands::Classify { image } => {
            commands::classify::classify_command(&config, &image).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Quiz { id } => {
            let id = id.unwrap_or(config.quiz_id);
            commands::quiz::quiz_command(&config, id).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => commands::config::handle_config_show(&config)?,
                ConfigAction::Path => commands::config::handle_config_path()?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
