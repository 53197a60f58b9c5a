pub mod seed;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{config, StoreBackend};
use crate::server::AppState;

#[derive(Parser)]
#[command(name = "seeder")]
#[command(about = "Load or clear DevCamper data")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Import users, bootcamps, courses and reviews from a directory of JSON files")]
    Import {
        #[arg(help = "Directory holding users.json, bootcamps.json, courses.json, reviews.json", default_value = "fixtures")]
        dir: PathBuf,
    },

    #[command(about = "Remove every document from every collection")]
    Destroy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let config = config().clone();
    if config.database.backend == StoreBackend::Memory {
        tracing::warn!("STORE_BACKEND is memory; seeded data will not outlive this process");
    }
    let state = AppState::connect(config).await?;

    match cli.command {
        Commands::Import { dir } => {
            let report = seed::Seeder::new(&state).import(&dir).await?;
            utils::output_success(
                &output_format,
                &format!("Data imported from {}", dir.display()),
                Some(serde_json::to_value(&report)?),
            )
        }
        Commands::Destroy => {
            let removed = seed::destroy(&state).await?;
            utils::output_success(&output_format, "Data destroyed", Some(json!({ "removed": removed })))
        }
    }
}
