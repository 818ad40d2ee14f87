pub mod api_config;
pub mod cli;

pub use api_config::ApiConfig;

use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "order-fetch")]
#[command(about = "Fetch records from a JSON HTTP API into JSON and CSV files")]
pub struct CliConfig {
    #[arg(long, help = "Path to the JSON configuration file")]
    pub config: std::path::PathBuf,

    #[arg(
        long,
        required = true,
        num_args = 1..,
        help = "Two dates as 'DD-MM-YYYY DD-MM-YYYY', or 'today'/'yesterday'"
    )]
    pub dates: Vec<String>,

    #[arg(long, default_value = "data", help = "Directory the output files go to")]
    pub output_path: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("output_path", &self.output_path)?;

        if !self.config.exists() {
            return Err(EtlError::ConfigError {
                message: format!("config file not found: {}", self.config.display()),
            });
        }

        Ok(())
    }
}
