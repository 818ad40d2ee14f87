pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, ApiConfig, CliConfig};
pub use core::{etl::EtlEngine, pipeline::FetchPipeline};
pub use utils::error::{EtlError, Result};
