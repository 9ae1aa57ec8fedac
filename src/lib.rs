pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{toml_config::TomlConfig, JobConfig};

pub use adapters::{delimited::DelimitedReader, memory::InMemoryReader};
pub use crate::core::{engine::FileGenerationEngine, job::MergeJob};
pub use domain::model::{
    DestinationMode, DuplicatePolicy, ErrorPolicy, GenerationReport, GenerationRequest,
    GenerationResult, RowOutcome, RowRecord, RowStatus,
};
pub use utils::error::{MergeError, Result};
pub use tokio_util::sync::CancellationToken;
