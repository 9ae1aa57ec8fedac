#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{DestinationMode, DuplicatePolicy, ErrorPolicy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate, MAX_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATASET: &str = "data.csv";
pub const DEFAULT_TEMPLATE: &str = "template.txt";

/// Effective settings of one run, after merging the TOML file and CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Label from the TOML `[job]` section, used in log output.
    pub name: Option<String>,
    pub dataset: PathBuf,
    pub template: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub mode: DestinationMode,
    pub error_policy: ErrorPolicy,
    pub duplicate_policy: DuplicatePolicy,
    pub concurrency: usize,
    pub log_level: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: None,
            dataset: PathBuf::from(DEFAULT_DATASET),
            template: PathBuf::from(DEFAULT_TEMPLATE),
            output_dir: None,
            delimiter: None,
            mode: DestinationMode::default(),
            error_policy: ErrorPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            concurrency: 1,
            log_level: None,
        }
    }
}

impl JobConfig {
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(|d| validation::validate_delimiter("delimiter", d))
            .transpose()
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("dataset", &self.dataset.to_string_lossy())?;
        validation::validate_path("template", &self.template.to_string_lossy())?;
        if let Some(dir) = &self.output_dir {
            validation::validate_path("output_dir", &dir.to_string_lossy())?;
        }
        validation::validate_range("concurrency", self.concurrency, 1, MAX_CONCURRENCY)?;
        self.delimiter_byte()?;
        Ok(())
    }
}

impl ConfigProvider for JobConfig {
    fn dataset_path(&self) -> &Path {
        &self.dataset
    }

    fn template_path(&self) -> &Path {
        &self.template
    }

    fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    fn mode(&self) -> DestinationMode {
        self.mode
    }

    fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }
}
