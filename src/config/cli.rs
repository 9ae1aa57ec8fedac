use crate::config::toml_config::TomlConfig;
use crate::config::JobConfig;
use crate::domain::model::{DestinationMode, DuplicatePolicy, ErrorPolicy};
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "rowmerge")]
#[command(about = "Generate one file per dataset row from a text template")]
pub struct CliConfig {
    /// CSV/TSV dataset whose first line holds the column names [default: data.csv]
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Template file containing {{Column}} placeholders [default: template.txt]
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Directory for generated files (defaults to the template's directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// How output file names are derived
    #[arg(long, value_enum)]
    pub mode: Option<DestinationMode>,

    /// Dataset delimiter; guessed from the file when omitted
    #[arg(long)]
    pub delimiter: Option<String>,

    /// What to do when a row fails
    #[arg(long, value_enum)]
    pub on_error: Option<ErrorPolicy>,

    /// What to do when two rows resolve to the same file
    #[arg(long, value_enum)]
    pub on_duplicate: Option<DuplicatePolicy>,

    /// Number of rows generated concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// TOML configuration file; flags given on the command line take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only show where each row would be written
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON report of every row's outcome to this path
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Loads the TOML file when given and applies the command line overrides.
    pub fn into_job_config(self) -> Result<JobConfig> {
        let base = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?.into_job_config()
            }
            None => JobConfig::default(),
        };
        Ok(self.apply_overrides(base))
    }

    fn apply_overrides(self, base: JobConfig) -> JobConfig {
        JobConfig {
            name: base.name,
            dataset: self.dataset.unwrap_or(base.dataset),
            template: self.template.unwrap_or(base.template),
            output_dir: self.output_dir.or(base.output_dir),
            delimiter: self.delimiter.or(base.delimiter),
            mode: self.mode.unwrap_or(base.mode),
            error_policy: self.on_error.unwrap_or(base.error_policy),
            duplicate_policy: self.on_duplicate.unwrap_or(base.duplicate_policy),
            concurrency: self.concurrency.unwrap_or(base.concurrency),
            log_level: if self.verbose {
                Some("debug".to_string())
            } else {
                base.log_level
            },
        }
    }
}
