use crate::config::JobConfig;
use crate::domain::model::{DestinationMode, DuplicatePolicy, ErrorPolicy};
use crate::utils::error::{MergeError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: Option<JobSection>,
    pub source: SourceConfig,
    pub template: TemplateConfig,
    pub output: Option<OutputConfig>,
    pub processing: Option<ProcessingConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub dataset: PathBuf,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub path: PathBuf,
    pub mode: Option<DestinationMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    pub on_duplicate: Option<DuplicatePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub on_error: Option<ErrorPolicy>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MergeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Expands `${VAR}` from the environment; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MergeError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn into_job_config(self) -> JobConfig {
        let defaults = JobConfig::default();
        let output = self.output.unwrap_or(OutputConfig {
            dir: None,
            on_duplicate: None,
        });
        let processing = self.processing.unwrap_or(ProcessingConfig {
            on_error: None,
            concurrency: None,
        });

        JobConfig {
            name: self.job.map(|j| j.name),
            dataset: self.source.dataset,
            template: self.template.path,
            output_dir: output.dir,
            delimiter: self.source.delimiter,
            mode: self.template.mode.unwrap_or(defaults.mode),
            error_policy: processing.on_error.unwrap_or(defaults.error_policy),
            duplicate_policy: output.on_duplicate.unwrap_or(defaults.duplicate_policy),
            concurrency: processing.concurrency.unwrap_or(defaults.concurrency),
            log_level: self.logging.and_then(|l| l.level),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.clone().into_job_config().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[job]
name = "invoices"

[source]
dataset = "rows.csv"
delimiter = ";"

[template]
path = "invoice.txt"
mode = "fixed"

[output]
dir = "./out"
on_duplicate = "error"

[processing]
on_error = "abort"
concurrency = 4

[logging]
level = "debug"
"#;

        let job = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .into_job_config();
        assert_eq!(job.name.as_deref(), Some("invoices"));
        assert_eq!(job.dataset, PathBuf::from("rows.csv"));
        assert_eq!(job.template, PathBuf::from("invoice.txt"));
        assert_eq!(job.output_dir, Some(PathBuf::from("./out")));
        assert_eq!(job.delimiter_byte().unwrap(), Some(b';'));
        assert_eq!(job.mode, DestinationMode::Fixed);
        assert_eq!(job.error_policy, ErrorPolicy::Abort);
        assert_eq!(job.duplicate_policy, DuplicatePolicy::Error);
        assert_eq!(job.concurrency, 4);
        assert_eq!(job.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml_content = r#"
[source]
dataset = "rows.csv"

[template]
path = "t.txt"
"#;
        let job = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .into_job_config();
        assert_eq!(job.mode, DestinationMode::FromRecord);
        assert_eq!(job.error_policy, ErrorPolicy::Continue);
        assert_eq!(job.duplicate_policy, DuplicatePolicy::Overwrite);
        assert_eq!(job.concurrency, 1);
        assert!(job.output_dir.is_none());
        assert!(job.name.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ROWMERGE_TEST_OUT_DIR", "/tmp/rowmerge-out");

        let toml_content = r#"
[source]
dataset = "rows.csv"

[template]
path = "${ROWMERGE_TEST_UNSET_VAR}/t.txt"

[output]
dir = "${ROWMERGE_TEST_OUT_DIR}"
"#;

        let job = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .into_job_config();
        assert_eq!(job.output_dir, Some(PathBuf::from("/tmp/rowmerge-out")));
        assert_eq!(
            job.template,
            PathBuf::from("${ROWMERGE_TEST_UNSET_VAR}/t.txt")
        );

        std::env::remove_var("ROWMERGE_TEST_OUT_DIR");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[source]
dataset = "rows.csv"

[template]
path = "t.txt"

[processing]
concurrency = 0
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_mode_is_a_parse_error() {
        let toml_content = r#"
[source]
dataset = "rows.csv"

[template]
path = "t.txt"
mode = "sometimes"
"#;
        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(MergeError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[job]
name = "file-test"

[source]
dataset = "rows.tsv"

[template]
path = "t.txt"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let job = TomlConfig::from_file(temp_file.path())
            .unwrap()
            .into_job_config();
        assert_eq!(job.name.as_deref(), Some("file-test"));
        assert_eq!(job.dataset, PathBuf::from("rows.tsv"));
    }
}
