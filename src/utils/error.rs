use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Template file not found: {}", .path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Row {row}: none of the file name fields {} is present", .tried.join(", "))]
    MissingField { tried: Vec<String>, row: usize },

    #[error("Invalid destination name '{value}': {reason}")]
    InvalidDestinationName { value: String, reason: String },

    #[error(
        "Row {row} resolves to {} which row {first_row} already generated",
        .path.display()
    )]
    DuplicateDestination {
        path: PathBuf,
        first_row: usize,
        row: usize,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset format error at line {line}: {message}")]
    DatasetFormat { line: u64, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Template,
    Record,
    Io,
    Dataset,
    Config,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MergeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MergeError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MergeError::TemplateNotFound { .. } => ErrorCategory::Template,
            MergeError::MissingField { .. }
            | MergeError::InvalidDestinationName { .. }
            | MergeError::DuplicateDestination { .. } => ErrorCategory::Record,
            MergeError::Io { .. } | MergeError::SerializationError(_) => ErrorCategory::Io,
            MergeError::DatasetFormat { .. } | MergeError::CsvError(_) => ErrorCategory::Dataset,
            MergeError::Cancelled => ErrorCategory::Cancelled,
            MergeError::ConfigError { .. }
            | MergeError::ConfigValidationError { .. }
            | MergeError::InvalidConfigValueError { .. } => ErrorCategory::Config,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Cancelled => ErrorSeverity::Low,
            ErrorCategory::Record => ErrorSeverity::Medium,
            ErrorCategory::Template | ErrorCategory::Dataset | ErrorCategory::Config => {
                ErrorSeverity::High
            }
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MergeError::TemplateNotFound { .. } => {
                "Check the template path or pass --template with an existing file"
            }
            MergeError::MissingField { .. } => {
                "Add a FileName (or Dateiname) column to the dataset, or use --mode fixed"
            }
            MergeError::InvalidDestinationName { .. } => {
                "Use plain file names without directory separators in the FileName column"
            }
            MergeError::DuplicateDestination { .. } => {
                "Make the FileName values unique or allow overwriting with --on-duplicate overwrite"
            }
            MergeError::Io { .. } => "Check that the output directory exists and is writable",
            MergeError::DatasetFormat { .. } | MergeError::CsvError(_) => {
                "Check the dataset header row and that every row has the same number of columns"
            }
            MergeError::SerializationError(_) => "Check the report output path",
            MergeError::Cancelled => "Run the job again to generate the remaining files",
            MergeError::ConfigError { .. }
            | MergeError::ConfigValidationError { .. }
            | MergeError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Template => format!("Template problem: {}", self),
            ErrorCategory::Record => format!("Record problem: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Dataset => format!("Dataset problem: {}", self),
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::Cancelled => "Generation was cancelled before all rows finished".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
