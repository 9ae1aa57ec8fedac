use crate::utils::error::{ErrorCategory, MergeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One dataset row: field name to field value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRecord {
    fields: HashMap<String, String>,
}

impl RowRecord {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// Pairs each header with the value at the same position. Values past the
    /// last header are dropped; `DelimitedReader` rejects such rows before
    /// they get here.
    pub fn from_header(headers: &[String], values: &[String]) -> Self {
        let fields = headers
            .iter()
            .zip(values.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// How each output file name is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DestinationMode {
    /// Every row writes to the template's own base name.
    Fixed,
    /// The base name comes from the row's `FileName` / `Dateiname` field.
    #[default]
    FromRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ErrorPolicy {
    /// Record the failed row and keep going.
    #[default]
    Continue,
    /// Stop after the first failed row.
    Abort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DuplicatePolicy {
    /// Later rows overwrite earlier ones with the same destination.
    #[default]
    Overwrite,
    /// A row whose destination was already produced fails.
    Error,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template_path: PathBuf,
    pub rows: Vec<RowRecord>,
    pub mode: DestinationMode,
    pub output_dir: Option<PathBuf>,
    pub error_policy: ErrorPolicy,
    pub duplicate_policy: DuplicatePolicy,
    pub concurrency: usize,
}

impl GenerationRequest {
    pub fn new(template_path: impl Into<PathBuf>, rows: Vec<RowRecord>, mode: DestinationMode) -> Self {
        Self {
            template_path: template_path.into(),
            rows,
            mode,
            output_dir: None,
            error_policy: ErrorPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Destination paths in row order.
pub type GenerationResult = Vec<PathBuf>;

#[derive(Debug)]
pub enum RowStatus {
    Generated { path: PathBuf },
    Failed { error: MergeError },
}

#[derive(Debug)]
pub struct RowOutcome {
    pub index: usize,
    pub status: RowStatus,
}

impl RowOutcome {
    pub fn generated(index: usize, path: PathBuf) -> Self {
        Self {
            index,
            status: RowStatus::Generated { path },
        }
    }

    pub fn failed(index: usize, error: MergeError) -> Self {
        Self {
            index,
            status: RowStatus::Failed { error },
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.status {
            RowStatus::Generated { path } => Some(path),
            RowStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&MergeError> {
        match &self.status {
            RowStatus::Generated { .. } => None,
            RowStatus::Failed { error } => Some(error),
        }
    }
}

/// Per-row outcomes of one run, in input row order.
///
/// The outcomes always cover a contiguous prefix of the input rows. A run that
/// stops early (an `Abort` failure or cancellation) reports nothing for the
/// rows after that point and leaves no files for them.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<RowOutcome>,
    pub cancelled: bool,
}

impl GenerationReport {
    pub fn generated_paths(&self) -> Vec<&Path> {
        self.outcomes.iter().filter_map(RowOutcome::path).collect()
    }

    pub fn generated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.path().is_some()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error().is_some()).count()
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failed_count() == 0
    }

    /// All-or-nothing view: the paths when every row succeeded, otherwise the
    /// first row error (or `Cancelled`).
    pub fn into_result(self) -> Result<GenerationResult> {
        let mut paths = Vec::with_capacity(self.outcomes.len());
        for outcome in self.outcomes {
            match outcome.status {
                RowStatus::Generated { path } => paths.push(path),
                RowStatus::Failed { error } => return Err(error),
            }
        }
        if self.cancelled {
            return Err(MergeError::Cancelled);
        }
        Ok(paths)
    }

    /// Writes [`GenerationReport::summary`] as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.summary())?;
        std::fs::write(path, json).map_err(|e| MergeError::io(path, e))
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            generated: self.generated_count(),
            failed: self.failed_count(),
            cancelled: self.cancelled,
            rows: self
                .outcomes
                .iter()
                .map(|o| match &o.status {
                    RowStatus::Generated { path } => RowSummary {
                        row: o.index,
                        path: Some(path.clone()),
                        category: None,
                        error: None,
                    },
                    RowStatus::Failed { error } => RowSummary {
                        row: o.index,
                        path: None,
                        category: Some(error.category()),
                        error: Some(error.to_string()),
                    },
                })
                .collect(),
        }
    }
}

/// Serializable form of a [`GenerationReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub generated: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub rows: Vec<RowSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowSummary {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dry-run entry: where a row would be written, or why it could not be.
#[derive(Debug)]
pub struct RowPlan {
    pub index: usize,
    pub destination: Result<PathBuf>,
}
