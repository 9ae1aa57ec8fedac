use crate::core::path_resolver;
use crate::core::substitutor::substitute;
use crate::core::template::TemplateDocument;
use crate::domain::model::{
    DuplicatePolicy, ErrorPolicy, GenerationReport, GenerationRequest, GenerationResult,
    RowOutcome, RowPlan, RowRecord,
};
use crate::utils::error::{MergeError, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

/// Generates one output file per row from a template.
#[derive(Debug, Default, Clone)]
pub struct FileGenerationEngine;

impl FileGenerationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Runs the request and reports every row's outcome in input order.
    ///
    /// Fails as a whole only when the template is missing or unreadable; row
    /// failures are recorded in the report according to the request's
    /// [`ErrorPolicy`].
    pub async fn process(
        &self,
        request: &GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<GenerationReport> {
        let template = TemplateDocument::open(&request.template_path).await?;
        tracing::info!(
            "Generating {} file(s) from template {}",
            request.rows.len(),
            template.path().display()
        );
        warn_unresolved(&template, &request.rows).await?;

        let (mut plans, has_duplicates) = resolve_all(request);
        if request.error_policy == ErrorPolicy::Abort {
            if let Some(first_failure) = plans.iter().position(|p| p.is_err()) {
                plans.truncate(first_failure + 1);
            }
        }
        let concurrency = if has_duplicates {
            // A repeated destination may be the template itself, so rows must
            // see each other's writes in order.
            1
        } else {
            request.concurrency.max(1)
        };
        tracing::debug!("Processing rows with concurrency {}", concurrency);

        let rows_token = cancel.child_token();
        let mut report = GenerationReport::default();
        let mut stopped = false;
        let mut interrupted = false;

        let mut results = stream::iter(plans.into_iter().enumerate())
            .map(|(index, planned)| {
                let token = rows_token.clone();
                let template = &template;
                let row = &request.rows[index];
                async move {
                    if token.is_cancelled() {
                        return (index, Err(MergeError::Cancelled));
                    }
                    let destination = match planned {
                        Ok(destination) => destination,
                        Err(e) => return (index, Err(e)),
                    };
                    (index, stage_row(template, index, row, destination, &token).await)
                }
            })
            .buffered(concurrency);

        // Staged rows arrive in input order; only rows before the first abort
        // or cancellation are moved into place, so the report is a prefix of
        // the input rows.
        while let Some((index, staged)) = results.next().await {
            if stopped {
                if let Ok(staged) = staged {
                    staged.discard().await;
                }
                continue;
            }

            let result = match staged {
                Ok(staged) => staged.commit().await,
                Err(e) => Err(e),
            };
            match result {
                Ok(path) => {
                    tracing::debug!(row = index, "Generated {}", path.display());
                    report.outcomes.push(RowOutcome::generated(index, path));
                }
                Err(MergeError::Cancelled) => {
                    interrupted = true;
                    stopped = true;
                }
                Err(error) => {
                    tracing::warn!(row = index, "Row failed: {}", error);
                    report.outcomes.push(RowOutcome::failed(index, error));
                    if request.error_policy == ErrorPolicy::Abort {
                        tracing::warn!("Stopping after failed row {}", index);
                        stopped = true;
                        rows_token.cancel();
                    }
                }
            }
        }

        report.cancelled = interrupted && cancel.is_cancelled();
        if report.cancelled {
            tracing::warn!(
                "Generation cancelled after {} of {} row(s)",
                report.outcomes.len(),
                request.rows.len()
            );
        }
        tracing::info!(
            "Generated {} file(s), {} row(s) failed",
            report.generated_count(),
            report.failed_count()
        );

        Ok(report)
    }

    /// All-or-nothing variant: the generated paths in row order, or the first
    /// row error. Files written before the failure stay on disk.
    pub async fn process_all(
        &self,
        request: &GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<GenerationResult> {
        let request = GenerationRequest {
            error_policy: ErrorPolicy::Abort,
            ..request.clone()
        };
        self.process(&request, cancel).await?.into_result()
    }

    /// Resolves every destination without writing anything.
    pub async fn plan(&self, request: &GenerationRequest) -> Result<Vec<RowPlan>> {
        TemplateDocument::open(&request.template_path).await?;
        let (plans, _) = resolve_all(request);
        Ok(plans
            .into_iter()
            .enumerate()
            .map(|(index, destination)| RowPlan { index, destination })
            .collect())
    }
}

/// Resolves all destinations up front so duplicate handling does not depend on
/// write order. The flag reports whether any destination repeats.
fn resolve_all(request: &GenerationRequest) -> (Vec<Result<PathBuf>>, bool) {
    let mut first_use: HashMap<PathBuf, usize> = HashMap::new();
    let mut has_duplicates = false;
    let mut plans = Vec::with_capacity(request.rows.len());

    for (index, row) in request.rows.iter().enumerate() {
        let resolved = path_resolver::resolve(
            &request.template_path,
            row,
            request.mode,
            request.output_dir.as_deref(),
            index,
        )
        .and_then(|destination| match first_use.get(&destination) {
            Some(&first_row) => {
                has_duplicates = true;
                match request.duplicate_policy {
                    DuplicatePolicy::Overwrite => {
                        tracing::warn!(
                            "Row {} overwrites {} generated by row {}",
                            index,
                            destination.display(),
                            first_row
                        );
                        Ok(destination)
                    }
                    DuplicatePolicy::Error => Err(MergeError::DuplicateDestination {
                        path: destination,
                        first_row,
                        row: index,
                    }),
                }
            }
            None => {
                first_use.insert(destination.clone(), index);
                Ok(destination)
            }
        });
        plans.push(resolved);
    }

    (plans, has_duplicates)
}

async fn warn_unresolved(template: &TemplateDocument, rows: &[RowRecord]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    for name in template.placeholders().await? {
        if !rows.iter().any(|row| row.contains_key(&name)) {
            tracing::warn!(
                "Placeholder {{{{{}}}}} has no matching column and will be left as is",
                name
            );
        }
    }
    Ok(())
}

fn temp_path(destination: &Path, index: usize) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.rowmerge-tmp-{}", file_name, index))
}

/// A fully written row waiting under its temporary name.
struct StagedRow {
    tmp: PathBuf,
    destination: PathBuf,
}

impl StagedRow {
    async fn commit(self) -> Result<PathBuf> {
        match tokio::fs::rename(&self.tmp, &self.destination).await {
            Ok(()) => Ok(self.destination),
            Err(e) => {
                remove_temp(&self.tmp).await;
                Err(MergeError::io(&self.destination, e))
            }
        }
    }

    async fn discard(self) {
        remove_temp(&self.tmp).await;
    }
}

async fn remove_temp(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not remove temporary file {}: {}", tmp.display(), e);
        }
    }
}

/// Writes one row to a temporary sibling of `destination`. The temporary file
/// is removed when writing fails or is cancelled.
async fn stage_row(
    template: &TemplateDocument,
    index: usize,
    row: &RowRecord,
    destination: PathBuf,
    token: &CancellationToken,
) -> Result<StagedRow> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| MergeError::io(parent, e))?;
    }

    let tmp = temp_path(&destination, index);
    if let Err(e) = write_lines(template, row, &tmp, token).await {
        remove_temp(&tmp).await;
        return Err(e);
    }
    Ok(StagedRow { tmp, destination })
}

/// Stages and commits a single row.
#[cfg(test)]
async fn write_row(
    template: &TemplateDocument,
    index: usize,
    row: &RowRecord,
    destination: &Path,
    token: &CancellationToken,
) -> Result<()> {
    stage_row(template, index, row, destination.to_path_buf(), token)
        .await?
        .commit()
        .await
        .map(|_| ())
}

async fn write_lines(
    template: &TemplateDocument,
    row: &RowRecord,
    tmp: &Path,
    token: &CancellationToken,
) -> Result<()> {
    let mut lines = template.lines().await?;
    let file = tokio::fs::File::create(tmp)
        .await
        .map_err(|e| MergeError::io(tmp, e))?;
    let mut writer = BufWriter::new(file);

    loop {
        if token.is_cancelled() {
            return Err(MergeError::Cancelled);
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let rendered = substitute(&line.content, row);
        writer
            .write_all(rendered.as_bytes())
            .await
            .map_err(|e| MergeError::io(tmp, e))?;
        writer
            .write_all(line.ending.as_bytes())
            .await
            .map_err(|e| MergeError::io(tmp, e))?;
    }

    writer.flush().await.map_err(|e| MergeError::io(tmp, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| MergeError::io(tmp, e))?;
    Ok(())
}
