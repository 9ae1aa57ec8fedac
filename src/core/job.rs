use crate::core::engine::FileGenerationEngine;
use crate::core::{ConfigProvider, GenerationReport, GenerationRequest, TabularReader};
use crate::domain::model::RowPlan;
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

/// Reads the dataset and runs the generation engine with the configured options.
pub struct MergeJob<R: TabularReader, C: ConfigProvider> {
    reader: R,
    config: C,
    engine: FileGenerationEngine,
}

impl<R: TabularReader, C: ConfigProvider> MergeJob<R, C> {
    pub fn new(reader: R, config: C) -> Self {
        Self {
            reader,
            config,
            engine: FileGenerationEngine::new(),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub async fn build_request(&self) -> Result<GenerationRequest> {
        tracing::info!("Reading rows from {}", self.config.dataset_path().display());
        let rows = self.reader.read_rows().await?;
        tracing::info!("Read {} row(s)", rows.len());

        let mut request =
            GenerationRequest::new(self.config.template_path(), rows, self.config.mode())
                .with_error_policy(self.config.error_policy())
                .with_duplicate_policy(self.config.duplicate_policy())
                .with_concurrency(self.config.concurrency());
        if let Some(dir) = self.config.output_dir() {
            request = request.with_output_dir(dir);
        }
        Ok(request)
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<GenerationReport> {
        let request = self.build_request().await?;
        self.engine.process(&request, cancel).await
    }

    pub async fn plan(&self) -> Result<Vec<RowPlan>> {
        let request = self.build_request().await?;
        self.engine.plan(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryReader;
    use crate::core::{DestinationMode, RowRecord};
    use crate::domain::model::{DuplicatePolicy, ErrorPolicy};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct MockConfig {
        dataset: PathBuf,
        template: PathBuf,
        output_dir: Option<PathBuf>,
        mode: DestinationMode,
    }

    impl ConfigProvider for MockConfig {
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
            ErrorPolicy::Continue
        }

        fn duplicate_policy(&self) -> DuplicatePolicy {
            DuplicatePolicy::Overwrite
        }

        fn concurrency(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_run_generates_into_output_dir() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("letter.txt");
        std::fs::write(&template, "Hi {{Name}}\n").unwrap();
        let out = dir.path().join("out");

        let rows: Vec<RowRecord> = vec![
            [("FileName", "ana"), ("Name", "Ana")].into_iter().collect(),
            [("FileName", "bo"), ("Name", "Bo")].into_iter().collect(),
        ];
        let config = MockConfig {
            dataset: PathBuf::from("memory"),
            template,
            output_dir: Some(out.clone()),
            mode: DestinationMode::FromRecord,
        };
        let job = MergeJob::new(InMemoryReader::new(rows), config);

        let report = job.run(CancellationToken::new()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(
            report.generated_paths(),
            vec![out.join("ana.txt").as_path(), out.join("bo.txt").as_path()]
        );
        assert_eq!(std::fs::read_to_string(out.join("bo.txt")).unwrap(), "Hi Bo\n");
    }

    #[tokio::test]
    async fn test_build_request_copies_config() {
        let config = MockConfig {
            dataset: PathBuf::from("memory"),
            template: PathBuf::from("t.txt"),
            output_dir: None,
            mode: DestinationMode::Fixed,
        };
        let job = MergeJob::new(InMemoryReader::new(vec![RowRecord::default()]), config);

        let request = job.build_request().await.unwrap();
        assert_eq!(request.template_path, PathBuf::from("t.txt"));
        assert_eq!(request.mode, DestinationMode::Fixed);
        assert_eq!(request.concurrency, 2);
        assert_eq!(request.rows.len(), 1);
        assert!(request.output_dir.is_none());
    }
}
