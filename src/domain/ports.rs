use crate::domain::model::{DestinationMode, DuplicatePolicy, ErrorPolicy, RowRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Source of row records. Implementations differ by file format only.
#[async_trait]
pub trait TabularReader: Send + Sync {
    async fn read_rows(&self) -> Result<Vec<RowRecord>>;
}

pub trait ConfigProvider: Send + Sync {
    fn dataset_path(&self) -> &Path;
    fn template_path(&self) -> &Path;
    fn output_dir(&self) -> Option<&Path>;
    fn mode(&self) -> DestinationMode;
    fn error_policy(&self) -> ErrorPolicy;
    fn duplicate_policy(&self) -> DuplicatePolicy;
    fn concurrency(&self) -> usize;
}
