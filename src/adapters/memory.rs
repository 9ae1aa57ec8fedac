use crate::core::{RowRecord, TabularReader};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Rows already in memory, e.g. built by a caller or converted from another format.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReader {
    rows: Vec<RowRecord>,
}

impl InMemoryReader {
    pub fn new(rows: Vec<RowRecord>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl TabularReader for InMemoryReader {
    async fn read_rows(&self) -> Result<Vec<RowRecord>> {
        Ok(self.rows.clone())
    }
}
