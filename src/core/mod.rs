pub mod engine;
pub mod job;
pub mod path_resolver;
pub mod substitutor;
pub mod template;

pub use crate::domain::model::{
    DestinationMode, GenerationReport, GenerationRequest, GenerationResult, RowRecord,
};
pub use crate::domain::ports::{ConfigProvider, TabularReader};
pub use crate::utils::error::Result;
