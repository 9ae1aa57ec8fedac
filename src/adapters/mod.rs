// Adapters layer: TabularReader implementations. Spreadsheet readers plug in here
// behind the same trait without touching the engine.

pub mod delimited;
pub mod memory;
