// Domain layer: row records, generation requests/reports and the ports the engine talks through.

pub mod model;
pub mod ports;
