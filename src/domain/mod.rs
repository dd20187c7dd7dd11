// Domain layer - Core business models
pub mod error;
pub mod publish;
pub mod series;
pub mod telemetry;
