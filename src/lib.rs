// Library interface for ReadyRS modules
// This allows integration tests to access the core functionality

pub mod acwr;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod nutrition;
pub mod readiness;
pub mod sleep;

// Re-export commonly used types for convenience
pub use models::*;
pub use acwr::{AcwrCalculator, AcwrConfig, AcwrMetrics, DayBucketing, LoadZone};
pub use database::TrainingLog;
pub use readiness::{
    BoundedSleepSource, NutritionLog, ReadinessBand, ReadinessColor, ReadinessResult,
    ReadinessScorer, ScorerConfig, SetHistory, SleepSource,
};
pub use import::{csv::CsvSetImporter, ImportSummary};
pub use error::{ReadyRsError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
