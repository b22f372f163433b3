//! Core pipeline types and computations

pub mod analytics;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod helpers;
pub mod loader;
pub mod log;
pub mod mailer;
pub mod pipeline;
pub mod record;
pub mod stats;

// Re-export main types for cleaner imports
pub use analytics::{AnalysisResult, Analyzer, TrendDirection};
pub use cleaner::{Cleaner, CleaningStats};
pub use error::{PipelineError, Result};
pub use loader::Loader;
pub use mailer::{ReportEmail, ReportMailer};
pub use record::{Dataset, RawRecord, Record};
