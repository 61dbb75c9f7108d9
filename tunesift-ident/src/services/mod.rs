//! Identification services

pub mod audd_client;
pub mod credentials;
pub mod fallback_orchestrator;
pub mod file_scanner;
pub mod fingerprint_client;
pub mod provider;
pub mod rate_limiter;
pub mod report_aggregator;
pub mod report_writer;

pub use audd_client::AcousticSearchProvider;
pub use credentials::{CredentialProvider, StaticCredentials};
pub use fallback_orchestrator::{FallbackOrchestrator, PassStatistics, RunOutcome};
pub use file_scanner::{DirectoryItemSource, ItemSource, ScanError};
pub use fingerprint_client::FingerprintProvider;
pub use provider::RecognitionProvider;
pub use rate_limiter::{Pacing, RateLimiter};
pub use report_aggregator::{aggregate, verify_partition};
pub use report_writer::{JsonReportWriter, ReportSink, TextReportWriter};
