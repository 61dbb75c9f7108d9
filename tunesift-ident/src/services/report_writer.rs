//! Report sinks
//!
//! The text layout is one block per identified item followed by the list of
//! unresolved items:
//!
//! ```text
//! < --------------- IDENTIFIED SONGS --------------- >
//! Path      :: songs/a.mp3
//! title     :: Windowlicker
//! ...
//! Provider  :: fingerprint
//!
//!
//! < --------------- NOT IDENTIFIED SONGS --------------- >
//! songs/b.mp3
//! songs/c.mp3 (not attempted)
//! ```

use crate::error::IdentError;
use crate::models::{Report, UnresolvedStatus};
use std::fmt::Write as _;
use std::path::PathBuf;

const IDENTIFIED_HEADER: &str = "< --------------- IDENTIFIED SONGS --------------- >";
const UNRESOLVED_HEADER: &str = "< --------------- NOT IDENTIFIED SONGS --------------- >";

/// Output contract for finished reports
pub trait ReportSink {
    fn write(&self, report: &Report) -> Result<(), IdentError>;
}

/// Writes the padded `label :: value` text layout
pub struct TextReportWriter {
    path: PathBuf,
    separator: String,
    padding: usize,
}

impl TextReportWriter {
    pub fn new(path: impl Into<PathBuf>, separator: impl Into<String>, padding: usize) -> Self {
        Self {
            path: path.into(),
            separator: separator.into(),
            padding,
        }
    }

    /// Render `report` in the text layout
    pub fn render(&self, report: &Report) -> String {
        let mut out = String::new();
        out.push_str(IDENTIFIED_HEADER);
        out.push('\n');

        for hit in &report.hits {
            self.push_line(&mut out, "Path", &hit.item.to_string());
            for field in hit.payload.fields() {
                self.push_line(&mut out, &field.name, &field.value);
            }
            self.push_line(&mut out, "Provider", &hit.provider);
            out.push('\n');
        }
        out.push('\n');

        out.push_str(UNRESOLVED_HEADER);
        out.push('\n');
        for unresolved in &report.unresolved {
            match unresolved.status {
                UnresolvedStatus::Unmatched => {
                    let _ = writeln!(out, "{}", unresolved.item);
                }
                UnresolvedStatus::NotAttempted => {
                    let _ = writeln!(out, "{} (not attempted)", unresolved.item);
                }
            }
        }
        out
    }

    fn push_line(&self, out: &mut String, label: &str, value: &str) {
        let _ = writeln!(
            out,
            "{}{}{}",
            pad_right(label, self.padding),
            self.separator,
            value
        );
    }
}

impl ReportSink for TextReportWriter {
    fn write(&self, report: &Report) -> Result<(), IdentError> {
        std::fs::write(&self.path, self.render(report))?;
        tracing::info!("Report written to {}", self.path.display());
        Ok(())
    }
}

/// Writes the report as pretty-printed JSON
pub struct JsonReportWriter {
    path: PathBuf,
}

impl JsonReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonReportWriter {
    fn write(&self, report: &Report) -> Result<(), IdentError> {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&self.path, json)?;
        tracing::info!("Report written to {}", self.path.display());
        Ok(())
    }
}

/// Right-pad `label` with spaces to `width` characters (never truncates)
fn pad_right(label: &str, width: usize) -> String {
    format!("{:<width$}", label, width = width)
}
