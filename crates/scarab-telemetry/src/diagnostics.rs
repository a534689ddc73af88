//! Local capture of failed event deliveries.
//!
//! Mirrors the page's debugging aid for lost telemetry: each failure is
//! written as one timestamp-keyed JSON file so a researcher can inspect
//! what never reached the collector. Records are never read back by the
//! page and never retried.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::json;

use scarab_core::event::Envelope;
use scarab_core::{Result, ScarabError};

/// Directory-backed store of delivery-failure records.
#[derive(Debug, Clone)]
pub struct DiagnosticStore {
    dir: PathBuf,
}

impl DiagnosticStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.config/scarab/log-errors`
    pub fn default_location() -> Option<Self> {
        dirs::home_dir()
            .map(|home| Self::new(home.join(".config").join("scarab").join("log-errors")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one failure record and returns its path.
    pub fn record_failure(&self, envelope: &Envelope, error: &ScarabError) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            ScarabError::internal(format!(
                "could not create diagnostic directory {}: {err}",
                self.dir.display()
            ))
        })?;

        // Event ID in the name keeps same-millisecond failures distinct.
        let name = format!(
            "log_error_{}_{}.json",
            Utc::now().timestamp_millis(),
            envelope.event_id
        );
        let path = self.dir.join(name);
        let record = json!({
            "error": error.to_string(),
            "data": envelope,
        });
        fs::write(&path, serde_json::to_string_pretty(&record)?).map_err(|err| {
            ScarabError::internal(format!(
                "could not write diagnostic record {}: {err}",
                path.display()
            ))
        })?;
        Ok(path)
    }
}
