use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub at: DateTime<Utc>,
    pub phase: String,
    pub status: String,
    pub message: String,
}

impl DiagnosticEvent {
    pub fn now(phase: &str, status: &str, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            phase: phase.to_string(),
            status: status.to_string(),
            message: message.into(),
        }
    }
}

/// Append-only destination for failures that abort an input before any artifact exists.
pub trait DiagnosticSink {
    fn record(&mut self, event: DiagnosticEvent) -> Result<()>;
}

/// One JSON line per event in `<logs_dir>/manhour_error.log`.
#[derive(Debug, Clone)]
pub struct AuditFileSink {
    path: PathBuf,
}

impl AuditFileSink {
    pub fn new(logs_dir: &Path) -> Self {
        Self {
            path: logs_dir.join("manhour_error.log"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for AuditFileSink {
    fn record(&mut self, event: DiagnosticEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let line = format!("{}\n", serde_json::to_string(&event)?);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub events: Vec<DiagnosticEvent>,
}

#[cfg(test)]
impl DiagnosticSink for MemorySink {
    fn record(&mut self, event: DiagnosticEvent) -> Result<()> {
        self.events.push(event);
        Ok(())
    }
}
