pub mod org_table;
pub mod run;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn stage(&mut self, input: &str, stage: &crate::manhour::pipeline::StageReport) {
        use crate::manhour::pipeline::StageStatus;
        match &stage.status {
            StageStatus::Written { rows } => self.detail(format!(
                "{input}: {}={} rows={rows}",
                stage.stage,
                stage.path.display()
            )),
            StageStatus::Failed(err) => self.issue(format!(
                "{input}: {} failed ({}): {} [artifact={}]",
                stage.stage,
                err.kind.as_str(),
                err.message,
                stage.path.display()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use crate::manhour::pipeline::{StageReport, StageStatus};
    use std::path::PathBuf;

    #[test]
    fn failed_stage_marks_report_not_ok() {
        let mut report = CommandReport::new("run");
        report.stage(
            "m_25.1.csv",
            &StageReport {
                stage: "ingest",
                path: PathBuf::from("/d/a.tsv"),
                status: StageStatus::Written { rows: 3 },
            },
        );
        assert!(report.ok);
        assert_eq!(report.details, vec!["m_25.1.csv: ingest=/d/a.tsv rows=3"]);

        report.stage(
            "m_25.1.csv",
            &StageReport {
                stage: "sort_staff_code",
                path: PathBuf::from("/d/b.tsv"),
                status: StageStatus::Failed(StageError::structural("Error: x")),
            },
        );
        assert!(!report.ok);
        assert!(report.issues[0].contains("sort_staff_code failed (structural): Error: x"));
    }
}
