use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};

use crate::error::{PipelineError, StageError, StageOutcome};
use crate::manhour::audit::{DiagnosticEvent, DiagnosticSink};
use crate::manhour::config::ManhourConfig;
use crate::manhour::paths::{self, Artifact, ArtifactSet, ManhourPaths};
use crate::manhour::table::{self, Table};
use crate::manhour::{completeness, exclusion, ingest, normalize, org_table, reconcile, sort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Written { rows: usize },
    Failed(StageError),
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: &'static str,
    pub path: PathBuf,
    pub status: StageStatus,
}

impl StageReport {
    pub fn ok(&self) -> bool {
        matches!(self.status, StageStatus::Written { .. })
    }
}

#[derive(Debug, Clone)]
pub struct InputOutcome {
    pub input: PathBuf,
    pub encoding: Option<String>,
    pub stages: Vec<StageReport>,
}

impl InputOutcome {
    pub fn failed_stage(&self) -> Option<&StageReport> {
        self.stages.iter().find(|stage| !stage.ok())
    }
}

/// Runs every stage for one input, each reading the previous stage's artifact from disk.
pub struct Pipeline<'a> {
    config: &'a ManhourConfig,
    paths: &'a ManhourPaths,
    sink: &'a mut dyn DiagnosticSink,
}

fn read_stage_input(path: &Path, purpose: &str) -> StageOutcome<Table> {
    table::read_tsv(path).map_err(|err| {
        StageError::unexpected(format!(
            "Error: unexpected exception while reading TSV for {purpose}. Detail = {err:#}"
        ))
    })
}

fn write_stage_output(path: &Path, table: &Table, purpose: &str) -> StageOutcome<usize> {
    table::write_tsv(path, table).map_err(|err| {
        StageError::unexpected(format!(
            "Error: unexpected exception while writing {purpose} TSV. Detail = {err:#}"
        ))
    })?;
    Ok(table.len())
}

/// Persists the outcome: the table on success, an error artifact in its place otherwise.
fn settle(stage: &'static str, path: &Path, outcome: StageOutcome<usize>) -> StageReport {
    let status = match outcome {
        Ok(rows) => {
            info!(stage, rows, path = %path.display(), "stage written");
            StageStatus::Written { rows }
        }
        Err(err) => {
            warn!(stage, kind = err.kind.as_str(), path = %path.display(), "{}", err.message);
            if let Err(write_err) = table::write_error_artifact(path, &err.message) {
                error!(stage, path = %path.display(), "failed to write error artifact: {write_err:#}");
            }
            StageStatus::Failed(err)
        }
    };
    StageReport {
        stage,
        path: path.to_path_buf(),
        status,
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a ManhourConfig,
        paths: &'a ManhourPaths,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            config,
            paths,
            sink,
        }
    }

    fn record(&mut self, phase: &str, message: String) {
        if let Err(err) = self.sink.record(DiagnosticEvent::now(phase, "error", message)) {
            error!("failed to record diagnostic: {err:#}");
        }
    }

    /// Decode and missing-input failures are recorded to the sink and raised; stage
    /// failures become error artifacts and stop this input's pipeline.
    pub fn process_input(&mut self, raw: &str) -> Result<InputOutcome, PipelineError> {
        let span = info_span!("input", source = %raw);
        let _enter = span.enter();

        let Some(input) = paths::resolve_input(raw, self.paths) else {
            self.record(
                "input",
                format!(
                    "Error: input file not found: {raw} CurrentDirectory: {}",
                    self.paths.cwd.display()
                ),
            );
            return Err(PipelineError::InputNotFound(raw.to_string()));
        };

        let month = paths::target_month_from_file_name(&input)?;
        let resolved = fs::canonicalize(&input).map_err(|source| PipelineError::Io {
            path: input.clone(),
            source,
        })?;
        let base_dir = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.paths.cwd.clone());
        let artifacts = ArtifactSet::new(&base_dir, &self.config.output.label, month);

        let decoded = match ingest::decode_source(&input, &self.config.ingest.encodings) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.record("decode", err.to_string());
                return Err(err);
            }
        };
        info!(encoding = %decoded.encoding, "source decoded");

        let mut outcome = InputOutcome {
            input: input.clone(),
            encoding: Some(decoded.encoding.clone()),
            stages: Vec::new(),
        };

        let ingested_path = artifacts.path(Artifact::Ingested);
        let ingested = ingest::write_ingested(&decoded, &ingested_path).map_err(|err| {
            StageError::unexpected(format!(
                "Error: unexpected exception while converting source csv. Detail = {err:#}"
            ))
        });
        if !push(&mut outcome, settle("ingest", &ingested_path, ingested)) {
            return Ok(outcome);
        }

        let sentinel = self.config.filter.sentinel.clone();
        let chain: [(&'static str, Artifact, Artifact, &str, StageFn<'_>); 5] = [
            (
                "remove_uninput",
                Artifact::Ingested,
                Artifact::RemovedUninput,
                "removing uninput rows",
                Box::new(move |t: &Table| completeness::remove_uninput_rows(t, &sentinel)),
            ),
            (
                "sort_staff_code",
                Artifact::RemovedUninput,
                Artifact::SortedStaffCode,
                "staff code sort",
                Box::new(sort::sort_by_staff_code),
            ),
            (
                "normalize_company",
                Artifact::SortedStaffCode,
                Artifact::NormalizedCompany,
                "company name normalization",
                Box::new(normalize::normalize_company_column),
            ),
            (
                "normalize_project",
                Artifact::NormalizedCompany,
                Artifact::NormalizedProject,
                "project normalization",
                Box::new(normalize::normalize_project_columns),
            ),
            (
                "remove_a_or_h",
                Artifact::NormalizedProject,
                Artifact::RemovedAhProject,
                "A/H removal",
                Box::new(exclusion::remove_excluded_projects),
            ),
        ];

        for (stage, from, to, purpose, transform) in chain {
            let target = artifacts.path(to);
            let result = read_stage_input(&artifacts.path(from), purpose)
                .and_then(|input| transform(&input))
                .and_then(|output| write_stage_output(&target, &output, purpose));
            if !push(&mut outcome, settle(stage, &target, result)) {
                return Ok(outcome);
            }
        }

        let org_report = convert_org_table(self.config, self.paths, &base_dir);
        let org_path = org_report.path.clone();
        if !push(&mut outcome, org_report) {
            return Ok(outcome);
        }

        for report in reconcile_artifacts(&artifacts, &org_path) {
            if !push(&mut outcome, report) {
                break;
            }
        }
        Ok(outcome)
    }
}

fn push(outcome: &mut InputOutcome, report: StageReport) -> bool {
    let ok = report.ok();
    outcome.stages.push(report);
    ok
}

type StageFn<'s> = Box<dyn Fn(&Table) -> StageOutcome<Table> + 's>;

/// Builds the normalized organization table artifact in `dir`.
pub fn convert_org_table(config: &ManhourConfig, paths: &ManhourPaths, dir: &Path) -> StageReport {
    let file_name = &config.org_table.file_name;
    let source = paths::discover_org_table_source(&paths.home, dir, file_name)
        .unwrap_or_else(|| dir.join(file_name));
    let target = paths::org_table_artifact_path(dir, file_name);

    let result = org_table::build_org_table(&source, &config.ingest.encodings)
        .and_then(|org| write_stage_output(&target, &org, "org table"));
    settle("org_table", &target, result)
}

fn reconcile_artifacts(artifacts: &ArtifactSet, org_path: &Path) -> Vec<StageReport> {
    let matched_path = artifacts.path(Artifact::Reconciled);
    let missing_path = artifacts.path(Artifact::MissingInOrgTable);

    let source = artifacts.path(Artifact::RemovedAhProject);
    let partitions = read_stage_input(&source, "company replacement").and_then(|target| {
        let org = read_stage_input(org_path, "org table mappings")?;
        let mappings = org_table::mapping_entries(&org)?;
        reconcile::reconcile_companies(&target, &mappings)
    });

    let parts = match partitions {
        Ok(parts) => parts,
        Err(err) => return vec![settle("reconcile_matched", &matched_path, Err(err))],
    };

    let matched = settle(
        "reconcile_matched",
        &matched_path,
        write_stage_output(&matched_path, &parts.matched, "company replaced"),
    );
    if !matched.ok() {
        return vec![matched];
    }
    if !parts.missing.is_empty() {
        warn!(rows = parts.missing.len(), "projects missing in org table");
    }
    let missing = settle(
        "reconcile_missing",
        &missing_path,
        write_stage_output(&missing_path, &parts.missing, "missing project list"),
    );
    vec![matched, missing]
}
