use anyhow::Result;

use crate::commands::CommandReport;
use crate::error::PipelineError;
use crate::manhour::audit::AuditFileSink;
use crate::manhour::config::load_config;
use crate::manhour::paths::resolve_paths;
use crate::manhour::pipeline::Pipeline;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub inputs: Vec<String>,
}

/// Processes every input; one input failing never stops its siblings.
pub fn run(opts: &RunOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths.home).map_err(|err| PipelineError::Config(format!("{err:#}")))?;
    let mut report = CommandReport::new("run");

    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("label={}", cfg.output.label));
    report.detail(format!("encodings={}", cfg.ingest.encodings.join(",")));

    if opts.inputs.is_empty() {
        report.issue("no input files given");
        return Ok(report);
    }

    let mut sink = AuditFileSink::new(&paths.logs_dir);
    report.detail(format!("diagnostics={}", sink.path().display()));
    let mut pipeline = Pipeline::new(&cfg, &paths, &mut sink);
    for raw in &opts.inputs {
        match pipeline.process_input(raw) {
            Ok(outcome) => {
                report.detail(format!("{raw}: resolved={}", outcome.input.display()));
                if let Some(encoding) = &outcome.encoding {
                    report.detail(format!("{raw}: encoding={encoding}"));
                }
                for stage in &outcome.stages {
                    report.stage(raw, stage);
                }
                match outcome.failed_stage() {
                    Some(failed) => report.detail(format!("{raw}: stopped at {}", failed.stage)),
                    None => report.detail(format!("{raw}: complete")),
                }
            }
            Err(err) => {
                report.issue(format!(
                    "Error: failed to process input file: {raw}. Detail = {err}"
                ));
            }
        }
    }

    Ok(report)
}
