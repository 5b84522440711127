use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::manhour::config::load_config;
use crate::manhour::paths::resolve_paths;
use crate::manhour::pipeline::convert_org_table;

#[derive(Debug, Clone)]
pub struct OrgTableOptions {
    pub dir: PathBuf,
}

pub fn run(opts: &OrgTableOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths.home)?;
    let mut report = CommandReport::new("org-table");

    let dir = opts
        .dir
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", opts.dir.display()))?;
    report.detail(format!("dir={}", dir.display()));
    report.detail(format!("source_name={}", cfg.org_table.file_name));

    let stage = convert_org_table(&cfg, &paths, &dir);
    report.stage(&cfg.org_table.file_name, &stage);
    Ok(report)
}
