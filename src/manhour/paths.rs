use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct ManhourPaths {
    /// Where the pipeline keeps its config and the preferred org table source.
    pub home: PathBuf,
    pub logs_dir: PathBuf,
    pub cwd: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub(crate) fn executable_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    exe.parent().map(Path::to_path_buf)
}

pub fn resolve_paths() -> Result<ManhourPaths> {
    let cwd = env::current_dir()?;
    let home = env_or_default_path(
        "MANHOUR_HOME",
        executable_dir().unwrap_or_else(|| cwd.clone()),
    );
    let logs_dir = env_or_default_path("MANHOUR_LOGS_DIR", cwd.clone());

    Ok(ManhourPaths {
        home,
        logs_dir,
        cwd,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMonth {
    pub year: u32,
    pub month: u32,
}

static YEAR_MONTH_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2})\.(\d{1,2})\.csv$").expect("valid year/month regex"));

/// Reads the `yy.m.csv` / `yy.mm.csv` tail of a source file name.
pub fn target_month_from_file_name(path: &Path) -> Result<TargetMonth, PipelineError> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let invalid = || PipelineError::FileName(name.to_string());

    let caps = YEAR_MONTH_SUFFIX.captures(name).ok_or_else(invalid)?;
    let yy: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    Ok(TargetMonth {
        year: 2000 + yy,
        month,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Ingested,
    RemovedUninput,
    SortedStaffCode,
    NormalizedCompany,
    NormalizedProject,
    RemovedAhProject,
    Reconciled,
    MissingInOrgTable,
}

impl Artifact {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Ingested => "",
            Self::RemovedUninput => "_step0001_removed_uninput",
            Self::SortedStaffCode => "_step0002_removed_uninput_sorted_staff_code",
            Self::NormalizedCompany => "_step0003_normalized_company_name",
            Self::NormalizedProject => "_step0004_normalized_project_name",
            Self::RemovedAhProject => "_step0005_remove_A_or_H_project",
            Self::Reconciled => "_step0006_projects_replaced_by_管轄PJ表",
            Self::MissingInOrgTable => "_step0006_projects_missing_in_管轄PJ表",
        }
    }
}

/// Artifact locations for one source file: `<dir>/<label>_<yyyy>年<mm>月<suffix>.tsv`.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub base_dir: PathBuf,
    pub stem: String,
}

impl ArtifactSet {
    pub fn new(base_dir: &Path, label: &str, month: TargetMonth) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            stem: format!("{label}_{}年{:02}月", month.year, month.month),
        }
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.base_dir
            .join(format!("{}{}.tsv", self.stem, artifact.suffix()))
    }
}

fn with_csv_extension(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw);
    let is_tsv = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
    is_tsv.then(|| path.with_extension("csv"))
}

/// Candidate locations for a source argument, in lookup order.
pub fn input_candidates(raw: &str, paths: &ManhourPaths) -> Vec<PathBuf> {
    let input_dir = paths.cwd.join("input");
    let mut out = vec![
        PathBuf::from(raw),
        paths.home.join(raw),
        input_dir.join(raw),
    ];
    if let Some(csv) = with_csv_extension(raw) {
        let csv_name = csv.file_name().map(PathBuf::from).unwrap_or_default();
        out.push(csv);
        out.push(paths.home.join(&csv_name));
        out.push(input_dir.join(&csv_name));
    }
    out
}

pub fn resolve_input(raw: &str, paths: &ManhourPaths) -> Option<PathBuf> {
    input_candidates(raw, paths)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// Pipeline home first, then the input's own directory.
pub fn discover_org_table_source(
    home: &Path,
    input_dir: &Path,
    file_name: &str,
) -> Option<PathBuf> {
    [home.join(file_name), input_dir.join(file_name)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

pub fn org_table_artifact_path(input_dir: &Path, file_name: &str) -> PathBuf {
    input_dir.join(Path::new(file_name).with_extension("tsv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn target_month_accepts_one_and_two_digit_months() {
        let got = target_month_from_file_name(Path::new("/x/manhour_25.1.csv")).expect("parse");
        assert_eq!(got, TargetMonth { year: 2025, month: 1 });
        let got = target_month_from_file_name(Path::new("jobcan 24.12.csv")).expect("parse");
        assert_eq!(got, TargetMonth { year: 2024, month: 12 });
    }

    #[test]
    fn target_month_rejects_other_names() {
        assert!(matches!(
            target_month_from_file_name(Path::new("manhour.csv")),
            Err(PipelineError::FileName(_))
        ));
        assert!(target_month_from_file_name(Path::new("manhour_25.1.tsv")).is_err());
    }

    #[test]
    fn artifact_names_share_the_month_stem() {
        let set = ArtifactSet::new(
            Path::new("/data"),
            "工数",
            TargetMonth { year: 2025, month: 3 },
        );
        assert_eq!(set.path(Artifact::Ingested), PathBuf::from("/data/工数_2025年03月.tsv"));
        assert_eq!(
            set.path(Artifact::SortedStaffCode),
            PathBuf::from("/data/工数_2025年03月_step0002_removed_uninput_sorted_staff_code.tsv")
        );
        assert_eq!(
            set.path(Artifact::MissingInOrgTable),
            PathBuf::from("/data/工数_2025年03月_step0006_projects_missing_in_管轄PJ表.tsv")
        );
    }

    #[test]
    fn tsv_argument_falls_back_to_csv_candidates() {
        let paths = ManhourPaths {
            home: PathBuf::from("/home"),
            logs_dir: PathBuf::from("/logs"),
            cwd: PathBuf::from("/work"),
        };
        let got = input_candidates("m_25.1.tsv", &paths);
        assert_eq!(got.len(), 6);
        assert_eq!(got[3], PathBuf::from("m_25.1.csv"));
        assert_eq!(got[5], PathBuf::from("/work/input/m_25.1.csv"));
    }

    #[test]
    fn resolve_input_uses_cwd_input_dir() {
        let tmp = tempdir().expect("tempdir");
        let input_dir = tmp.path().join("input");
        fs::create_dir_all(&input_dir).expect("mkdir");
        fs::write(input_dir.join("m_25.1.csv"), "a\n").expect("write");
        let paths = ManhourPaths {
            home: tmp.path().join("home"),
            logs_dir: tmp.path().to_path_buf(),
            cwd: tmp.path().to_path_buf(),
        };
        assert_eq!(
            resolve_input("m_25.1.csv", &paths),
            Some(input_dir.join("m_25.1.csv"))
        );
        assert_eq!(resolve_input("absent_25.1.csv", &paths), None);
    }

    #[test]
    fn org_table_prefers_home_copy() {
        let tmp = tempdir().expect("tempdir");
        let home = tmp.path().join("home");
        let input_dir = tmp.path().join("in");
        fs::create_dir_all(&home).expect("mkdir home");
        fs::create_dir_all(&input_dir).expect("mkdir in");
        fs::write(input_dir.join("org.csv"), "x\n").expect("write in");

        assert_eq!(
            discover_org_table_source(&home, &input_dir, "org.csv"),
            Some(input_dir.join("org.csv"))
        );
        fs::write(home.join("org.csv"), "x\n").expect("write home");
        assert_eq!(
            discover_org_table_source(&home, &input_dir, "org.csv"),
            Some(home.join("org.csv"))
        );
    }
}
