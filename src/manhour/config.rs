use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub label: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            label: "工数".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub encodings: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            encodings: vec!["utf-8-sig".to_string(), "windows-31j".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub sentinel: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sentinel: "未入力".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgTableConfig {
    /// Companion CSV name; the normalized artifact uses the same stem with `.tsv`.
    pub file_name: String,
}

impl Default for OrgTableConfig {
    fn default() -> Self {
        Self {
            file_name: "管轄PJ表.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ManhourConfig {
    pub output: OutputConfig,
    pub ingest: IngestConfig,
    pub filter: FilterConfig,
    pub org_table: OrgTableConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialManhourConfig {
    output: Option<OutputConfig>,
    ingest: Option<IngestConfig>,
    filter: Option<FilterConfig>,
    org_table: Option<OrgTableConfig>,
}

fn override_string(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

/// Comma list; a value with no non-empty items keeps `fallback`.
fn override_list(value: Option<String>, fallback: &[String]) -> Vec<String> {
    let items = value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    if items.is_empty() {
        fallback.to_vec()
    } else {
        items
    }
}

fn apply_env_overrides(cfg: &mut ManhourConfig, lookup: impl Fn(&str) -> Option<String>) {
    cfg.output.label = override_string(lookup("MANHOUR_LABEL"), &cfg.output.label);
    cfg.ingest.encodings = override_list(lookup("MANHOUR_ENCODINGS"), &cfg.ingest.encodings);
    cfg.filter.sentinel = override_string(lookup("MANHOUR_SENTINEL"), &cfg.filter.sentinel);
    cfg.org_table.file_name =
        override_string(lookup("MANHOUR_ORG_TABLE_FILE"), &cfg.org_table.file_name);
}

fn validate(cfg: &ManhourConfig) -> Result<()> {
    if cfg.output.label.trim().is_empty() {
        return Err(anyhow!("invalid output label: cannot be empty"));
    }
    if cfg.output.label.contains(['/', '\\']) {
        return Err(anyhow!("invalid output label: must not contain path separators"));
    }
    if cfg.ingest.encodings.is_empty() {
        return Err(anyhow!("invalid ingest encodings: need at least one"));
    }
    for label in &cfg.ingest.encodings {
        if crate::manhour::ingest::resolve_encoding(label).is_none() {
            return Err(anyhow!("invalid ingest encoding label: {label}"));
        }
    }
    if cfg.filter.sentinel.trim().is_empty() {
        return Err(anyhow!("invalid filter sentinel: cannot be empty"));
    }
    let org = Path::new(&cfg.org_table.file_name);
    if cfg.org_table.file_name.trim().is_empty() || org.components().count() != 1 {
        return Err(anyhow!(
            "invalid org table file name: use a bare file name like `管轄PJ表.csv`"
        ));
    }
    Ok(())
}

fn resolve_config_path(home: &Path) -> PathBuf {
    if let Ok(custom) = env::var("MANHOUR_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    home.join("manhour.toml")
}

fn merge_file_config(base: &mut ManhourConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialManhourConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse manhour config {}: {err}", path.display()))?;
    if let Some(output) = parsed.output {
        base.output = output;
    }
    if let Some(ingest) = parsed.ingest {
        base.ingest = ingest;
    }
    if let Some(filter) = parsed.filter {
        base.filter = filter;
    }
    if let Some(org_table) = parsed.org_table {
        base.org_table = org_table;
    }
    Ok(())
}

/// Defaults, then `manhour.toml` under the pipeline home, then `MANHOUR_*` env overrides.
pub fn load_config(home: &Path) -> Result<ManhourConfig> {
    let mut cfg = ManhourConfig::default();
    merge_file_config(&mut cfg, &resolve_config_path(home))?;

    apply_env_overrides(&mut cfg, |var| env::var(var).ok());

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn defaults_validate() {
        validate(&ManhourConfig::default()).expect("defaults are valid");
    }

    #[test]
    fn file_sections_override_defaults_independently() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("manhour.toml");
        fs::write(&path, "[filter]\nsentinel = \"N/A\"\n").expect("write config");

        let mut cfg = ManhourConfig::default();
        merge_file_config(&mut cfg, &path).expect("merge");
        assert_eq!(cfg.filter.sentinel, "N/A");
        assert_eq!(cfg.output.label, "工数");
        assert_eq!(cfg.ingest.encodings.len(), 2);
    }

    #[test]
    fn malformed_file_is_reported() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("manhour.toml");
        fs::write(&path, "[filter\n").expect("write config");

        let mut cfg = ManhourConfig::default();
        let err = merge_file_config(&mut cfg, &path).expect_err("parse error");
        assert!(err.to_string().contains("failed to parse manhour config"));
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| owned.get(var).cloned()
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut cfg = ManhourConfig::default();
        cfg.output.label = "from-file".to_string();
        apply_env_overrides(
            &mut cfg,
            lookup_from(&[
                ("MANHOUR_LABEL", " envlabel "),
                ("MANHOUR_ENCODINGS", "windows-31j, utf-8-sig"),
                ("MANHOUR_SENTINEL", "TBD"),
                ("MANHOUR_ORG_TABLE_FILE", "org.csv"),
            ]),
        );

        assert_eq!(cfg.output.label, "envlabel");
        assert_eq!(cfg.ingest.encodings, vec!["windows-31j", "utf-8-sig"]);
        assert_eq!(cfg.filter.sentinel, "TBD");
        assert_eq!(cfg.org_table.file_name, "org.csv");
        validate(&cfg).expect("overridden config is valid");
    }

    #[test]
    fn blank_env_values_keep_configured_values() {
        let mut cfg = ManhourConfig::default();
        cfg.ingest.encodings = vec!["utf-8".to_string()];
        apply_env_overrides(
            &mut cfg,
            lookup_from(&[("MANHOUR_ENCODINGS", " , ,"), ("MANHOUR_SENTINEL", "   ")]),
        );
        assert_eq!(cfg.ingest.encodings, vec!["utf-8"]);
        assert_eq!(cfg.filter.sentinel, "未入力");

        apply_env_overrides(&mut cfg, lookup_from(&[("MANHOUR_ENCODINGS", "")]));
        assert_eq!(cfg.ingest.encodings, vec!["utf-8"]);
        assert_eq!(cfg.output.label, "工数");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let mut cfg = ManhourConfig::default();
        cfg.ingest.encodings = vec!["klingon".to_string()];
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn org_table_name_must_be_bare() {
        let mut cfg = ManhourConfig::default();
        cfg.org_table.file_name = "../x.csv".to_string();
        assert!(validate(&cfg).is_err());
    }
}
