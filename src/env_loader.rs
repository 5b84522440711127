use std::env;
use std::path::PathBuf;

use crate::manhour::paths::executable_dir;

/// Which `.env` file, if any, ended up in the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvOutcome {
    Loaded(PathBuf),
    NotFound,
    Failed { path: PathBuf, reason: String },
}

/// Lookup order once neither `MANHOUR_ENV_FILE` nor a working-directory `.env` applies.
fn fallback_candidates(
    manhour_home: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
    user_home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    match manhour_home {
        Some(home) => out.push(home.join(".env")),
        None => out.extend(exe_dir.map(|dir| dir.join(".env"))),
    }
    out.extend(user_home.map(|home| home.join(".manhour").join(".env")));
    out
}

fn load_from(path: PathBuf) -> DotenvOutcome {
    match dotenvy::from_path(&path) {
        Ok(()) => DotenvOutcome::Loaded(path),
        Err(err) => DotenvOutcome::Failed {
            path,
            reason: err.to_string(),
        },
    }
}

/// Runs before logging is initialized, so the outcome is returned for the caller to report.
pub fn load_dotenv() -> DotenvOutcome {
    if let Some(explicit) = env::var_os("MANHOUR_ENV_FILE").filter(|v| !v.is_empty()) {
        return load_from(PathBuf::from(explicit));
    }
    if let Ok(path) = dotenvy::dotenv() {
        return DotenvOutcome::Loaded(path);
    }

    let candidates = fallback_candidates(
        env::var_os("MANHOUR_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from),
        executable_dir(),
        dirs::home_dir(),
    );
    match candidates.into_iter().find(|path| path.is_file()) {
        Some(path) => load_from(path),
        None => DotenvOutcome::NotFound,
    }
}
