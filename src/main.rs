mod cli;
mod commands;
mod env_loader;
mod error;
mod logging;
mod manhour;

use env_loader::DotenvOutcome;
use tracing::{debug, warn};

fn main() {
    let dotenv = env_loader::load_dotenv();
    logging::init_logging();
    match &dotenv {
        DotenvOutcome::Loaded(path) => debug!(path = %path.display(), "loaded .env"),
        DotenvOutcome::Failed { path, reason } => {
            warn!(path = %path.display(), "ignoring unreadable .env: {reason}")
        }
        DotenvOutcome::NotFound => {}
    }

    match cli::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
