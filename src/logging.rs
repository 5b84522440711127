use tracing_subscriber::{EnvFilter, fmt};

/// Stderr-only so stdout stays reserved for the command report.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("manhour_sheet=info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
