pub mod config;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, ValidationOptions};
pub use pipeline::record::InterpretationRecord;
pub use pipeline::safety::{
    check_candidate, validate_for_client, CandidateReport, ClientResponse, ResponseValidator,
    ValidationResult,
};

/// Install the global tracing subscriber. Filter comes from `RUST_LOG`, else
/// `config::default_log_filter()`. Safe to call more than once.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} safety pipeline v{}", config::APP_NAME, config::APP_VERSION);
    }
}
