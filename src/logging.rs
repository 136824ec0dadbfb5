use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::GhtknError;

pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

pub fn parse_level(level: &str) -> Result<LevelFilter, GhtknError> {
    match level {
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(GhtknError::InvalidArgument(format!("unknown log level '{other}'"))),
    }
}

/// Install the stderr subscriber. An unknown level is reported and ignored.
pub fn init(level: Option<&str>) {
    let parsed = level.filter(|l| !l.is_empty()).map(parse_level);
    let filter = match &parsed {
        Some(Ok(level)) => *level,
        _ => DEFAULT_LEVEL,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::default().add_directive(filter.into()))
        .with_writer(std::io::stderr)
        .init();
    if let Some(Err(e)) = parsed {
        tracing::warn!(error = %e, "keeping the default log level");
    }
}
