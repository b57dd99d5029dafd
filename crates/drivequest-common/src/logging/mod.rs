//! Logging initialization shared by the DriveQuest binaries
//!
//! Filter selection follows this priority order:
//! 1. CLI flags (`-v/-q`) - highest priority
//! 2. RUST_LOG environment variable
//! 3. Binary-specific defaults - lowest priority

use anyhow::Result;
use clap_verbosity_flag::{LogLevel, Verbosity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter used by the `drivequest` binary when nothing else is set.
pub const DEFAULT_FILTER: &str = "drivequest=info,drivequest_rentals=info";

/// Initialize logging with the specified verbosity level and default filter.
///
/// # Arguments
///
/// * `verbosity` - The verbosity flags from clap (-v/-q)
/// * `default_filter` - The default filter string if no CLI flags or RUST_LOG are set
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use clap_verbosity_flag::{Verbosity, InfoLevel};
/// use drivequest_common::logging;
///
/// #[derive(Parser)]
/// struct Args {
///     #[clap(flatten)]
///     verbosity: Verbosity<InfoLevel>,
/// }
///
/// let args = Args::parse();
/// logging::init_logging(&args.verbosity, logging::DEFAULT_FILTER).unwrap();
/// ```
pub fn init_logging<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<()> {
    let cli_level = verbosity.log_level().map(|level| level.to_string());
    let filter = build_filter(cli_level.as_deref(), default_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();

    Ok(())
}

/// Resolve the effective filter without installing a subscriber.
fn build_filter(cli_level: Option<&str>, default_filter: &str) -> Result<EnvFilter> {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level.to_lowercase())?,
        None => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
        }
    };
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_takes_priority() {
        let filter = build_filter(Some("DEBUG"), "drivequest=warn").unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_default_filter_is_parseable() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
