//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "ARTDECK_LOG";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/artdeck/logs/<app>.log`, rotated daily.
/// The console and the web process use different `app` names so their logs
/// don't interleave.
///
/// # Examples
/// ```bash
/// ARTDECK_LOG=debug gui_workspace --launch
/// ARTDECK_LOG=artdeck_web=trace gui_workspace
/// ```
pub fn init(app: &str) -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender =
        RollingFileAppender::new(Rotation::DAILY, &log_dir, format!("{}.log", app));

    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("artdeck=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("Artdeck {} starting", app);
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Get the log directory path
pub fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("artdeck").join("logs")
}

/// Get the log file path of an app
pub fn get_log_file(app: &str) -> PathBuf {
    get_log_directory().join(format!("{}.log", app))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_inside_log_directory() {
        let file = get_log_file("console");
        assert_eq!(file.parent(), Some(get_log_directory().as_path()));
        assert!(file.ends_with("console.log"));
    }
}
