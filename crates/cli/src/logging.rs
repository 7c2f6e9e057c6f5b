use crate::error::CliError;
use engine_config::settings::logging::{LogSettings, LogTarget};
use std::fs::OpenOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. `RUST_LOG`, when set, wins over the
/// configured level. The returned guard flushes the file writer on drop and
/// must live as long as the process logs.
pub fn init(settings: &LogSettings) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_directive()));

    match &settings.target {
        LogTarget::Stdout => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stdout)
                .try_init()
                .map_err(|e| CliError::Logging(e.to_string()))?;
            Ok(None)
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| CliError::Logging(e.to_string()))?;
            Ok(Some(guard))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_config::settings::logging::LogLevel;

    #[test]
    fn file_target_is_created_and_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "previous run\n").unwrap();

        let settings = LogSettings {
            level: LogLevel::Info,
            target: LogTarget::File(path.clone()),
        };
        let guard = init(&settings).unwrap();
        tracing::error!("appended line");
        drop(guard);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("previous run\n"));
        assert!(text.contains("appended line"));
    }
}
