use crate::settings::file::RawSettings;
use std::path::PathBuf;

const DEFAULT_LOG_FILE: &str = "log.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Unset means debug; an unrecognized name falls back to info.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            None => LogLevel::Debug,
            Some(v) if v.is_empty() || v == "debug" => LogLevel::Debug,
            Some(v) if v == "info" => LogLevel::Info,
            Some(v) if v == "warn" || v == "warning" => LogLevel::Warn,
            Some(v) if v == "error" => LogLevel::Error,
            Some(_) => LogLevel::Info,
        }
    }

    /// Directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Appended to, created if missing.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub target: LogTarget,
}

impl LogSettings {
    pub fn from_raw(raw: &RawSettings) -> Self {
        let to_stdout = match raw.log_to.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(target) => target.eq_ignore_ascii_case("stdout"),
        };

        let target = if to_stdout {
            LogTarget::Stdout
        } else {
            let file = raw
                .log_file
                .as_deref()
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(DEFAULT_LOG_FILE);
            LogTarget::File(PathBuf::from(file))
        };

        LogSettings {
            level: LogLevel::from_setting(raw.log_level.as_deref()),
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_defaults() {
        assert_eq!(LogLevel::from_setting(None), LogLevel::Debug);
        assert_eq!(LogLevel::from_setting(Some("WARN")), LogLevel::Warn);
        assert_eq!(LogLevel::from_setting(Some("verbose")), LogLevel::Info);
    }

    #[test]
    fn anything_but_stdout_logs_to_file() {
        let raw = RawSettings {
            log_to: Some("file".into()),
            ..Default::default()
        };
        assert_eq!(
            LogSettings::from_raw(&raw).target,
            LogTarget::File(PathBuf::from("log.txt"))
        );

        let raw = RawSettings {
            log_to: Some("stdout".into()),
            log_file: Some("ignored.txt".into()),
            ..Default::default()
        };
        assert_eq!(LogSettings::from_raw(&raw).target, LogTarget::Stdout);
    }
}
