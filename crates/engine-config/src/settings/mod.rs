pub mod endpoint;
pub mod file;
pub mod logging;

use crate::{
    error::SettingsError,
    settings::{
        endpoint::{bind_address, build_url, ensure_slash},
        file::{ExtractionMode, RawSettings, SyncMode},
        logging::LogSettings,
    },
};
use base64::{Engine, engine::general_purpose::STANDARD};
use connectors::{
    adapter::SourceKind,
    extract::ExtractionStrategy,
    sql::base::query::filter::{CASH_GROUP_COLUMN, RESTAURANT_COLUMN, SqlFilter},
};
use engine_core::{activation::ActivationTime, retry::RetryPolicy};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

const DEFAULT_QUERY_FILE: &str = "msQuery.sql";
const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_API_KEY_HEADER: &str = "api-token";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_HOST: &str = ":59000";
const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 5_000;

/// Where records come from and how they are shaped.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub connection: String,
    pub query_file: PathBuf,
    pub filter: SqlFilter,
    pub strategy: ExtractionStrategy,
}

/// Everything the push loop needs to talk to the collector.
#[derive(Debug, Clone)]
pub struct PushSettings {
    pub period_url: String,
    pub delivery_url: String,
    pub api_key: String,
    pub api_key_header: String,
    pub api_key_query_param: Option<String>,
    pub activation_time: ActivationTime,
    pub page_size: usize,
    pub request_timeout: Duration,
}

/// The pull server's listener and credential.
#[derive(Debug, Clone)]
pub struct PullSettings {
    pub bind_addr: String,
    /// base64 of `user:password`, compared against the Basic header.
    pub credential_token: String,
    pub handler_timeout: Duration,
}

/// Validated, immutable settings. Built once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: SyncMode,
    pub logging: LogSettings,
    pub source: SourceSettings,
    pub retry: RetryPolicy,
    pub push: Option<PushSettings>,
    pub pull: Option<PullSettings>,
}

impl Settings {
    /// Reads, parses and validates the settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let bytes = std::fs::read(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loading settings");
        Self::from_raw(RawSettings::parse(&bytes)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Self::from_raw(RawSettings::parse(text.as_bytes())?)
    }

    /// Validates the raw file for the configured mode and derives URLs,
    /// credential token and the SQL filter.
    pub fn from_raw(raw: RawSettings) -> Result<Self, SettingsError> {
        let connection = required(&raw.ms_con, "msCon")?;

        let page_size = raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(SettingsError::config("pageSize must be greater than zero"));
        }
        if raw.retry.attempts == 0 {
            return Err(SettingsError::config("retry.attempts must be at least 1"));
        }

        let strategy = match raw.extraction {
            ExtractionMode::Generic => ExtractionStrategy::Generic,
            ExtractionMode::Fixed if raw.schema.is_empty() => {
                return Err(SettingsError::config(
                    "schema must list at least one column when extraction is fixed",
                ));
            }
            ExtractionMode::Fixed => ExtractionStrategy::Fixed(raw.schema.clone()),
        };

        let filter = SqlFilter::from_allow_lists(
            raw.restaurant_column.as_deref().unwrap_or(RESTAURANT_COLUMN),
            &raw.restaurants,
            raw.cash_group_column.as_deref().unwrap_or(CASH_GROUP_COLUMN),
            &raw.cash_groups,
        );

        let source = SourceSettings {
            kind: raw.source_kind,
            connection,
            query_file: PathBuf::from(
                raw.query_file
                    .clone()
                    .unwrap_or_else(|| DEFAULT_QUERY_FILE.to_string()),
            ),
            filter,
            strategy,
        };

        let push = match raw.mode {
            SyncMode::Push => Some(push_settings(&raw, page_size)?),
            SyncMode::Pull => None,
        };
        let pull = match raw.mode {
            SyncMode::Pull => Some(pull_settings(&raw)?),
            SyncMode::Push => None,
        };

        Ok(Settings {
            mode: raw.mode,
            logging: LogSettings::from_raw(&raw),
            source,
            retry: raw.retry.into(),
            push,
            pull,
        })
    }
}

fn required(value: &Option<String>, key: &str) -> Result<String, SettingsError> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(SettingsError::config(format!("{key} not set"))),
    }
}

fn push_settings(raw: &RawSettings, page_size: usize) -> Result<PushSettings, SettingsError> {
    let api_url = required(&raw.api_url, "apiUrl")?;
    let cmd_period = required(&raw.api_cmd_get_period, "apiCmdGetPeriod")?;
    let cmd_data = required(&raw.api_cmd_put_data, "apiCmdPutData")?;
    let api_key = required(&raw.api_key, "apiKey")?;
    let activation_time = required(&raw.activation_time, "activationTime")?
        .parse::<ActivationTime>()
        .map_err(|e| SettingsError::config(e.to_string()))?;

    let base = build_url(&api_url, &raw.url_params())?;

    Ok(PushSettings {
        period_url: format!("{base}{}", ensure_slash(&cmd_period)),
        delivery_url: format!("{base}{}", ensure_slash(&cmd_data)),
        api_key,
        api_key_header: raw
            .api_key_header
            .clone()
            .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
        api_key_query_param: raw.api_key_query_param.clone().filter(|p| !p.is_empty()),
        activation_time,
        page_size,
        request_timeout: Duration::from_millis(
            raw.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        ),
    })
}

fn pull_settings(raw: &RawSettings) -> Result<PullSettings, SettingsError> {
    let web = raw
        .web_server
        .as_ref()
        .ok_or_else(|| SettingsError::config("webServer not set"))?;
    let credential = required(&web.credential, "webServer.credential")?;
    if !credential.contains(':') {
        return Err(SettingsError::config(
            "webServer.credential must have the form user:password",
        ));
    }

    Ok(PullSettings {
        bind_addr: bind_address(web.host.as_deref().unwrap_or(DEFAULT_HOST)),
        credential_token: STANDARD.encode(credential.as_bytes()),
        handler_timeout: Duration::from_millis(
            web.handler_timeout.unwrap_or(DEFAULT_HANDLER_TIMEOUT_MS),
        ),
    })
}

/// `<executable name>.json` in the working directory.
pub fn default_settings_path() -> PathBuf {
    let stem = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "tillsync".to_string());
    PathBuf::from(format!("{stem}.json"))
}
