use connectors::adapter::SourceKind;
use engine_core::retry::RetrySettings;
use model::core::data_type::ColumnSpec;
use serde::Deserialize;
use std::collections::BTreeMap;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Which direction records travel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Scheduled extraction posted to the collector.
    #[default]
    Push,
    /// Extraction on demand for authenticated HTTP clients.
    Pull,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    #[default]
    Generic,
    Fixed,
}

/// The `webServer` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebServerSection {
    /// `user:password`, as a client would put it before base64 encoding.
    pub credential: Option<String>,
    pub host: Option<String>,
    pub handler_timeout: Option<u64>,
    // Accepted for compatibility with existing files; the server relies on
    // the handler timeout alone.
    pub idle_timeout: Option<u64>,
    pub read_timeout: Option<u64>,
    pub write_timeout: Option<u64>,
}

/// The settings file exactly as written. Nothing here is validated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSettings {
    pub log_to: Option<String>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,

    pub mode: SyncMode,
    pub source_kind: SourceKind,
    #[serde(alias = "sourceCon")]
    pub ms_con: Option<String>,
    pub query_file: Option<String>,
    pub page_size: Option<usize>,

    pub restaurants: Vec<String>,
    pub cash_groups: Vec<String>,
    pub restaurant_column: Option<String>,
    pub cash_group_column: Option<String>,

    pub extraction: ExtractionMode,
    pub schema: Vec<ColumnSpec>,

    pub api_url: Option<String>,
    pub url_params: BTreeMap<String, String>,
    #[serde(rename = "scID")]
    pub sc_id: Option<String>,
    #[serde(rename = "saleLocationID")]
    pub sale_location_id: Option<String>,
    pub api_cmd_get_period: Option<String>,
    pub api_cmd_put_data: Option<String>,
    pub api_key: Option<String>,
    pub api_key_header: Option<String>,
    pub api_key_query_param: Option<String>,
    pub activation_time: Option<String>,
    pub retry: RetrySettings,
    pub request_timeout_ms: Option<u64>,

    pub web_server: Option<WebServerSection>,
}

impl RawSettings {
    /// Parses settings JSON, tolerating a leading UTF-8 byte order mark.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        serde_json::from_slice(bytes)
    }

    /// `urlParams` merged with the top-level `scID`/`saleLocationID` keys.
    /// Entries in `urlParams` win.
    pub fn url_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(id) = &self.sc_id {
            params.insert("scID".to_string(), id.clone());
        }
        if let Some(id) = &self.sale_location_id {
            params.insert("saleLocationID".to_string(), id.clone());
        }
        params.extend(self.url_params.clone());
        params
    }
}
