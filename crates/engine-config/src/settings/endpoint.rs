use crate::error::SettingsError;
use std::collections::BTreeMap;

/// Appends `/` unless the text already ends with one.
pub fn ensure_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Slash-terminated base URL with every `{{name}}` replaced from `params`.
/// A placeholder left without a value is a configuration error.
pub fn build_url(
    api_url: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, SettingsError> {
    let mut url = ensure_slash(api_url);
    for (name, value) in params {
        url = url.replace(&format!("{{{{{name}}}}}"), value);
    }

    if let Some(start) = url.find("{{") {
        let end = url[start..]
            .find("}}")
            .map(|offset| start + offset + 2)
            .unwrap_or(url.len());
        return Err(SettingsError::config(format!(
            "apiUrl placeholder {} has no value in urlParams",
            &url[start..end]
        )));
    }

    Ok(url)
}

/// `:PORT` listens on every interface; anything else is used as given.
pub fn bind_address(host: &str) -> String {
    match host.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => host.to_string(),
    }
}
