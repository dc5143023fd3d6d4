use anyhow::{Context, Result};
use serde_json::Value;

use super::DocumentFormat;
use crate::{form::Payload, value::FormValue};

/// Serialize a form value in the requested format.
pub fn serialize_value(value: &FormValue, format: DocumentFormat, pretty: bool) -> Result<String> {
    serialize_json(&value.to_json(), format, pretty)
}

/// Serialize a change snapshot (value, errors and counters).
pub fn serialize_payload(payload: &Payload, format: DocumentFormat, pretty: bool) -> Result<String> {
    let value = serde_json::to_value(payload).context("failed to encode payload")?;
    serialize_json(&value, format, pretty)
}

fn serialize_json(value: &Value, format: DocumentFormat, pretty: bool) -> Result<String> {
    match format {
        DocumentFormat::Json => {
            if pretty {
                serde_json::to_string_pretty(value).context("failed to serialize JSON")
            } else {
                serde_json::to_string(value).context("failed to serialize JSON")
            }
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("failed to serialize YAML"),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => {
            if pretty {
                toml::to_string_pretty(value).context("failed to serialize TOML")
            } else {
                toml::to_string(value).context("failed to serialize TOML")
            }
        }
    }
}
