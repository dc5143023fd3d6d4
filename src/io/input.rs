use anyhow::{Context, Result};
use serde_json::Value;

use super::DocumentFormat;
use crate::value::FormValue;

/// Parse structured data in any supported format into a form value.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<FormValue> {
    let value = match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")?
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(contents)
            .with_context(|| "failed to parse YAML document")?,
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => {
            let parsed = contents
                .parse::<toml::Value>()
                .with_context(|| "failed to parse TOML document")?;
            serde_json::to_value(parsed).context("failed to convert TOML to JSON")?
        }
    };
    Ok(FormValue::from(value))
}
