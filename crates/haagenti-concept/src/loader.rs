//! Loading prompt settings from YAML or JSON documents

use crate::settings::{resolve, PromptSettings, RawRecord};
use crate::{ConceptError, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Serialization format of a prompts document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptFormat {
    Yaml,
    Json,
}

impl PromptFormat {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Read a prompts file and resolve every record in it
pub fn load_prompts_from_file(path: impl AsRef<Path>) -> Result<Vec<PromptSettings>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let settings = parse_prompts(&text, PromptFormat::from_path(path))?;

    info!("Loaded {} prompts from {}", settings.len(), path.display());
    Ok(settings)
}

/// Parse a prompts document held in memory and resolve it
pub fn parse_prompts(text: &str, format: PromptFormat) -> Result<Vec<PromptSettings>> {
    let document: Value = match format {
        _ if text.trim().is_empty() => Value::Null,
        PromptFormat::Yaml => serde_yaml::from_str(text)?,
        PromptFormat::Json => serde_json::from_str(text)?,
    };

    resolve(&records(document)?)
}

fn records(document: Value) -> Result<Vec<RawRecord>> {
    let items = match document {
        Value::Null => return Err(ConceptError::EmptyConfig),
        Value::Array(items) => items,
        _ => {
            return Err(ConceptError::schema(
                0,
                "<document>",
                "expected a list of prompt records",
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(ConceptError::schema(
                index,
                "<record>",
                "expected a mapping of prompt fields",
            )),
        })
        .collect()
}
