//! Prompt settings and default-filling resolution of raw prompt records

use crate::{ConceptError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// A raw prompt record as read from a prompts document
pub type RawRecord = Map<String, Value>;

/// Default guidance scale
pub const DEFAULT_GUIDANCE_SCALE: f32 = 1.0;

/// Default training resolution
pub const DEFAULT_RESOLUTION: u32 = 512;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: u32 = 1;

const KNOWN_FIELDS: [&str; 9] = [
    "target",
    "positive",
    "unconditional",
    "neutral",
    "action",
    "guidance_scale",
    "resolution",
    "dynamic_resolution",
    "batch_size",
];

/// What training does with the positive concept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Steer generation away from the concept
    #[default]
    Erase,
    /// Steer generation toward the concept
    Enhance,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Erase => "erase",
            Self::Enhance => "enhance",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ConceptError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "erase" => Ok(Self::Erase),
            "enhance" => Ok(Self::Enhance),
            other => Err(ConceptError::UnknownAction(other.to_string())),
        }
    }
}

/// Fully resolved settings for one concept-editing prompt.
///
/// Every field is filled once, at construction, from the keys present in
/// the raw record:
///
/// - `positive` defaults to `target`
/// - `unconditional` defaults to the empty prompt
/// - `neutral` defaults to the resolved `unconditional`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptSettings {
    target: String,
    positive: String,
    unconditional: String,
    neutral: String,
    action: Action,
    guidance_scale: f32,
    resolution: u32,
    dynamic_resolution: bool,
    batch_size: u32,
}

impl PromptSettings {
    /// Settings for `target` with every other field at its default
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            positive: target.clone(),
            target,
            unconditional: String::new(),
            neutral: String::new(),
            action: Action::default(),
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            resolution: DEFAULT_RESOLUTION,
            dynamic_resolution: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Validate one raw record and fill its defaults.
    ///
    /// `index` is the record's position in its batch and is only used for
    /// error reporting.
    pub fn from_record(index: usize, record: &RawRecord) -> Result<Self> {
        let target = string_field(index, record, "target")?.ok_or(ConceptError::MissingField {
            index,
            field: "target",
        })?;

        let positive = string_field(index, record, "positive")?.unwrap_or_else(|| target.clone());
        let unconditional = string_field(index, record, "unconditional")?.unwrap_or_default();
        let neutral =
            string_field(index, record, "neutral")?.unwrap_or_else(|| unconditional.clone());

        let action = match record.get("action") {
            None => Action::default(),
            Some(Value::String(s)) => s
                .parse::<Action>()
                .map_err(|e| ConceptError::schema(index, "action", e.to_string()))?,
            Some(other) => {
                return Err(ConceptError::schema(
                    index,
                    "action",
                    format!("expected string, got {}", type_name(other)),
                ))
            }
        };

        let guidance_scale =
            float_field(index, record, "guidance_scale")?.unwrap_or(DEFAULT_GUIDANCE_SCALE);
        let resolution =
            positive_int_field(index, record, "resolution")?.unwrap_or(DEFAULT_RESOLUTION);
        let dynamic_resolution = bool_field(index, record, "dynamic_resolution")?.unwrap_or(false);
        let batch_size =
            positive_int_field(index, record, "batch_size")?.unwrap_or(DEFAULT_BATCH_SIZE);

        for key in record.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                warn!("Record {}: ignoring unknown field '{}'", index, key);
            }
        }

        let settings = Self {
            target,
            positive,
            unconditional,
            neutral,
            action,
            guidance_scale,
            resolution,
            dynamic_resolution,
            batch_size,
        };
        debug!(
            "Resolved record {}: {} '{}' (scale {})",
            index, settings.action, settings.target, settings.guidance_scale
        );

        Ok(settings)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn positive(&self) -> &str {
        &self.positive
    }

    pub fn unconditional(&self) -> &str {
        &self.unconditional
    }

    pub fn neutral(&self) -> &str {
        &self.neutral
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn guidance_scale(&self) -> f32 {
        self.guidance_scale
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn dynamic_resolution(&self) -> bool {
        self.dynamic_resolution
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// The four prompt texts in target, positive, unconditional, neutral order
    pub fn prompts(&self) -> [&str; 4] {
        [
            &self.target,
            &self.positive,
            &self.unconditional,
            &self.neutral,
        ]
    }
}

/// Resolve a batch of raw records.
///
/// Fails on the first invalid record; no partial list is returned.
pub fn resolve(records: &[RawRecord]) -> Result<Vec<PromptSettings>> {
    if records.is_empty() {
        return Err(ConceptError::EmptyConfig);
    }

    let settings = records
        .iter()
        .enumerate()
        .map(|(index, record)| PromptSettings::from_record(index, record))
        .collect::<Result<Vec<_>>>()?;

    info!("Resolved {} prompt settings", settings.len());
    Ok(settings)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn string_field(index: usize, record: &RawRecord, field: &str) -> Result<Option<String>> {
    match record.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConceptError::schema(
            index,
            field,
            format!("expected string, got {}", type_name(other)),
        )),
    }
}

fn float_field(index: usize, record: &RawRecord, field: &str) -> Result<Option<f32>> {
    match record.get(field) {
        None => Ok(None),
        Some(Value::Number(n)) => {
            let value = n
                .as_f64()
                .map(|v| v as f32)
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    ConceptError::schema(index, field, format!("{} is not a finite float", n))
                })?;
            Ok(Some(value))
        }
        Some(other) => Err(ConceptError::schema(
            index,
            field,
            format!("expected number, got {}", type_name(other)),
        )),
    }
}

fn positive_int_field(index: usize, record: &RawRecord, field: &str) -> Result<Option<u32>> {
    match record.get(field) {
        None => Ok(None),
        Some(Value::Number(n)) => {
            let value = n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&v| v > 0)
                .ok_or_else(|| {
                    ConceptError::schema(index, field, format!("{} is not a positive integer", n))
                })?;
            Ok(Some(value))
        }
        Some(other) => Err(ConceptError::schema(
            index,
            field,
            format!("expected integer, got {}", type_name(other)),
        )),
    }
}

fn bool_field(index: usize, record: &RawRecord, field: &str) -> Result<Option<bool>> {
    match record.get(field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ConceptError::schema(
            index,
            field,
            format!("expected boolean, got {}", type_name(other)),
        )),
    }
}
