// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Measurement configuration record

use super::loader::load_dict;
use super::measurement::{parse_measurement, MeasurementInfo};
use crate::error::ConfigError;
use crate::hades::Assembly;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Campaign used when the configuration does not name one
pub const DEFAULT_CAMPAIGN: &str = "c1";

/// Run number, displayed as `run0001`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u32);

impl RunId {
    /// Parse `run0001`, `r0001` or a plain number
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("run")
            .or_else(|| s.strip_prefix('r'))
            .unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(RunId)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run{:04}", self.0)
    }
}

/// Source placement in the metadata frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub phi_in_deg: f64,
    pub r_in_mm: f64,
    pub z_in_mm: f64,
}

impl SourcePosition {
    pub fn new(phi_in_deg: f64, r_in_mm: f64, z_in_mm: f64) -> Self {
        Self {
            phi_in_deg,
            r_in_mm,
            z_in_mm,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.phi_in_deg, self.r_in_mm, self.z_in_mm)
    }
}

/// Data acquisition settings, kept as a nested key-value tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaqSettings(pub Map<String, Value>);

impl DaqSettings {
    /// Look up a nested string value by dotted path, e.g. `flashcam.card_interface`
    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        let mut keys = dotted.split('.');
        let mut current = self.0.get(keys.next()?)?;
        for key in keys {
            current = current.get(key)?;
        }
        current.as_str()
    }

    /// FlashCam card interface, which identifies the lead castle table
    pub fn card_interface(&self) -> Option<&str> {
        self.get_str("flashcam.card_interface")
    }
}

/// One geometry-build invocation
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    pub hpge_name: String,
    pub campaign: String,
    pub measurement: MeasurementInfo,
    pub run: RunId,
    pub source_position: Option<SourcePosition>,
    pub daq_settings: DaqSettings,
    pub assemblies: BTreeSet<Assembly>,
    pub models: BTreeMap<Assembly, PathBuf>,
}

impl GeometryConfig {
    /// Minimal configuration with default campaign and all assemblies
    pub fn new(hpge_name: &str, measurement: &str, run: RunId) -> Result<Self, ConfigError> {
        Ok(Self {
            hpge_name: hpge_name.to_string(),
            campaign: DEFAULT_CAMPAIGN.to_string(),
            measurement: parse_measurement(measurement)?,
            run,
            source_position: None,
            daq_settings: DaqSettings::default(),
            assemblies: Assembly::all(),
            models: BTreeMap::new(),
        })
    }

    /// Load a configuration file; model paths are resolved against its directory
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_value(&load_dict(path)?)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for model in config.models.values_mut() {
            if model.is_relative() {
                *model = base.join(&*model);
            }
        }

        tracing::debug!(path = %path.display(), hpge = %config.hpge_name, "loaded configuration");
        Ok(config)
    }

    /// Validate a parsed document
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let obj = value.as_object().ok_or_else(|| ConfigError::InvalidField {
            field: "config",
            message: "top level must be a mapping".into(),
        })?;

        let hpge_name = required_string(obj, "hpge_name")?;
        let measurement = parse_measurement(&required_string(obj, "measurement")?)?;
        let run = parse_run(obj.get("run"))?;

        let campaign = match obj.get("campaign") {
            None | Some(Value::Null) => DEFAULT_CAMPAIGN.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(other) => {
                return Err(ConfigError::InvalidField {
                    field: "campaign",
                    message: format!("expected a non-empty string, got {}", other),
                })
            }
        };

        let source_position = match obj.get("source_position") {
            None | Some(Value::Null) => None,
            Some(v) => Some(serde_json::from_value::<SourcePosition>(v.clone()).map_err(|e| {
                ConfigError::InvalidField {
                    field: "source_position",
                    message: e.to_string(),
                }
            })?),
        };

        let daq_settings = match obj.get("daq_settings") {
            None | Some(Value::Null) => DaqSettings::default(),
            Some(Value::Object(map)) => DaqSettings(map.clone()),
            Some(other) => {
                return Err(ConfigError::InvalidField {
                    field: "daq_settings",
                    message: format!("expected a mapping, got {}", other),
                })
            }
        };

        let assemblies = match obj.get("assemblies") {
            None | Some(Value::Null) => Assembly::all(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| parse_assembly(item, "assemblies"))
                .collect::<Result<BTreeSet<_>, _>>()?,
            Some(other) => {
                return Err(ConfigError::InvalidField {
                    field: "assemblies",
                    message: format!("expected a list, got {}", other),
                })
            }
        };

        let mut models = BTreeMap::new();
        match obj.get("models") {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (key, path) in map {
                    let assembly =
                        Assembly::from_str(key).ok_or_else(|| ConfigError::InvalidField {
                            field: "models",
                            message: format!("unknown assembly `{}`", key),
                        })?;
                    let path = path.as_str().ok_or_else(|| ConfigError::InvalidField {
                        field: "models",
                        message: format!("model path for `{}` must be a string", key),
                    })?;
                    models.insert(assembly, PathBuf::from(path));
                }
            }
            Some(other) => {
                return Err(ConfigError::InvalidField {
                    field: "models",
                    message: format!("expected a mapping, got {}", other),
                })
            }
        }

        Ok(Self {
            hpge_name,
            campaign,
            measurement,
            run,
            source_position,
            daq_settings,
            assemblies,
            models,
        })
    }

    pub fn with_assemblies(mut self, assemblies: impl IntoIterator<Item = Assembly>) -> Self {
        self.assemblies = assemblies.into_iter().collect();
        self
    }

    pub fn with_source_position(mut self, position: SourcePosition) -> Self {
        self.source_position = Some(position);
        self
    }

    pub fn with_card_interface(mut self, card_interface: &str) -> Self {
        let mut flashcam = Map::new();
        flashcam.insert("card_interface".into(), Value::String(card_interface.into()));
        self.daq_settings.0.insert("flashcam".into(), Value::Object(flashcam));
        self
    }

    pub fn has(&self, assembly: Assembly) -> bool {
        self.assemblies.contains(&assembly)
    }
}

fn required_string(obj: &Map<String, Value>, field: &'static str) -> Result<String, ConfigError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ConfigError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ConfigError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(ConfigError::InvalidField {
            field,
            message: format!("expected a string, got {}", other),
        }),
    }
}

fn parse_run(value: Option<&Value>) -> Result<RunId, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidField {
        field: "run",
        message,
    };
    match value {
        None | Some(Value::Null) => Err(ConfigError::MissingField("run")),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ConfigError::MissingField("run")),
        Some(Value::String(s)) => {
            RunId::parse(s).ok_or_else(|| invalid(format!("cannot parse run `{}`", s)))
        }
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(RunId)
            .ok_or_else(|| invalid(format!("run must be a non-negative integer, got {}", n))),
        Some(other) => Err(invalid(format!("expected a run number, got {}", other))),
    }
}

fn parse_assembly(item: &Value, field: &'static str) -> Result<Assembly, ConfigError> {
    item.as_str()
        .and_then(Assembly::from_str)
        .ok_or_else(|| ConfigError::InvalidField {
            field,
            message: format!("unknown assembly {}", item),
        })
}
