// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structured document loading (YAML, JSON, TOML)

use crate::error::ConfigError;
use serde_json::Value;
use std::path::Path;

/// Supported on-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Load a structured document into a generic value tree
pub fn load_dict(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_dict(&content, format).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse document text of a known format
pub fn parse_dict(content: &str, format: DocumentFormat) -> Result<Value, String> {
    let value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())?,
        DocumentFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string())?,
        DocumentFormat::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string())?,
    };

    // An empty YAML document parses to null
    Ok(if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    })
}
