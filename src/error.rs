// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for geometry building

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hades-geom operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error, one variant per pipeline stage
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Gdml(#[from] GdmlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Configuration-validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("unsupported file format for {0:?} (expected .yaml, .yml, .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("cannot construct geometry from public testdata only, if not explicitly instructed")]
    PublicGeometryNotRequested,
}

/// Metadata-lookup failures
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata record {0} does not exist")]
    NotFound(String),

    #[error("detector {0} not found in the metadata")]
    DetectorNotFound(String),

    #[error(
        "the measurement {hpge}/{campaign}/{measurement} does not exist, \
         please check the configuration file and metadata"
    )]
    MeasurementNotFound {
        hpge: String,
        campaign: String,
        measurement: String,
    },

    #[error("run {run} not found in the metadata\navailable runs, runXXXX: [phi, r, z]\n{details}")]
    RunNotFound { run: String, details: String },

    #[error("{0}")]
    PositionNotFound(String),

    #[error("source position [{phi}, {r}, {z}] belongs to {matched}, but the configuration requests {requested}")]
    PositionMismatch {
        phi: f64,
        r: f64,
        z: f64,
        matched: String,
        requested: String,
    },

    #[error("malformed metadata record {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Geometry-construction failures
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("unknown detector type `{kind}` for detector {name}")]
    UnknownDetectorType { name: String, kind: String },

    #[error("unknown calibration source `{0}`")]
    UnknownSource(String),

    #[error("invalid geometry parameter: {0}")]
    InvalidParameter(String),

    #[error("{kind} `{name}` is already defined with a different definition")]
    NameCollision { kind: &'static str, name: String },

    #[error("{kind} `{name}` is not defined in the registry")]
    MissingReference { kind: &'static str, name: String },

    #[error("registry has no world volume")]
    NoWorld,
}

/// GDML reading/writing failures
#[derive(Error, Debug)]
pub enum GdmlError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("element <{element}> is missing attribute `{attribute}`")]
    MissingAttribute { element: String, attribute: String },

    #[error("cannot evaluate expression `{expression}`: {message}")]
    Expression { expression: String, message: String },

    #[error("unsupported GDML element <{0}>")]
    Unsupported(String),

    #[error("invalid GDML document: {0}")]
    Invalid(String),
}
