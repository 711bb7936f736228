// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GDML serialization
//!
//! Lengths are written in mm and angles in rad. Reading accepts other
//! units and expressions over `<define>` constants.

mod reader;
mod writer;

pub use reader::{parse_gdml, parse_gdml_with_replacements, read_gdml, read_gdml_with_replacements};
pub use writer::{to_string, write_gdml};
