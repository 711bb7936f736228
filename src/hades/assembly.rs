// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Test stand components that can be switched on and off

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A separately constructible part of the test stand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assembly {
    Cryostat,
    VacuumCavity,
    Detector,
    Wrap,
    Holder,
    BottomPlate,
    LeadCastle,
    Source,
    SourceHolder,
}

impl Assembly {
    pub const ALL: [Assembly; 9] = [
        Assembly::Cryostat,
        Assembly::VacuumCavity,
        Assembly::Detector,
        Assembly::Wrap,
        Assembly::Holder,
        Assembly::BottomPlate,
        Assembly::LeadCastle,
        Assembly::Source,
        Assembly::SourceHolder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Assembly::Cryostat => "cryostat",
            Assembly::VacuumCavity => "vacuum_cavity",
            Assembly::Detector => "detector",
            Assembly::Wrap => "wrap",
            Assembly::Holder => "holder",
            Assembly::BottomPlate => "bottom_plate",
            Assembly::LeadCastle => "lead_castle",
            Assembly::Source => "source",
            Assembly::SourceHolder => "source_holder",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cryostat" => Some(Assembly::Cryostat),
            "vacuum_cavity" | "cavity" => Some(Assembly::VacuumCavity),
            "detector" | "hpge" => Some(Assembly::Detector),
            "wrap" => Some(Assembly::Wrap),
            "holder" => Some(Assembly::Holder),
            "bottom_plate" => Some(Assembly::BottomPlate),
            "lead_castle" => Some(Assembly::LeadCastle),
            "source" => Some(Assembly::Source),
            "source_holder" => Some(Assembly::SourceHolder),
            _ => None,
        }
    }

    /// Every assembly, the default selection
    pub fn all() -> BTreeSet<Assembly> {
        Self::ALL.into_iter().collect()
    }
}

impl std::fmt::Display for Assembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
