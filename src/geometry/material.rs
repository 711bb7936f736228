// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Materials

use serde::{Deserialize, Serialize};

/// Density of natural germanium in g/cm3
pub const NATURAL_GERMANIUM_DENSITY: f64 = 5.323;
/// Molar mass of natural germanium in g/mol
pub const NATURAL_GERMANIUM_MOLAR_MASS: f64 = 72.630;
const GE76_MOLAR_MASS: f64 = 75.921_402_7;
const GE74_MOLAR_MASS: f64 = 73.921_177_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialState {
    Solid,
    Liquid,
    Gas,
}

impl MaterialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialState::Solid => "solid",
            MaterialState::Liquid => "liquid",
            MaterialState::Gas => "gas",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "solid" => Some(MaterialState::Solid),
            "liquid" => Some(MaterialState::Liquid),
            "gas" => Some(MaterialState::Gas),
            _ => None,
        }
    }
}

/// Material defined by mass fractions of other materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mixture {
    pub name: String,
    pub density_g_cm3: f64,
    pub state: MaterialState,
    pub fractions: Vec<(String, f64)>,
}

/// A material known to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Resolved by name from the NIST database of the simulation
    Nist(String),
    Mixture(Mixture),
}

impl Material {
    pub fn nist(name: &str) -> Self {
        Material::Nist(name.to_string())
    }

    pub fn name(&self) -> &str {
        match self {
            Material::Nist(name) => name,
            Material::Mixture(m) => &m.name,
        }
    }

    pub fn is_predefined(&self) -> bool {
        matches!(self, Material::Nist(_))
    }

    /// Germanium enriched in 76Ge, the remainder being 74Ge.
    ///
    /// Without an enrichment value natural germanium is used.
    pub fn germanium(enrichment: Option<f64>) -> Self {
        match enrichment {
            None => Material::nist("G4_Ge"),
            Some(fraction) => {
                let molar_mass = fraction * GE76_MOLAR_MASS + (1.0 - fraction) * GE74_MOLAR_MASS;
                Material::Mixture(Mixture {
                    name: format!("EnrichedGermanium{:.3}", fraction),
                    density_g_cm3: NATURAL_GERMANIUM_DENSITY * molar_mass
                        / NATURAL_GERMANIUM_MOLAR_MASS,
                    state: MaterialState::Solid,
                    fractions: vec![("G4_Ge".to_string(), 1.0)],
                })
            }
        }
    }
}
