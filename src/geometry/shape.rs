// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Solid shapes and placements
//!
//! Lengths are in millimetres and angles in radians. Box and tube lengths
//! are full lengths, centred on the local origin.

use crate::error::GeometryError;
use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Position and orientation of a volume inside its mother.
///
/// `rotation` holds GDML rotation angles, which describe the inverse of
/// the rotation applied to the daughter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vector3<f64>,
    pub rotation: Vector3<f64>,
}

impl Placement {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
        }
    }

    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            rotation: Vector3::zeros(),
        }
    }

    /// Rotate the daughter by `active` (daughter frame to mother frame)
    pub fn with_active_rotation(mut self, active: Rotation3<f64>) -> Self {
        let (x, y, z) = active.inverse().euler_angles();
        self.rotation = Vector3::new(x, y, z);
        self
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation != Vector3::zeros()
    }

    /// Rotation taking daughter coordinates to mother coordinates
    pub fn active_rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(self.rotation.x, self.rotation.y, self.rotation.z).inverse()
    }

    pub fn to_parent(&self, point: &Point3<f64>) -> Point3<f64> {
        self.active_rotation() * point + self.position
    }

    pub fn to_local(&self, point: &Point3<f64>) -> Point3<f64> {
        self.active_rotation().inverse() * (point - self.position)
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.position) * self.active_rotation().to_homogeneous()
    }

    /// Compare with a tolerance on position (mm) and angles (rad)
    pub fn approx_eq(&self, other: &Placement, tolerance: f64) -> bool {
        (self.position - other.position).amax() < tolerance
            && (self.rotation - other.rotation).amax() < tolerance
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}

/// One z-plane of a polycone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZPlane {
    pub z: f64,
    pub rmin: f64,
    pub rmax: f64,
}

/// One corner of a generic polycone outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RzPoint {
    pub r: f64,
    pub z: f64,
}

impl RzPoint {
    pub fn new(r: f64, z: f64) -> Self {
        Self { r, z }
    }
}

/// Supported solid shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box {
        x: f64,
        y: f64,
        z: f64,
    },
    Tube {
        rmin: f64,
        rmax: f64,
        z: f64,
        startphi: f64,
        deltaphi: f64,
    },
    Polycone {
        startphi: f64,
        deltaphi: f64,
        planes: Vec<ZPlane>,
    },
    GenericPolycone {
        startphi: f64,
        deltaphi: f64,
        points: Vec<RzPoint>,
    },
    /// `first` minus `second`, with `second` placed in the frame of `first`
    Subtraction {
        first: String,
        second: String,
        placement: Placement,
    },
}

impl Shape {
    pub fn full_tube(rmin: f64, rmax: f64, z: f64) -> Self {
        Shape::Tube {
            rmin,
            rmax,
            z,
            startphi: 0.0,
            deltaphi: TAU,
        }
    }

    pub fn full_generic_polycone(points: Vec<RzPoint>) -> Self {
        Shape::GenericPolycone {
            startphi: 0.0,
            deltaphi: TAU,
            points,
        }
    }

    /// GDML element name
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Box { .. } => "box",
            Shape::Tube { .. } => "tube",
            Shape::Polycone { .. } => "polycone",
            Shape::GenericPolycone { .. } => "genericPolycone",
            Shape::Subtraction { .. } => "subtraction",
        }
    }

    /// Angular range of rotational shapes
    pub fn phi_range(&self) -> Option<(f64, f64)> {
        match self {
            Shape::Tube {
                startphi, deltaphi, ..
            }
            | Shape::Polycone {
                startphi, deltaphi, ..
            }
            | Shape::GenericPolycone {
                startphi, deltaphi, ..
            } => Some((*startphi, *deltaphi)),
            _ => None,
        }
    }

    /// Closed r-z outline of rotational shapes (first point not repeated)
    pub fn outline(&self) -> Option<Vec<RzPoint>> {
        match self {
            Shape::Tube { rmin, rmax, z, .. } => Some(vec![
                RzPoint::new(*rmin, -z / 2.0),
                RzPoint::new(*rmax, -z / 2.0),
                RzPoint::new(*rmax, z / 2.0),
                RzPoint::new(*rmin, z / 2.0),
            ]),
            Shape::Polycone { planes, .. } => {
                let mut points: Vec<RzPoint> =
                    planes.iter().map(|p| RzPoint::new(p.rmin, p.z)).collect();
                points.extend(planes.iter().rev().map(|p| RzPoint::new(p.rmax, p.z)));
                Some(points)
            }
            Shape::GenericPolycone { points, .. } => Some(points.clone()),
            _ => None,
        }
    }

    /// Check dimensions; references of boolean solids are checked by the registry
    pub fn validate(&self, name: &str) -> Result<(), GeometryError> {
        let invalid = |message: String| {
            Err(GeometryError::InvalidParameter(format!(
                "solid `{}`: {}",
                name, message
            )))
        };

        if let Some((_, deltaphi)) = self.phi_range() {
            if !(deltaphi > 0.0 && deltaphi <= TAU + 1e-9) {
                return invalid(format!("deltaphi {} outside (0, 2pi]", deltaphi));
            }
        }

        match self {
            Shape::Box { x, y, z } => {
                if !(*x > 0.0 && *y > 0.0 && *z > 0.0) {
                    return invalid(format!("box dimensions [{}, {}, {}] must be positive", x, y, z));
                }
            }
            Shape::Tube { rmin, rmax, z, .. } => {
                if !(*rmin >= 0.0 && rmax > rmin && *z > 0.0) {
                    return invalid(format!(
                        "tube requires 0 <= rmin < rmax and z > 0, got rmin={} rmax={} z={}",
                        rmin, rmax, z
                    ));
                }
            }
            Shape::Polycone { planes, .. } => {
                if planes.len() < 2 {
                    return invalid("polycone needs at least two z-planes".into());
                }
                if planes
                    .iter()
                    .any(|p| p.rmin < 0.0 || p.rmax < p.rmin || !p.z.is_finite())
                {
                    return invalid("polycone planes need 0 <= rmin <= rmax".into());
                }
                if planes.windows(2).any(|w| w[1].z < w[0].z) {
                    return invalid("polycone z-planes must not decrease".into());
                }
            }
            Shape::GenericPolycone { points, .. } => {
                if points.len() < 3 {
                    return invalid("generic polycone needs at least three points".into());
                }
                if points.iter().any(|p| p.r < 0.0 || !p.r.is_finite() || !p.z.is_finite()) {
                    return invalid("generic polycone radii must be finite and >= 0".into());
                }
                if polygon_area(points).abs() < 1e-9 {
                    return invalid("generic polycone outline encloses no area".into());
                }
            }
            Shape::Subtraction { first, second, .. } => {
                if first == name || second == name {
                    return invalid("boolean solid cannot reference itself".into());
                }
            }
        }
        Ok(())
    }
}

/// Signed area of an r-z outline (shoelace formula)
pub fn polygon_area(points: &[RzPoint]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.r * b.z - b.r * a.z
        })
        .sum::<f64>()
        / 2.0
}

/// A named solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub name: String,
    pub shape: Shape,
}

impl Solid {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_placement_translation() {
        let p = Placement::at(1.0, 2.0, 3.0);
        let out = p.to_parent(&Point3::new(1.0, 0.0, 0.0));
        assert_eq!(out, Point3::new(2.0, 2.0, 3.0));
        assert_eq!(p.to_local(&out), Point3::new(1.0, 0.0, 0.0));
        assert!(!p.is_rotated());
    }

    #[test]
    fn test_active_rotation_roundtrip() {
        let active = Rotation3::from_euler_angles(0.0, FRAC_PI_2, 0.3);
        let p = Placement::at(0.0, 0.0, 0.0).with_active_rotation(active);
        assert!(p.is_rotated());

        // local +z is mapped onto the (cos 0.3, sin 0.3, 0) direction
        let out = p.to_parent(&Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(out.x, 0.3f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(out.y, 0.3f64.sin(), epsilon = 1e-12);
        assert_relative_eq!(out.z, 0.0, epsilon = 1e-12);

        let back = p.to_local(&out);
        assert_relative_eq!(back.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gdml_rotation_is_inverse() {
        // GDML rotation z = +90deg turns the daughter by -90deg
        let p = Placement {
            position: Vector3::zeros(),
            rotation: Vector3::new(0.0, 0.0, FRAC_PI_2),
        };
        let out = p.to_parent(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(out.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tube_outline() {
        let outline = Shape::full_tube(1.0, 2.0, 4.0).outline().unwrap();
        assert_eq!(outline[0], RzPoint::new(1.0, -2.0));
        assert_eq!(outline[2], RzPoint::new(2.0, 2.0));
    }

    #[test]
    fn test_validation() {
        assert!(Shape::Box { x: 1.0, y: 1.0, z: 0.0 }.validate("b").is_err());
        assert!(Shape::full_tube(2.0, 1.0, 1.0).validate("t").is_err());
        assert!(Shape::full_tube(0.0, 1.0, 1.0).validate("t").is_ok());
        assert!(Shape::full_generic_polycone(vec![
            RzPoint::new(0.0, 0.0),
            RzPoint::new(1.0, 0.0),
            RzPoint::new(2.0, 0.0),
        ])
        .validate("flat")
        .is_err());
        assert!(Shape::Subtraction {
            first: "s".into(),
            second: "x".into(),
            placement: Placement::identity(),
        }
        .validate("s")
        .is_err());
    }

    #[test]
    fn test_polygon_area() {
        let square = [
            RzPoint::new(0.0, 0.0),
            RzPoint::new(1.0, 0.0),
            RzPoint::new(1.0, 1.0),
            RzPoint::new(0.0, 1.0),
        ];
        assert_relative_eq!(polygon_area(&square), 1.0);
    }
}
