// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Overlap detection by surface sampling
//!
//! Each daughter surface is sampled on a fixed grid and the samples are
//! tested against the mother and the siblings with an approximate signed
//! distance (positive inside). Sampling is deterministic, so the same
//! registry always yields the same report.

use super::{PhysicalVolume, Registry, RzPoint, Shape};
use crate::error::GeometryError;
use crate::utils::math::{point_in_polygon, segment_distance};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Allowed penetration depth in mm
pub const DEFAULT_TOLERANCE: f64 = 1e-3;
/// Samples per face side and per turn
pub const DEFAULT_RESOLUTION: usize = 48;

const POINTS_PER_EDGE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapKind {
    /// Daughter reaches outside its mother
    Protrusion,
    /// Daughter reaches into a sibling
    Intrusion,
}

/// One detected overlap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    /// Mother logical volume
    pub mother: String,
    /// Offending physical volume
    pub volume: String,
    /// Sibling physical volume for intrusions
    pub other: Option<String>,
    pub kind: OverlapKind,
    /// Number of offending samples
    pub points: usize,
    /// Largest penetration depth found, in mm
    pub depth: f64,
}

impl std::fmt::Display for Overlap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.other) {
            (OverlapKind::Intrusion, Some(other)) => write!(
                f,
                "`{}` overlaps `{}` in `{}` ({} points, depth {:.4} mm)",
                self.volume, other, self.mother, self.points, self.depth
            ),
            _ => write!(
                f,
                "`{}` protrudes from mother `{}` ({} points, depth {:.4} mm)",
                self.volume, self.mother, self.points, self.depth
            ),
        }
    }
}

/// Approximate signed distance of a local point to a solid, positive inside
pub fn signed_distance(registry: &Registry, solid: &str, p: &Point3<f64>) -> Result<f64, GeometryError> {
    let solid = registry.require_solid(solid)?;
    match &solid.shape {
        Shape::Box { x, y, z } => Ok((x / 2.0 - p.x.abs())
            .min(y / 2.0 - p.y.abs())
            .min(z / 2.0 - p.z.abs())),
        Shape::Subtraction {
            first,
            second,
            placement,
        } => {
            let outer = signed_distance(registry, first, p)?;
            let inner = signed_distance(registry, second, &placement.to_local(p))?;
            Ok(outer.min(-inner))
        }
        shape => {
            let outline = shape.outline().unwrap_or_default();
            let (startphi, deltaphi) = shape.phi_range().unwrap_or((0.0, TAU));
            let r = p.x.hypot(p.y);
            let mut d = outline_distance(&outline, r, p.z);
            if deltaphi < TAU - 1e-9 {
                d = d.min(phi_distance(p.y.atan2(p.x), r, startphi, deltaphi));
            }
            Ok(d)
        }
    }
}

/// Signed distance to a closed r-z outline; edges on the axis are not surfaces
fn outline_distance(outline: &[RzPoint], r: f64, z: f64) -> f64 {
    let polygon: Vec<(f64, f64)> = outline.iter().map(|q| (q.r, q.z)).collect();
    let n = outline.len();
    let mut nearest = f64::INFINITY;
    for i in 0..n {
        let a = outline[i];
        let b = outline[(i + 1) % n];
        if a.r.abs() < 1e-12 && b.r.abs() < 1e-12 {
            continue;
        }
        nearest = nearest.min(segment_distance(r, z, a.r, a.z, b.r, b.z));
    }
    if point_in_polygon(r, z, &polygon) {
        nearest
    } else {
        -nearest
    }
}

/// Distance to the phi cut planes of a partial solid
fn phi_distance(phi: f64, r: f64, startphi: f64, deltaphi: f64) -> f64 {
    let offset = (phi - startphi).rem_euclid(TAU);
    if offset <= deltaphi {
        let to_cut = offset.min(deltaphi - offset).min(FRAC_PI_2);
        r * to_cut.sin()
    } else {
        let outside = (offset - deltaphi).min(TAU - offset).min(FRAC_PI_2);
        -r * outside.sin()
    }
}

/// Deterministic samples on the surface of a solid, in its local frame
pub fn sample_surface(
    registry: &Registry,
    solid: &str,
    resolution: usize,
    tolerance: f64,
) -> Result<Vec<Point3<f64>>, GeometryError> {
    let resolution = resolution.max(2);
    let solid = registry.require_solid(solid)?;
    match &solid.shape {
        Shape::Box { x, y, z } => Ok(sample_box(*x, *y, *z, resolution)),
        Shape::Subtraction {
            first,
            second,
            placement,
        } => {
            let mut points = Vec::new();
            for p in sample_surface(registry, first, resolution, tolerance)? {
                if signed_distance(registry, second, &placement.to_local(&p))? <= tolerance {
                    points.push(p);
                }
            }
            for q in sample_surface(registry, second, resolution, tolerance)? {
                let p = placement.to_parent(&q);
                if signed_distance(registry, first, &p)? >= -tolerance {
                    points.push(p);
                }
            }
            Ok(points)
        }
        shape => {
            let outline = shape.outline().unwrap_or_default();
            let (startphi, deltaphi) = shape.phi_range().unwrap_or((0.0, TAU));
            Ok(sample_revolved(&outline, startphi, deltaphi, resolution))
        }
    }
}

fn sample_box(x: f64, y: f64, z: f64, n: usize) -> Vec<Point3<f64>> {
    let half = [x / 2.0, y / 2.0, z / 2.0];
    let step = |i: usize, h: f64| -h + 2.0 * h * i as f64 / (n - 1) as f64;
    let mut points = Vec::with_capacity(6 * n * n);
    for axis in 0..3 {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        for sign in [-1.0, 1.0] {
            for i in 0..n {
                for j in 0..n {
                    let mut c = [0.0; 3];
                    c[axis] = sign * half[axis];
                    c[u] = step(i, half[u]);
                    c[v] = step(j, half[v]);
                    points.push(Point3::new(c[0], c[1], c[2]));
                }
            }
        }
    }
    points
}

fn sample_revolved(outline: &[RzPoint], startphi: f64, deltaphi: f64, n: usize) -> Vec<Point3<f64>> {
    let full = deltaphi >= TAU - 1e-9;
    let steps = if full { n } else { n + 1 };
    let mut points = Vec::with_capacity(outline.len() * POINTS_PER_EDGE * steps);
    let m = outline.len();
    for s in 0..steps {
        let phi = startphi + deltaphi * s as f64 / n as f64;
        let (sin, cos) = phi.sin_cos();
        for i in 0..m {
            let a = outline[i];
            let b = outline[(i + 1) % m];
            for k in 0..POINTS_PER_EDGE {
                let t = k as f64 / POINTS_PER_EDGE as f64;
                let r = a.r + t * (b.r - a.r);
                let z = a.z + t * (b.z - a.z);
                points.push(Point3::new(r * cos, r * sin, z));
            }
        }
    }
    points
}

/// Check every mother volume for protruding and intersecting daughters
pub fn check_overlaps(
    registry: &Registry,
    tolerance: f64,
    resolution: usize,
) -> Result<Vec<Overlap>, GeometryError> {
    let mut overlaps = Vec::new();
    for mother in registry.logical_volumes() {
        let daughters: Vec<&PhysicalVolume> = registry.daughters(&mother.name).collect();
        if daughters.is_empty() {
            continue;
        }

        for (i, pv) in daughters.iter().enumerate() {
            let solid = registry.solid_of(&pv.logical)?;
            let samples: Vec<Point3<f64>> =
                sample_surface(registry, &solid.name, resolution, tolerance)?
                    .iter()
                    .map(|p| pv.placement.to_parent(p))
                    .collect();

            let mut outside = 0;
            let mut depth: f64 = 0.0;
            for p in &samples {
                let d = signed_distance(registry, &mother.solid, p)?;
                if d < -tolerance {
                    outside += 1;
                    depth = depth.max(-d);
                }
            }
            if outside > 0 {
                overlaps.push(Overlap {
                    mother: mother.name.clone(),
                    volume: pv.name.clone(),
                    other: None,
                    kind: OverlapKind::Protrusion,
                    points: outside,
                    depth,
                });
            }

            for (j, sibling) in daughters.iter().enumerate() {
                if i == j {
                    continue;
                }
                let sibling_solid = &registry.require_logical(&sibling.logical)?.solid;
                let mut inside = 0;
                let mut depth: f64 = 0.0;
                for p in &samples {
                    let d = signed_distance(registry, sibling_solid, &sibling.placement.to_local(p))?;
                    if d > tolerance {
                        inside += 1;
                        depth = depth.max(d);
                    }
                }
                if inside > 0 {
                    overlaps.push(Overlap {
                        mother: mother.name.clone(),
                        volume: pv.name.clone(),
                        other: Some(sibling.name.clone()),
                        kind: OverlapKind::Intrusion,
                        points: inside,
                        depth,
                    });
                }
            }
        }
    }

    for overlap in &overlaps {
        tracing::debug!("{}", overlap);
    }
    Ok(overlaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LogicalVolume, Material, Placement, Solid};
    use approx::assert_relative_eq;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.add_material(Material::nist("G4_AIR")).unwrap();
        reg.add_solid(Solid::new("world", Shape::Box { x: 100.0, y: 100.0, z: 100.0 }))
            .unwrap();
        reg.add_solid(Solid::new("cyl", Shape::full_tube(0.0, 5.0, 10.0)))
            .unwrap();
        reg.add_logical_volume(LogicalVolume::new("world_lv", "world", "G4_AIR"))
            .unwrap();
        reg.add_logical_volume(LogicalVolume::new("cyl_lv", "cyl", "G4_AIR"))
            .unwrap();
        reg.set_world("world_lv").unwrap();
        reg
    }

    fn place(reg: &mut Registry, name: &str, x: f64, z: f64) {
        reg.add_physical_volume(PhysicalVolume::new(
            name,
            "cyl_lv",
            "world_lv",
            Placement::at(x, 0.0, z),
        ))
        .unwrap();
    }

    #[test]
    fn test_signed_distance_of_tube() {
        let reg = registry();
        assert_relative_eq!(
            signed_distance(&reg, "cyl", &Point3::new(0.0, 0.0, 0.0)).unwrap(),
            5.0
        );
        assert_relative_eq!(
            signed_distance(&reg, "cyl", &Point3::new(7.0, 0.0, 0.0)).unwrap(),
            -2.0
        );
        assert_relative_eq!(
            signed_distance(&reg, "cyl", &Point3::new(0.0, 0.0, 4.0)).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_signed_distance_of_subtraction() {
        let mut reg = registry();
        reg.add_solid(Solid::new(
            "hollow",
            Shape::Subtraction {
                first: "world".into(),
                second: "cyl".into(),
                placement: Placement::identity(),
            },
        ))
        .unwrap();
        assert!(signed_distance(&reg, "hollow", &Point3::origin()).unwrap() < 0.0);
        assert!(signed_distance(&reg, "hollow", &Point3::new(20.0, 0.0, 0.0)).unwrap() > 0.0);

        let samples = sample_surface(&reg, "hollow", 8, DEFAULT_TOLERANCE).unwrap();
        assert!(samples.iter().any(|p| p.x.hypot(p.y) < 5.0 + 1e-9));
        assert!(samples.iter().any(|p| p.x.abs() == 50.0));
    }

    #[test]
    fn test_touching_volumes_do_not_overlap() {
        let mut reg = registry();
        place(&mut reg, "a", 0.0, 0.0);
        place(&mut reg, "b", 0.0, 10.0);
        let overlaps = check_overlaps(&reg, DEFAULT_TOLERANCE, 24).unwrap();
        assert!(overlaps.is_empty(), "{:?}", overlaps);
    }

    #[test]
    fn test_intersecting_siblings() {
        let mut reg = registry();
        place(&mut reg, "a", 0.0, 0.0);
        place(&mut reg, "b", 3.0, 0.0);
        let overlaps = check_overlaps(&reg, DEFAULT_TOLERANCE, 24).unwrap();
        assert_eq!(overlaps.len(), 2);
        assert!(overlaps.iter().all(|o| o.kind == OverlapKind::Intrusion));
    }

    #[test]
    fn test_protrusion_from_mother() {
        let mut reg = registry();
        place(&mut reg, "a", 48.0, 0.0);
        let overlaps = check_overlaps(&reg, DEFAULT_TOLERANCE, 24).unwrap();
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].kind, OverlapKind::Protrusion);
        assert_relative_eq!(overlaps[0].depth, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_phi_distance_partial() {
        // quarter turn starting at 0
        assert!(phi_distance(0.3, 1.0, 0.0, FRAC_PI_2) > 0.0);
        assert!(phi_distance(-0.3, 1.0, 0.0, FRAC_PI_2) < 0.0);
    }
}
