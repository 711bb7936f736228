// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! HPGe crystal outlines from diode metadata
//!
//! Outlines are r-z polygons in the crystal frame: the p+ contact face is
//! at z = 0 and the crystal extends to z = height.

use crate::error::GeometryError;
use crate::geometry::RzPoint;
use crate::metadata::detector::{Borehole, Groove};
use crate::metadata::DiodeMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorType {
    /// Broad energy germanium
    Bege,
    /// P-type point contact
    Ppc,
    /// Inverted coaxial, borehole from the top
    Icpc,
    /// Semi-coaxial, bore through the full height
    Coax,
}

impl DetectorType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bege" => Some(DetectorType::Bege),
            "ppc" => Some(DetectorType::Ppc),
            "icpc" => Some(DetectorType::Icpc),
            "coax" => Some(DetectorType::Coax),
            _ => None,
        }
    }
}

fn nonzero_groove(groove: Option<Groove>) -> Option<Groove> {
    groove.filter(|g| g.depth_in_mm > 0.0 && g.radius_in_mm.outer > 0.0)
}

fn nonzero_borehole(borehole: Option<Borehole>) -> Option<Borehole> {
    borehole.filter(|b| b.radius_in_mm > 0.0 && b.depth_in_mm > 0.0)
}

/// Closed r-z outline of the crystal, first point not repeated
pub fn detector_profile(diode: &DiodeMetadata) -> Result<Vec<RzPoint>, GeometryError> {
    let kind = DetectorType::from_str(&diode.kind).ok_or_else(|| GeometryError::UnknownDetectorType {
        name: diode.name.clone(),
        kind: diode.kind.clone(),
    })?;
    let invalid = |message: String| {
        Err(GeometryError::InvalidParameter(format!(
            "detector {}: {}",
            diode.name, message
        )))
    };

    let geo = &diode.geometry;
    let (height, radius) = (geo.height_in_mm, geo.radius_in_mm);
    if !(height > 0.0 && radius > 0.0) {
        return invalid(format!("height {} and radius {} must be positive", height, radius));
    }

    let (bottom_cut, bottom_h) = geo
        .taper
        .bottom
        .map(|t| (t.radial_cut(), t.height_in_mm))
        .unwrap_or((0.0, 0.0));
    let (top_cut, top_h) = geo
        .taper
        .top
        .map(|t| (t.radial_cut(), t.height_in_mm))
        .unwrap_or((0.0, 0.0));
    if bottom_cut < 0.0 || top_cut < 0.0 || bottom_cut >= radius || top_cut >= radius {
        return invalid("taper cuts must lie within the radius".into());
    }
    if bottom_h < 0.0 || top_h < 0.0 || bottom_h + top_h > height {
        return invalid("taper heights exceed the crystal height".into());
    }

    let borehole = nonzero_borehole(geo.borehole);
    let bore = match (kind, borehole) {
        (DetectorType::Icpc, Some(b)) => {
            if b.depth_in_mm >= height {
                return invalid(format!(
                    "borehole depth {} must be below the height {}",
                    b.depth_in_mm, height
                ));
            }
            Some(b)
        }
        (DetectorType::Icpc, None) => return invalid("icpc detectors need a borehole".into()),
        (DetectorType::Coax, Some(b)) => Some(Borehole {
            radius_in_mm: b.radius_in_mm,
            depth_in_mm: height,
        }),
        (DetectorType::Coax, None) => return invalid("coax detectors need a central bore".into()),
        (_, Some(_)) => return invalid(format!("{} detectors have no borehole", diode.kind)),
        (_, None) => None,
    };
    if let Some(b) = bore {
        if b.radius_in_mm >= radius - top_cut.max(bottom_cut) {
            return invalid(format!("borehole radius {} too large", b.radius_in_mm));
        }
    }

    let bottom_start = match (kind, bore) {
        (DetectorType::Coax, Some(b)) => b.radius_in_mm,
        _ => 0.0,
    };

    let mut points = vec![RzPoint::new(bottom_start, 0.0)];

    if let Some(groove) = nonzero_groove(geo.groove) {
        let (inner, outer, depth) = (
            groove.radius_in_mm.inner,
            groove.radius_in_mm.outer,
            groove.depth_in_mm,
        );
        if !(inner > bottom_start && outer > inner && outer < radius - bottom_cut) {
            return invalid(format!(
                "groove radii {}..{} do not fit the contact face",
                inner, outer
            ));
        }
        let top_of_bore = match (kind, bore) {
            (DetectorType::Icpc, Some(b)) => height - b.depth_in_mm,
            _ => height,
        };
        if depth >= top_of_bore.min(height - top_h) {
            return invalid(format!("groove depth {} too large", depth));
        }
        points.extend([
            RzPoint::new(inner, 0.0),
            RzPoint::new(inner, depth),
            RzPoint::new(outer, depth),
            RzPoint::new(outer, 0.0),
        ]);
    }

    if bottom_cut > 0.0 {
        points.push(RzPoint::new(radius - bottom_cut, 0.0));
        points.push(RzPoint::new(radius, bottom_h));
    } else {
        points.push(RzPoint::new(radius, 0.0));
    }

    if top_cut > 0.0 {
        points.push(RzPoint::new(radius, height - top_h));
        points.push(RzPoint::new(radius - top_cut, height));
    } else {
        points.push(RzPoint::new(radius, height));
    }

    match (kind, bore) {
        (DetectorType::Icpc, Some(b)) => points.extend([
            RzPoint::new(b.radius_in_mm, height),
            RzPoint::new(b.radius_in_mm, height - b.depth_in_mm),
            RzPoint::new(0.0, height - b.depth_in_mm),
        ]),
        (DetectorType::Coax, Some(b)) => points.push(RzPoint::new(b.radius_in_mm, height)),
        _ => points.push(RzPoint::new(0.0, height)),
    }

    // zero-height tapers produce repeated corners
    points.dedup_by(|a, b| (a.r - b.r).abs() < 1e-12 && (a.z - b.z).abs() < 1e-12);
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shape::polygon_area;
    use crate::metadata::{MetadataSource, PublicMetadata};

    fn diode(name: &str) -> DiodeMetadata {
        PublicMetadata::new().unwrap().diode(name).unwrap()
    }

    #[test]
    fn test_bege_outline() {
        let points = detector_profile(&diode("B00000B")).unwrap();
        // axis, groove (4), outer bottom, outer top, axis top
        assert_eq!(points.len(), 8);
        assert_eq!(points[1], RzPoint::new(7.5, 0.0));
        assert!(polygon_area(&points).abs() > 0.0);
    }

    #[test]
    fn test_icpc_outline_has_borehole_and_taper() {
        let points = detector_profile(&diode("V07302A")).unwrap();
        assert!(points.contains(&RzPoint::new(5.0, 30.0)));
        assert!(points.contains(&RzPoint::new(0.0, 30.0)));
        // tan(45deg) is not exact in floating point
        assert!(points.iter().any(|p| (p.r - 37.0).abs() < 1e-9 && p.z == 80.0));
        assert!(!points.contains(&RzPoint::new(0.0, 80.0)));
    }

    #[test]
    fn test_coax_outline_is_annular() {
        let points = detector_profile(&diode("C000RG1")).unwrap();
        assert!(points.iter().all(|p| p.r >= 6.0));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_unknown_type() {
        let mut d = diode("B00000B");
        d.kind = "semi-planar".into();
        assert!(matches!(
            detector_profile(&d),
            Err(GeometryError::UnknownDetectorType { .. })
        ));
    }

    #[test]
    fn test_inconsistent_dimensions() {
        let mut d = diode("V07302A");
        d.geometry.borehole = None;
        assert!(matches!(
            detector_profile(&d),
            Err(GeometryError::InvalidParameter(_))
        ));

        let mut d = diode("B00000B");
        d.geometry.groove.as_mut().unwrap().radius_in_mm.outer = 50.0;
        assert!(detector_profile(&d).is_err());
    }
}
