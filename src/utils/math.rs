// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Calculate the normal of a triangle given three vertices.
/// Returns `None` for degenerate triangles.
pub fn calculate_triangle_normal(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Option<Vector3<f64>> {
    let v1 = p1 - p0;
    let v2 = p2 - p0;
    let normal = v1.cross(&v2);
    let norm = normal.norm();
    if norm < 1e-12 {
        None
    } else {
        Some(normal / norm)
    }
}

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Distance from point (px, py) to the segment a-b in the plane
pub fn segment_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Even-odd point-in-polygon test; the polygon is implicitly closed
pub fn point_in_polygon(px: f64, py: f64, polygon: &[(f64, f64)]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0001, 0.001));
        assert!(!approx_eq(1.0, 1.1, 0.001));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-20.005_1, 2), -20.01);
        assert_eq!(round_to(3.0, 2), 3.0);
    }

    #[test]
    fn test_triangle_normal() {
        let n = calculate_triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!(approx_eq(n.z, 1.0, 1e-12));

        let degenerate = calculate_triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert!(degenerate.is_none());
    }

    #[test]
    fn test_segment_distance() {
        assert!(approx_eq(segment_distance(0.5, 1.0, 0.0, 0.0, 1.0, 0.0), 1.0, 1e-12));
        assert!(approx_eq(segment_distance(2.0, 0.0, 0.0, 0.0, 1.0, 0.0), 1.0, 1e-12));
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        assert!(point_in_polygon(1.0, 1.0, &square));
        assert!(!point_in_polygon(3.0, 1.0, &square));
        assert!(!point_in_polygon(1.0, 1.0, &square[..2]));
    }
}
