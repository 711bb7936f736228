// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tessellation of registry solids for the viewer

use super::{Mesh, Registry, RzPoint, Shape, Triangle, Vertex};
use crate::config::VisScene;
use crate::error::GeometryError;
use nalgebra::{Matrix4, Point3, Vector3};
use std::f64::consts::TAU;

/// Color of volumes without an explicit one
pub const DEFAULT_COLOR: [f32; 4] = [0.7, 0.7, 0.7, 0.5];

/// World-space mesh of one placed volume
#[derive(Debug, Clone)]
pub struct VolumeMesh {
    /// Physical volume name
    pub name: String,
    pub color: [f32; 4],
    pub mesh: Mesh,
}

/// Tessellate a solid in its own frame.
///
/// Boolean subtractions are drawn as their first operand.
pub fn tessellate_solid(
    registry: &Registry,
    solid: &str,
    segments: u32,
) -> Result<Mesh, GeometryError> {
    let solid = registry.require_solid(solid)?;
    match &solid.shape {
        Shape::Box { x, y, z } => Ok(box_mesh(*x, *y, *z)),
        Shape::Subtraction { first, .. } => tessellate_solid(registry, first, segments),
        shape => {
            let (startphi, deltaphi) = shape.phi_range().unwrap_or((0.0, TAU));
            let outline = shape.outline().unwrap_or_default();
            Ok(revolve(&outline, startphi, deltaphi, segments))
        }
    }
}

fn box_mesh(x: f64, y: f64, z: f64) -> Mesh {
    let (hx, hy, hz) = (x / 2.0, y / 2.0, z / 2.0);
    let corners = [
        Point3::new(-hx, -hy, -hz),
        Point3::new(hx, -hy, -hz),
        Point3::new(hx, hy, -hz),
        Point3::new(-hx, hy, -hz),
        Point3::new(-hx, -hy, hz),
        Point3::new(hx, -hy, hz),
        Point3::new(hx, hy, hz),
        Point3::new(-hx, hy, hz),
    ];

    // two triangles per face, wound outwards
    let faces = [
        ([4, 5, 6], Vector3::z()),
        ([4, 6, 7], Vector3::z()),
        ([1, 0, 3], -Vector3::z()),
        ([1, 3, 2], -Vector3::z()),
        ([5, 1, 2], Vector3::x()),
        ([5, 2, 6], Vector3::x()),
        ([0, 4, 7], -Vector3::x()),
        ([0, 7, 3], -Vector3::x()),
        ([7, 6, 2], Vector3::y()),
        ([7, 2, 3], Vector3::y()),
        ([0, 1, 5], -Vector3::y()),
        ([0, 5, 4], -Vector3::y()),
    ];

    let mut mesh = Mesh::with_capacity(36, 12);
    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(corners[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(corners[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(corners[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }
    mesh
}

/// Sweep a closed r-z outline around the z axis.
///
/// Only the swept surface is produced; partial-phi solids stay open at
/// their cut faces.
pub fn revolve(outline: &[RzPoint], startphi: f64, deltaphi: f64, segments: u32) -> Mesh {
    let steps = ((segments as f64 * deltaphi / TAU).ceil() as usize).max(1);
    let at = |p: &RzPoint, phi: f64| Point3::new(p.r * phi.cos(), p.r * phi.sin(), p.z);

    let mut mesh = Mesh::with_capacity(outline.len() * steps * 6, outline.len() * steps * 2);
    let n = outline.len();
    for i in 0..n {
        let a = &outline[i];
        let b = &outline[(i + 1) % n];
        for s in 0..steps {
            let phi0 = startphi + deltaphi * s as f64 / steps as f64;
            let phi1 = startphi + deltaphi * (s + 1) as f64 / steps as f64;
            let (a0, a1, b0, b1) = (at(a, phi0), at(a, phi1), at(b, phi0), at(b, phi1));
            mesh.add_face(a0, b0, b1);
            mesh.add_face(a0, b1, a1);
        }
    }
    mesh
}

/// Tessellate every visible placed volume into world coordinates.
///
/// The world volume itself and fully transparent volumes are skipped.
/// Clipping planes of the scene drop triangles on their far side.
pub fn scene_meshes(registry: &Registry, scene: &VisScene) -> Result<Vec<VolumeMesh>, GeometryError> {
    let world = registry.world_volume()?;
    let segments = scene.segments();
    let mut out = Vec::new();

    let mut stack: Vec<(&str, Matrix4<f64>)> = vec![(world.name.as_str(), Matrix4::identity())];
    while let Some((mother, transform)) = stack.pop() {
        for pv in registry.daughters(mother) {
            let lv = registry.require_logical(&pv.logical)?;
            let global = transform * pv.placement.to_matrix();
            stack.push((lv.name.as_str(), global));

            let color = scene
                .colors
                .get(&lv.name)
                .copied()
                .or(lv.color)
                .unwrap_or(DEFAULT_COLOR);
            if color[3] <= 0.0 {
                continue;
            }

            let mut mesh = tessellate_solid(registry, &lv.solid, segments)?;
            mesh.transform(&global);
            if !scene.clipper.is_empty() {
                mesh.retain_triangles(|p| scene.keeps(p));
                mesh.remove_orphaned_vertices();
            }
            if mesh.is_empty() {
                continue;
            }
            out.push(VolumeMesh {
                name: pv.name.clone(),
                color,
                mesh,
            });
        }
    }

    tracing::debug!(volumes = out.len(), segments, "tessellated scene");
    Ok(out)
}
