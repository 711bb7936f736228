// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle meshes used for viewer export

use super::BoundingBox;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Placements are rigid, so the upper 3x3 block transforms normals too
        let normal = matrix.transform_vector(&self.normal);
        if normal.norm() > 0.0 {
            self.normal = normal.normalize();
        }
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Add a triangle from three positions with a flat normal.
    ///
    /// Degenerate triangles are skipped.
    pub fn add_face(&mut self, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) {
        let Some(normal) = crate::utils::math::calculate_triangle_normal(&a, &b, &c) else {
            return;
        };
        let i = self.add_vertex(Vertex::new(a, normal));
        let j = self.add_vertex(Vertex::new(b, normal));
        let k = self.add_vertex(Vertex::new(c, normal));
        self.add_triangle(Triangle::new([i, j, k]));
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Keep only triangles whose vertices all satisfy `keep`.
    ///
    /// Returns the number of triangles removed. Vertices are left in place;
    /// call [`Mesh::remove_orphaned_vertices`] to compact.
    pub fn retain_triangles<F>(&mut self, keep: F) -> usize
    where
        F: Fn(&Point3<f64>) -> bool,
    {
        let before = self.triangles.len();
        let vertices = &self.vertices;
        self.triangles
            .retain(|t| t.indices.iter().all(|&i| keep(&vertices[i].position)));
        before - self.triangles.len()
    }

    /// Remove vertices not referenced by any triangle
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &i in &triangle.indices {
                used[i] = true;
            }
        }

        let mut remap = vec![0; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for (old, &is_used) in used.iter().enumerate() {
            if is_used {
                remap[old] = kept.len();
                kept.push(self.vertices[old]);
            }
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }

        let removed = self.vertices.len() - kept.len();
        self.vertices = kept;
        removed
    }
}
