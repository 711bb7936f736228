// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry registry, solids and inspection tools

pub mod bbox;
pub mod material;
pub mod mesh;
pub mod overlaps;
pub mod profile;
pub mod registry;
pub mod sanity;
pub mod shape;
pub mod tessellate;

pub use bbox::BoundingBox;
pub use material::{Material, MaterialState, Mixture};
pub use mesh::{Mesh, Triangle, Vertex};
pub use overlaps::{check_overlaps, Overlap, OverlapKind};
pub use profile::{collect_profiles, get_profile, Profile};
pub use registry::{
    DetectorKind, DetectorRegistration, LogicalVolume, PhysicalVolume, Registry,
};
pub use sanity::{check_registry_sanity, print_volumes, SanityReport, VolumeKind};
pub use shape::{Placement, RzPoint, Shape, Solid, ZPlane};
pub use tessellate::{scene_meshes, VolumeMesh};
