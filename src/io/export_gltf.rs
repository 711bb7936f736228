// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GLTF/GLB scene exporter for the viewer

use crate::error::Result;
use crate::geometry::VolumeMesh;
use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export tessellated volumes as one colored node each.
///
/// `.glb` paths get a binary file, anything else a `.gltf` JSON file with
/// a `.bin` buffer next to it.
pub fn export(meshes: &[VolumeMesh], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.extension().is_some_and(|e| e == "glb") {
        export_glb(meshes, path)?;
    } else {
        export_gltf_separate(meshes, path)?;
    }
    tracing::info!(path = %path.display(), volumes = meshes.len(), "exported scene");
    Ok(())
}

/// Export to GLB (binary GLTF)
fn export_glb(meshes: &[VolumeMesh], path: &Path) -> Result<()> {
    let (gltf, buffer_data) = create_gltf_json(meshes, None);

    let json_string = serde_json::to_string(&gltf).map_err(std::io::Error::from)?;
    let mut json_offset = json_string.len();
    align_to_multiple_of_four(&mut json_offset);
    let json_padding = json_offset - json_string.len();

    let mut buffer_offset = buffer_data.len();
    align_to_multiple_of_four(&mut buffer_offset);
    let buffer_padding = buffer_offset - buffer_data.len();

    let total_length = 12 + 8 + json_offset + 8 + buffer_offset;

    let mut file = File::create(path)?;

    // GLB header
    file.write_all(&0x46546C67u32.to_le_bytes())?; // magic: "glTF"
    file.write_all(&2u32.to_le_bytes())?; // version
    file.write_all(&(total_length as u32).to_le_bytes())?;

    // JSON chunk
    file.write_all(&(json_offset as u32).to_le_bytes())?;
    file.write_all(&0x4E4F534Au32.to_le_bytes())?; // type: "JSON"
    file.write_all(json_string.as_bytes())?;
    file.write_all(&vec![b' '; json_padding])?;

    // BIN chunk
    file.write_all(&(buffer_offset as u32).to_le_bytes())?;
    file.write_all(&0x004E4942u32.to_le_bytes())?; // type: "BIN\0"
    file.write_all(&buffer_data)?;
    file.write_all(&vec![0u8; buffer_padding])?;

    Ok(())
}

/// Export to GLTF with a separate .bin file
fn export_gltf_separate(meshes: &[VolumeMesh], path: &Path) -> Result<()> {
    let bin_path = path.with_extension("bin");
    let uri = bin_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data.bin".to_string());
    let (gltf, buffer_data) = create_gltf_json(meshes, Some(&uri));

    let json_string = serde_json::to_string_pretty(&gltf).map_err(std::io::Error::from)?;
    std::fs::write(path, json_string)?;
    std::fs::write(bin_path, buffer_data)?;

    Ok(())
}

fn push_vec3(buffer: &mut Vec<u8>, x: f64, y: f64, z: f64) {
    for c in [x, y, z] {
        buffer.extend_from_slice(&(c as f32).to_le_bytes());
    }
}

fn create_gltf_json(meshes: &[VolumeMesh], uri: Option<&str>) -> (Value, Vec<u8>) {
    let mut buffer_data = Vec::new();
    let mut nodes = Vec::new();
    let mut gltf_meshes = Vec::new();
    let mut materials = Vec::new();
    let mut accessors = Vec::new();
    let mut buffer_views = Vec::new();

    for (i, volume) in meshes.iter().enumerate() {
        let mesh = &volume.mesh;

        // Write positions
        let position_offset = buffer_data.len();
        let (min_pos, max_pos) = calculate_bounds(volume);
        for vertex in &mesh.vertices {
            let p = vertex.position;
            push_vec3(&mut buffer_data, p.x, p.y, p.z);
        }
        let position_length = buffer_data.len() - position_offset;

        // Write normals
        let normal_offset = buffer_data.len();
        for vertex in &mesh.vertices {
            let n = vertex.normal;
            push_vec3(&mut buffer_data, n.x, n.y, n.z);
        }
        let normal_length = buffer_data.len() - normal_offset;

        // Write indices
        let indices_offset = buffer_data.len();
        for triangle in &mesh.triangles {
            for index in triangle.indices {
                buffer_data.extend_from_slice(&(index as u32).to_le_bytes());
            }
        }
        let indices_length = buffer_data.len() - indices_offset;

        let view = buffer_views.len();
        buffer_views.extend([
            json!({"buffer": 0, "byteOffset": position_offset, "byteLength": position_length, "target": 34962}),
            json!({"buffer": 0, "byteOffset": normal_offset, "byteLength": normal_length, "target": 34962}),
            json!({"buffer": 0, "byteOffset": indices_offset, "byteLength": indices_length, "target": 34963}),
        ]);

        let accessor = accessors.len();
        accessors.extend([
            json!({
                "bufferView": view,
                "byteOffset": 0,
                "componentType": 5126,
                "count": mesh.vertices.len(),
                "type": "VEC3",
                "min": min_pos,
                "max": max_pos
            }),
            json!({
                "bufferView": view + 1,
                "byteOffset": 0,
                "componentType": 5126,
                "count": mesh.vertices.len(),
                "type": "VEC3"
            }),
            json!({
                "bufferView": view + 2,
                "byteOffset": 0,
                "componentType": 5125,
                "count": mesh.triangles.len() * 3,
                "type": "SCALAR"
            }),
        ]);

        let [r, g, b, a] = volume.color;
        materials.push(json!({
            "name": volume.name,
            "pbrMetallicRoughness": {
                "baseColorFactor": [r, g, b, a],
                "metallicFactor": 0.0,
                "roughnessFactor": 0.8
            },
            "alphaMode": if a < 1.0 { "BLEND" } else { "OPAQUE" },
            "doubleSided": true
        }));

        gltf_meshes.push(json!({
            "name": volume.name,
            "primitives": [
                {
                    "attributes": {
                        "POSITION": accessor,
                        "NORMAL": accessor + 1
                    },
                    "indices": accessor + 2,
                    "material": i,
                    "mode": 4
                }
            ]
        }));
        nodes.push(json!({"name": volume.name, "mesh": i}));
    }

    let mut buffer = json!({"byteLength": buffer_data.len()});
    if let Some(uri) = uri {
        buffer["uri"] = json!(uri);
    }

    // GLTF is y-up; the geometry is z-up
    let root = json!({
        "name": "hades",
        "rotation": [-std::f64::consts::FRAC_1_SQRT_2, 0.0, 0.0, std::f64::consts::FRAC_1_SQRT_2],
        "children": (0..meshes.len()).collect::<Vec<_>>()
    });
    nodes.push(root);

    let gltf = json!({
        "asset": {
            "generator": "hades-geom",
            "version": "2.0"
        },
        "scene": 0,
        "scenes": [
            {
                "nodes": [meshes.len()]
            }
        ],
        "nodes": nodes,
        "meshes": gltf_meshes,
        "materials": materials,
        "accessors": accessors,
        "bufferViews": buffer_views,
        "buffers": [buffer]
    });

    (gltf, buffer_data)
}

fn calculate_bounds(volume: &VolumeMesh) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX, f32::MAX, f32::MAX];
    let mut max = [f32::MIN, f32::MIN, f32::MIN];

    for vertex in &volume.mesh.vertices {
        let p = [
            vertex.position.x as f32,
            vertex.position.y as f32,
            vertex.position.z as f32,
        ];
        for k in 0..3 {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
    }

    (min, max)
}

fn align_to_multiple_of_four(n: &mut usize) {
    *n = (*n + 3) & !3;
}
