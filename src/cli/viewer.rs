// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene export and viewer subprocess

use crate::config::VisScene;
use crate::geometry::{scene_meshes, Registry};
use crate::io;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// File written when the scene names no output
pub const DEFAULT_SCENE_FILE: &str = "hades-geom-scene.glb";

/// Result of a scene export
pub struct ExportResult {
    pub path: PathBuf,
    pub volumes: usize,
    pub duration: Duration,
}

/// Tessellate the registry with the scene settings and write a GLB file
pub fn export_scene(registry: &Registry, scene: &VisScene) -> Result<ExportResult> {
    let start = Instant::now();
    let path = scene
        .output
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SCENE_FILE));

    let meshes = scene_meshes(registry, scene).context("Failed to tessellate geometry")?;
    io::export_gltf(&meshes, &path)
        .with_context(|| format!("Failed to write scene to {}", path.display()))?;

    Ok(ExportResult {
        path,
        volumes: meshes.len(),
        duration: start.elapsed(),
    })
}

/// Launches an external viewer on exported scenes
pub struct Viewer {
    program: String,
}

impl Viewer {
    /// Viewer configured by the scene, if any
    pub fn from_scene(scene: &VisScene) -> Option<Self> {
        scene
            .viewer
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|program| Self {
                program: program.to_string(),
            })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the viewer on `path` and wait for it to exit.
    ///
    /// The program string may carry arguments, e.g. `f3d --up +Z`.
    pub fn open(&self, path: &Path) -> Result<Duration> {
        let mut parts = self.program.split_whitespace();
        let Some(program) = parts.next() else {
            bail!("viewer command is empty");
        };

        let start = Instant::now();
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .with_context(|| format!("Failed to execute viewer `{}`", program))?;

        if !status.success() {
            bail!("viewer exited with status: {}", status);
        }

        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LogicalVolume, Material, PhysicalVolume, Placement, Shape, Solid};
    use tempfile::TempDir;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.add_material(Material::nist("G4_AIR")).unwrap();
        reg.add_material(Material::nist("G4_Cu")).unwrap();
        reg.add_solid(Solid::new("world", Shape::Box { x: 100.0, y: 100.0, z: 100.0 }))
            .unwrap();
        reg.add_solid(Solid::new("block", Shape::full_tube(0.0, 10.0, 20.0)))
            .unwrap();
        reg.add_logical_volume(LogicalVolume::new("world_lv", "world", "G4_AIR"))
            .unwrap();
        reg.add_logical_volume(
            LogicalVolume::new("block_lv", "block", "G4_Cu").with_color([1.0, 0.5, 0.0, 1.0]),
        )
        .unwrap();
        reg.add_physical_volume(PhysicalVolume::new(
            "block_pv",
            "block_lv",
            "world_lv",
            Placement::identity(),
        ))
        .unwrap();
        reg.set_world("world_lv").unwrap();
        reg
    }

    #[test]
    fn test_export_scene_to_configured_path() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let scene = VisScene {
            output: Some(dir.path().join("scene.glb")),
            ..VisScene::default()
        };
        let result = export_scene(&registry(), &scene)?;
        assert_eq!(result.volumes, 1);
        assert!(result.path.exists());
        Ok(())
    }

    #[test]
    fn test_viewer_from_scene() {
        assert!(Viewer::from_scene(&VisScene::default()).is_none());

        let scene = VisScene {
            viewer: Some("  ".into()),
            ..VisScene::default()
        };
        assert!(Viewer::from_scene(&scene).is_none());

        let scene = VisScene {
            viewer: Some("f3d --up +Z".into()),
            ..VisScene::default()
        };
        assert_eq!(Viewer::from_scene(&scene).unwrap().program(), "f3d --up +Z");
    }

    #[test]
    fn test_missing_viewer_program_fails() {
        let viewer = Viewer {
            program: "hades-geom-no-such-viewer".into(),
        };
        assert!(viewer.open(Path::new("scene.glb")).is_err());
    }
}
