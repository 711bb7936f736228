// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Read-only metadata tree of directories and YAML/JSON files
//!
//! Every directory level and every file stem is a key. Once a file is
//! reached, the remaining keys index into its content.

use crate::config::{load_dict, DocumentFormat};
use crate::error::MetadataError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

#[derive(Debug, Clone)]
pub struct TextDb {
    root: PathBuf,
}

impl TextDb {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when the key path names a directory or a file
    pub fn contains(&self, keys: &[&str]) -> bool {
        self.get(keys).is_ok()
    }

    /// Look up a key path, loading whole subtrees for directories
    pub fn get(&self, keys: &[&str]) -> Result<Value, MetadataError> {
        let mut dir = self.root.clone();
        for (depth, key) in keys.iter().enumerate() {
            let candidate = dir.join(key);
            if candidate.is_dir() {
                dir = candidate;
                continue;
            }
            let file = find_file(&dir, key).ok_or_else(|| not_found(keys))?;
            let mut value = read_file(&file)?;
            for key in &keys[depth + 1..] {
                value = value
                    .get_mut(*key)
                    .map(Value::take)
                    .ok_or_else(|| not_found(keys))?;
            }
            return Ok(value);
        }
        if !dir.is_dir() {
            return Err(not_found(keys));
        }
        read_dir(&dir)
    }
}

fn not_found(keys: &[&str]) -> MetadataError {
    MetadataError::NotFound(keys.join("/"))
}

fn find_file(dir: &Path, stem: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
}

fn read_file(path: &Path) -> Result<Value, MetadataError> {
    load_dict(path).map_err(|e| MetadataError::Malformed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn walk_error(dir: &Path, err: walkdir::Error) -> MetadataError {
    let path = err.path().unwrap_or(dir);
    MetadataError::Malformed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn read_dir(dir: &Path) -> Result<Value, MetadataError> {
    let mut map = Map::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('.') {
            continue;
        }
        if entry.file_type().is_dir() {
            map.insert(stem.to_string(), read_dir(path)?);
        } else if matches!(
            DocumentFormat::from_path(path),
            Some(DocumentFormat::Yaml | DocumentFormat::Json)
        ) {
            map.insert(stem.to_string(), read_file(path)?);
        }
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let diodes = dir.path().join("hardware/detectors/germanium/diodes");
        fs::create_dir_all(&diodes).unwrap();
        fs::write(diodes.join("V07302A.yaml"), "name: V07302A\ntype: icpc\n").unwrap();
        fs::write(diodes.join("B00000B.json"), r#"{"name": "B00000B", "type": "bege"}"#).unwrap();
        fs::write(diodes.join("notes.txt"), "ignored").unwrap();
        dir
    }

    #[test]
    fn test_file_lookup_and_nested_keys() {
        let dir = tree();
        let db = TextDb::new(dir.path());
        let diode = db
            .get(&["hardware", "detectors", "germanium", "diodes", "V07302A"])
            .unwrap();
        assert_eq!(diode["type"], "icpc");

        let kind = db
            .get(&["hardware", "detectors", "germanium", "diodes", "B00000B", "type"])
            .unwrap();
        assert_eq!(kind, "bege");
    }

    #[test]
    fn test_directory_lookup_loads_subtree() {
        let dir = tree();
        let db = TextDb::new(dir.path());
        let diodes = db.get(&["hardware", "detectors", "germanium", "diodes"]).unwrap();
        let keys: Vec<&String> = diodes.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["B00000B", "V07302A"]);
    }

    #[test]
    fn test_missing_keys() {
        let dir = tree();
        let db = TextDb::new(dir.path());
        assert!(matches!(
            db.get(&["hardware", "nothing"]),
            Err(MetadataError::NotFound(_))
        ));
        assert!(!db.contains(&["hardware", "detectors", "germanium", "diodes", "V07302A", "mass"]));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tree();
        let locked = dir.path().join("hardware/detectors/hades");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("V07302A.yaml"), "wrap: {}\n").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // privileged users read through missing permissions
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let db = TextDb::new(dir.path());
        let result = db.get(&["hardware", "detectors"]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        match result {
            Err(MetadataError::Malformed { path, .. }) => assert!(path.ends_with("hades")),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }
}
