// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Merging of metadata records

use serde_json::Value;

/// Recursively merge `overlay` into `base`; mappings merge, anything else replaces
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Attach a HADES mounting record to a diode record under the key `hades`
pub fn merge_configs(diode: &Value, hades: &Value) -> Value {
    let mut merged = diode.clone();
    let mut overlay = serde_json::Map::new();
    overlay.insert("hades".to_string(), hades.clone());
    deep_merge(&mut merged, &Value::Object(overlay));
    merged
}
