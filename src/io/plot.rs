// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! PNG rendering of r-z profiles

use crate::error::{GeometryError, Result};
use crate::geometry::Profile;
use image::{Rgb, RgbImage};
use std::collections::BTreeMap;
use std::path::Path;

const WIDTH: u32 = 600;
const HEIGHT: u32 = 800;
const MARGIN: f64 = 40.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([170, 170, 170]);
const PALETTE: [[u8; 3]; 8] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [23, 190, 207],
];

/// Draw every profile into one PNG, height up, and return the legend
pub fn plot_profiles(
    profiles: &BTreeMap<String, Profile>,
    path: impl AsRef<Path>,
) -> Result<Vec<(String, [u8; 3])>> {
    let image = render_profiles(profiles)?;
    let path = path.as_ref();
    image.save(path)?;
    tracing::info!(path = %path.display(), profiles = profiles.len(), "saved profile plot");

    Ok(profiles
        .keys()
        .zip(PALETTE.iter().cycle())
        .map(|(name, color)| (name.clone(), *color))
        .collect())
}

pub fn render_profiles(profiles: &BTreeMap<String, Profile>) -> std::result::Result<RgbImage, GeometryError> {
    if profiles.is_empty() {
        return Err(GeometryError::InvalidParameter("no profiles to plot".into()));
    }

    let r_max = profiles.values().map(Profile::r_max).fold(0.0, f64::max);
    let (z_min, z_max) = profiles
        .values()
        .map(Profile::z_range)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a), hi.max(b))
        });
    let dz = (z_max - z_min).max(1e-9);
    let scale = ((WIDTH as f64 - 2.0 * MARGIN) / r_max.max(1e-9))
        .min((HEIGHT as f64 - 2.0 * MARGIN) / dz);
    let project = |r: f64, z: f64| {
        (
            (MARGIN + r * scale).round() as i64,
            (HEIGHT as f64 - MARGIN - (z - z_min) * scale).round() as i64,
        )
    };

    let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    let (x0, y0) = project(0.0, z_min);
    let (x1, y1) = project(0.0, z_max);
    draw_line(&mut image, (x0, y0), (x1, y1), AXIS);

    for (profile, color) in profiles.values().zip(PALETTE.iter().cycle()) {
        let points: Vec<_> = profile.points().map(|(r, z)| project(r, z)).collect();
        for pair in points.windows(2) {
            draw_line(&mut image, pair[0], pair[1], Rgb(*color));
        }
    }
    Ok(image)
}

/// Bresenham line, two pixels wide
fn draw_line(image: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        for (ox, oy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let (px, py) = (x + ox, y + oy);
            if px >= 0 && py >= 0 && px < image.width() as i64 && py < image.height() as i64 {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
