// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! hades-geom CLI

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use hades_geom::cli::{export_scene, profile_mother, Reporter, Viewer};
use hades_geom::config::{GeometryConfig, VisScene};
use hades_geom::geometry::{
    check_overlaps, check_registry_sanity, collect_profiles, overlaps::DEFAULT_RESOLUTION,
    print_volumes, VolumeKind,
};
use hades_geom::hades::{construct, Assembly};
use hades_geom::io;
use hades_geom::metadata::open_metadata;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const OVERLAP_TOLERANCE: f64 = 1e-3;
const DEFAULT_PROFILE_PLOT: &str = "profiles.png";

#[derive(Parser)]
#[command(name = "hades-geom")]
#[command(version, about = "HADES HPGe test stand geometry builder", long_about = None)]
struct Cli {
    /// Output GDML file
    #[arg(value_name = "FILE")]
    output: Option<PathBuf>,

    /// Measurement configuration (YAML, JSON or TOML)
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Metadata root, defaults to $HADES_METADATA
    #[arg(long, value_name = "DIR")]
    metadata: Option<PathBuf>,

    /// Build from the bundled public test data
    #[arg(long)]
    public_geom: bool,

    /// Comma separated assemblies to build instead of the configured ones
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    assemblies: Option<Vec<String>>,

    /// Debug output for hades-geom
    #[arg(short, long)]
    verbose: bool,

    /// Debug output for everything
    #[arg(short, long)]
    debug: bool,

    /// Export the scene and open it in the viewer, with an optional scene file
    #[arg(long, value_name = "SCENE", num_args = 0..=1, default_missing_value = "")]
    visualize: Option<String>,

    /// Cut the visualized geometry at x = 0
    #[arg(long)]
    clip_geometry: bool,

    /// Sample surfaces and report overlapping volumes
    #[arg(long)]
    check_overlaps: bool,

    /// List logical, physical or detector volumes
    #[arg(long, value_name = "KIND", value_parser = ["logical", "physical", "detector"])]
    print_volumes: Option<String>,

    /// Plot the r-z profiles around the detector
    #[arg(short = 'p', long, value_name = "PNG", num_args = 0..=1, default_missing_value = DEFAULT_PROFILE_PLOT)]
    plot_profile: Option<PathBuf>,
}

fn init_logging(verbose: bool, debug: bool) {
    let default = if debug {
        "debug"
    } else if verbose {
        "warn,hades_geom=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    if cli.output.is_none() && cli.visualize.is_none() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "no output file and no visualization specified",
            )
            .exit();
    }

    if let Err(e) = run(&cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();

    let mut config = GeometryConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    if let Some(names) = &cli.assemblies {
        config = config.with_assemblies(parse_assemblies(names)?);
    }

    let metadata = open_metadata(cli.metadata.as_deref(), cli.public_geom)
        .context("Failed to open metadata")?;
    Reporter::progress(&format!("Building geometry for {}", config.hpge_name));
    let registry = construct(&config, metadata.as_ref())
        .with_context(|| format!("Failed to construct geometry for {}", config.hpge_name))?;

    let sanity = check_registry_sanity(&registry);
    Reporter::report_sanity(&sanity);
    if !sanity.is_ok() {
        bail!("geometry failed the sanity check");
    }

    if cli.check_overlaps {
        let overlaps = check_overlaps(&registry, OVERLAP_TOLERANCE, DEFAULT_RESOLUTION)
            .context("Failed to check overlaps")?;
        Reporter::report_overlaps(&overlaps);
    }

    if let Some(kind) = cli.print_volumes.as_deref().and_then(VolumeKind::from_str) {
        Reporter::report_volumes(kind.as_str(), &print_volumes(&registry, kind));
    }

    if let Some(output) = &cli.output {
        io::write_gdml(&registry, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    if let Some(path) = &cli.plot_profile {
        let mother = profile_mother(&registry, &config.hpge_name)
            .context("geometry has no world volume")?;
        let profiles = collect_profiles(&registry, mother)?;
        let legend = io::plot_profiles(&profiles, path)
            .with_context(|| format!("Failed to plot profiles to {}", path.display()))?;
        Reporter::report_legend(path, &legend);
    }

    if let Some(scene_file) = &cli.visualize {
        visualize(&registry, scene_file, cli.clip_geometry)?;
    }

    Reporter::report_build(
        &config.hpge_name,
        &registry,
        cli.output.as_deref(),
        start.elapsed(),
    );
    Ok(())
}

fn parse_assemblies(names: &[String]) -> Result<Vec<Assembly>> {
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| Assembly::from_str(n).with_context(|| format!("unknown assembly `{}`", n)))
        .collect()
}

fn visualize(registry: &hades_geom::geometry::Registry, scene_file: &str, clip: bool) -> Result<()> {
    let mut scene = if scene_file.is_empty() {
        VisScene::default()
    } else {
        VisScene::from_file(Path::new(scene_file))
            .with_context(|| format!("Failed to load scene {}", scene_file))?
    }
    .with_env_overrides();
    if clip {
        scene.add_default_clipper();
    }

    let exported = export_scene(registry, &scene)?;
    Reporter::report_info(&format!(
        "scene with {} volumes written to {} in {}",
        exported.volumes,
        exported.path.display(),
        Reporter::format_duration(exported.duration)
    ));

    match Viewer::from_scene(&scene) {
        Some(viewer) => {
            viewer.open(&exported.path)?;
        }
        None => Reporter::report_warning(
            "no viewer configured; set `viewer` in the scene file or HADES_VIEWER",
        ),
    }
    Ok(())
}
