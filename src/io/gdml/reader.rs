// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GDML reader for the subset written by this crate

use crate::error::{GdmlError, Result};
use crate::geometry::{
    DetectorKind, DetectorRegistration, LogicalVolume, Material, MaterialState, Mixture,
    PhysicalVolume, Placement, Registry, RzPoint, Shape, Solid, ZPlane,
};
use crate::io::expression::{evaluate, Scope};
use ahash::AHashMap;
use nalgebra::Vector3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::path::Path;

/// Read a GDML file
pub fn read_gdml(path: impl AsRef<Path>) -> Result<Registry> {
    read_gdml_with_replacements(path, &BTreeMap::new())
}

/// Read a GDML file, overriding `<constant>` values by name
pub fn read_gdml_with_replacements(
    path: impl AsRef<Path>,
    replacements: &BTreeMap<String, f64>,
) -> Result<Registry> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let registry = parse_gdml_with_replacements(&text, replacements)?;
    tracing::debug!(
        path = %path.display(),
        volumes = registry.logical_volumes().len(),
        "read GDML"
    );
    Ok(registry)
}

/// Parse a GDML document
pub fn parse_gdml(text: &str) -> Result<Registry> {
    parse_gdml_with_replacements(text, &BTreeMap::new())
}

pub fn parse_gdml_with_replacements(
    text: &str,
    replacements: &BTreeMap<String, f64>,
) -> Result<Registry> {
    let root = parse_tree(text)?;
    if root.name != "gdml" {
        return Err(GdmlError::Invalid(format!("root element is <{}>, expected <gdml>", root.name)).into());
    }
    let mut reader = GdmlReader {
        scope: Scope::new(),
        positions: AHashMap::new(),
        rotations: AHashMap::new(),
        replacements,
        reg: Registry::new(),
    };
    for section in &root.children {
        match section.name.as_str() {
            "define" => reader.define(section)?,
            "materials" => reader.materials(section)?,
            "solids" => reader.solids(section)?,
            "structure" => reader.structure(section)?,
            "userinfo" => reader.userinfo(section)?,
            "setup" => reader.setup(section)?,
            other => return Err(GdmlError::Unsupported(other.to_string()).into()),
        }
    }
    if reader.reg.world().is_none() {
        return Err(GdmlError::Invalid("no <setup> with a world volume".into()).into());
    }
    Ok(reader.reg)
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart) -> std::result::Result<Self, GdmlError> {
        let mut element = Element {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, name: &str) -> std::result::Result<&str, GdmlError> {
        self.attr(name).ok_or_else(|| GdmlError::MissingAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn parse_tree(text: &str) -> std::result::Result<Element, GdmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| GdmlError::Invalid("unbalanced closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(GdmlError::Invalid("unexpected end of document".into()));
    }
    root.ok_or_else(|| GdmlError::Invalid("empty document".into()))
}

fn length_unit(unit: &str) -> std::result::Result<f64, GdmlError> {
    match unit {
        "mm" => Ok(1.0),
        "cm" => Ok(10.0),
        "m" => Ok(1000.0),
        other => Err(GdmlError::Invalid(format!("unsupported length unit `{}`", other))),
    }
}

fn angle_unit(unit: &str) -> std::result::Result<f64, GdmlError> {
    match unit {
        "rad" => Ok(1.0),
        "deg" => Ok(std::f64::consts::PI / 180.0),
        other => Err(GdmlError::Invalid(format!("unsupported angle unit `{}`", other))),
    }
}

struct GdmlReader<'r> {
    scope: Scope,
    positions: AHashMap<String, Vector3<f64>>,
    rotations: AHashMap<String, Vector3<f64>>,
    replacements: &'r BTreeMap<String, f64>,
    reg: Registry,
}

impl GdmlReader<'_> {
    fn value(&self, element: &Element, name: &str) -> std::result::Result<f64, GdmlError> {
        evaluate(element.require(name)?, &self.scope)
    }

    fn value_or(&self, element: &Element, name: &str, default: f64) -> std::result::Result<f64, GdmlError> {
        match element.attr(name) {
            Some(expression) => evaluate(expression, &self.scope),
            None => Ok(default),
        }
    }

    fn lunit(element: &Element, attribute: &str) -> std::result::Result<f64, GdmlError> {
        length_unit(element.attr(attribute).unwrap_or("mm"))
    }

    fn aunit(element: &Element, attribute: &str) -> std::result::Result<f64, GdmlError> {
        angle_unit(element.attr(attribute).unwrap_or("rad"))
    }

    fn vector(&self, element: &Element, unit: f64) -> std::result::Result<Vector3<f64>, GdmlError> {
        Ok(Vector3::new(
            self.value_or(element, "x", 0.0)? * unit,
            self.value_or(element, "y", 0.0)? * unit,
            self.value_or(element, "z", 0.0)? * unit,
        ))
    }

    fn define(&mut self, section: &Element) -> std::result::Result<(), GdmlError> {
        for item in &section.children {
            let name = item.require("name")?.to_string();
            match item.name.as_str() {
                "constant" | "variable" => {
                    let value = match self.replacements.get(&name) {
                        Some(&replacement) if item.name == "constant" => {
                            tracing::debug!(constant = %name, value = replacement, "replacing constant");
                            replacement
                        }
                        _ => self.value(item, "value")?,
                    };
                    self.scope.insert(name, value);
                }
                "quantity" => {
                    let unit = match item.attr("unit") {
                        Some(unit) => evaluate(unit, &Scope::new())?,
                        None => 1.0,
                    };
                    let value = self.value(item, "value")? * unit;
                    self.scope.insert(name, value);
                }
                "position" => {
                    let position = self.vector(item, Self::lunit(item, "unit")?)?;
                    self.positions.insert(name, position);
                }
                "rotation" => {
                    let rotation = self.vector(item, Self::aunit(item, "unit")?)?;
                    self.rotations.insert(name, rotation);
                }
                other => return Err(GdmlError::Unsupported(other.to_string())),
            }
        }
        Ok(())
    }

    /// Predefined materials of logical volumes are registered on first reference
    fn ensure_material(&mut self, name: &str) -> std::result::Result<(), GdmlError> {
        if self.reg.material(name).is_none() {
            self.reg
                .add_material(Material::nist(name))
                .map_err(|e| GdmlError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    fn materials(&mut self, section: &Element) -> std::result::Result<(), GdmlError> {
        for item in &section.children {
            if item.name != "material" || item.attr("Z").is_some() {
                return Err(GdmlError::Unsupported(item.name.clone()));
            }
            let name = item.require("name")?.to_string();
            let density = item
                .child("D")
                .ok_or_else(|| GdmlError::Invalid(format!("material {} has no density", name)))?;
            let density_unit = match density.attr("unit").unwrap_or("g/cm3") {
                "g/cm3" => 1.0,
                "mg/cm3" | "kg/m3" => 1e-3,
                other => {
                    return Err(GdmlError::Invalid(format!("unsupported density unit `{}`", other)))
                }
            };
            let state = match item.attr("state") {
                Some(state) => MaterialState::from_str(state)
                    .ok_or_else(|| GdmlError::Invalid(format!("unknown material state `{}`", state)))?,
                None => MaterialState::Solid,
            };

            let mut fractions = Vec::new();
            for fraction in item.children.iter().filter(|c| c.name == "fraction") {
                // components stay references, as in a constructed registry
                let component = fraction.require("ref")?.to_string();
                fractions.push((component, self.value(fraction, "n")?));
            }
            if item.children.iter().any(|c| c.name == "composite") {
                return Err(GdmlError::Unsupported("composite".into()));
            }

            let mixture = Mixture {
                name,
                density_g_cm3: self.value(density, "value")? * density_unit,
                state,
                fractions,
            };
            self.reg
                .add_material(Material::Mixture(mixture))
                .map_err(|e| GdmlError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    fn solids(&mut self, section: &Element) -> std::result::Result<(), GdmlError> {
        for item in &section.children {
            let name = item.require("name")?.to_string();
            let shape = self.shape(item)?;
            self.reg
                .add_solid(Solid::new(name, shape))
                .map_err(|e| GdmlError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    fn shape(&self, item: &Element) -> std::result::Result<Shape, GdmlError> {
        let l = Self::lunit(item, "lunit")?;
        let a = Self::aunit(item, "aunit")?;
        let phi = |reader: &Self| -> std::result::Result<(f64, f64), GdmlError> {
            Ok((
                reader.value_or(item, "startphi", 0.0)? * a,
                reader.value(item, "deltaphi")? * a,
            ))
        };
        Ok(match item.name.as_str() {
            "box" => Shape::Box {
                x: self.value(item, "x")? * l,
                y: self.value(item, "y")? * l,
                z: self.value(item, "z")? * l,
            },
            "tube" => {
                let (startphi, deltaphi) = phi(self)?;
                Shape::Tube {
                    rmin: self.value_or(item, "rmin", 0.0)? * l,
                    rmax: self.value(item, "rmax")? * l,
                    z: self.value(item, "z")? * l,
                    startphi,
                    deltaphi,
                }
            }
            "polycone" => {
                let (startphi, deltaphi) = phi(self)?;
                let planes = item
                    .children
                    .iter()
                    .filter(|c| c.name == "zplane")
                    .map(|p| {
                        Ok(ZPlane {
                            z: self.value(p, "z")? * l,
                            rmin: self.value_or(p, "rmin", 0.0)? * l,
                            rmax: self.value(p, "rmax")? * l,
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, GdmlError>>()?;
                Shape::Polycone {
                    startphi,
                    deltaphi,
                    planes,
                }
            }
            "genericPolycone" => {
                let (startphi, deltaphi) = phi(self)?;
                let points = item
                    .children
                    .iter()
                    .filter(|c| c.name == "rzpoint")
                    .map(|p| Ok(RzPoint::new(self.value(p, "r")? * l, self.value(p, "z")? * l)))
                    .collect::<std::result::Result<Vec<_>, GdmlError>>()?;
                Shape::GenericPolycone {
                    startphi,
                    deltaphi,
                    points,
                }
            }
            "subtraction" => {
                let operand = |which: &str| -> std::result::Result<String, GdmlError> {
                    let child = item.child(which).ok_or_else(|| {
                        GdmlError::Invalid(format!("subtraction {} has no <{}>", item.attr("name").unwrap_or("?"), which))
                    })?;
                    Ok(child.require("ref")?.to_string())
                };
                Shape::Subtraction {
                    first: operand("first")?,
                    second: operand("second")?,
                    placement: self.placement(item)?,
                }
            }
            other => return Err(GdmlError::Unsupported(other.to_string())),
        })
    }

    /// Inline or referenced position and rotation of a physvol or boolean
    fn placement(&self, item: &Element) -> std::result::Result<Placement, GdmlError> {
        let mut placement = Placement::identity();
        for child in &item.children {
            match child.name.as_str() {
                "position" => placement.position = self.vector(child, Self::lunit(child, "unit")?)?,
                "rotation" => placement.rotation = self.vector(child, Self::aunit(child, "unit")?)?,
                "positionref" => {
                    let name = child.require("ref")?;
                    placement.position = *self
                        .positions
                        .get(name)
                        .ok_or_else(|| GdmlError::Invalid(format!("undefined position `{}`", name)))?;
                }
                "rotationref" => {
                    let name = child.require("ref")?;
                    placement.rotation = *self
                        .rotations
                        .get(name)
                        .ok_or_else(|| GdmlError::Invalid(format!("undefined rotation `{}`", name)))?;
                }
                "scale" | "scaleref" | "firstposition" | "firstrotation" | "firstpositionref"
                | "firstrotationref" => return Err(GdmlError::Unsupported(child.name.clone())),
                _ => {}
            }
        }
        Ok(placement)
    }

    fn structure(&mut self, section: &Element) -> std::result::Result<(), GdmlError> {
        for volume in &section.children {
            if volume.name != "volume" {
                return Err(GdmlError::Unsupported(volume.name.clone()));
            }
            let name = volume.require("name")?.to_string();
            let reference = |tag: &str| -> std::result::Result<String, GdmlError> {
                let child = volume
                    .child(tag)
                    .ok_or_else(|| GdmlError::Invalid(format!("volume {} has no <{}>", name, tag)))?;
                Ok(child.require("ref")?.to_string())
            };
            let material = reference("materialref")?;
            let solid = reference("solidref")?;
            self.ensure_material(&material)?;

            let mut logical = LogicalVolume::new(name.as_str(), solid, material);
            for aux in volume.children.iter().filter(|c| c.name == "auxiliary") {
                if aux.attr("auxtype") == Some("rmg_color") {
                    let color: [f32; 4] = serde_json::from_str(aux.require("auxvalue")?)
                        .map_err(|e| GdmlError::Invalid(format!("color of {}: {}", name, e)))?;
                    logical = logical.with_color(color);
                }
            }
            self.reg
                .add_logical_volume(logical)
                .map_err(|e| GdmlError::Invalid(e.to_string()))?;

            for physvol in volume.children.iter().filter(|c| c.name == "physvol") {
                let daughter = physvol
                    .child("volumeref")
                    .ok_or_else(|| GdmlError::Unsupported("physvol without volumeref".into()))?
                    .require("ref")?;
                let pv_name = physvol
                    .attr("name")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}_PV", daughter));
                let mut pv = PhysicalVolume::new(pv_name, daughter, name.as_str(), self.placement(physvol)?);
                if let Some(copy) = physvol.attr("copynumber") {
                    pv.copy_number = copy
                        .parse()
                        .map_err(|_| GdmlError::Invalid(format!("bad copynumber `{}`", copy)))?;
                }
                self.reg
                    .add_physical_volume(pv)
                    .map_err(|e| GdmlError::Invalid(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn userinfo(&mut self, section: &Element) -> std::result::Result<(), GdmlError> {
        let mut detectors: Vec<DetectorRegistration> = Vec::new();
        let mut metadata: AHashMap<String, serde_json::Value> = AHashMap::new();
        for aux in section.children.iter().filter(|c| c.name == "auxiliary") {
            match aux.attr("auxtype") {
                Some("RMG_detector") => {
                    let kind = aux.require("auxvalue")?;
                    let kind = DetectorKind::from_str(kind)
                        .ok_or_else(|| GdmlError::Invalid(format!("unknown detector kind `{}`", kind)))?;
                    for entry in &aux.children {
                        let uid = entry.require("auxvalue")?;
                        detectors.push(DetectorRegistration {
                            physvol: entry.require("auxtype")?.to_string(),
                            kind,
                            uid: uid
                                .parse()
                                .map_err(|_| GdmlError::Invalid(format!("bad detector uid `{}`", uid)))?,
                            metadata: None,
                        });
                    }
                }
                Some("RMG_detector_meta") => {
                    for entry in &aux.children {
                        let value = serde_json::from_str(entry.require("auxvalue")?)
                            .map_err(|e| GdmlError::Invalid(format!("detector metadata: {}", e)))?;
                        metadata.insert(entry.require("auxtype")?.to_string(), value);
                    }
                }
                other => tracing::debug!(auxtype = ?other, "ignoring userinfo entry"),
            }
        }
        for mut detector in detectors {
            detector.metadata = metadata.remove(&detector.physvol);
            self.reg
                .register_detector(detector)
                .map_err(|e| GdmlError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    fn setup(&mut self, section: &Element) -> std::result::Result<(), GdmlError> {
        if self.reg.world().is_some() {
            tracing::debug!(setup = ?section.attr("name"), "ignoring additional setup");
            return Ok(());
        }
        let world = section
            .child("world")
            .ok_or_else(|| GdmlError::Invalid("<setup> has no <world>".into()))?
            .require("ref")?;
        self.reg
            .set_world(world)
            .map_err(|e| GdmlError::Invalid(e.to_string()))
    }
}
