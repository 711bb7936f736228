// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GDML writer

use crate::error::{GdmlError, GeometryError, Result};
use crate::geometry::{Material, Placement, Registry, Shape, Solid};
use ahash::AHashSet;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

const SCHEMA_LOCATION: &str =
    "http://service-spi.web.cern.ch/service-spi/app/releases/GDML/schema/gdml.xsd";

/// Write a registry as a GDML file
pub fn write_gdml(registry: &Registry, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let document = to_string(registry)?;
    std::fs::write(path, document)?;
    tracing::info!(path = %path.display(), "wrote GDML");
    Ok(())
}

/// Serialize a registry to a GDML document
pub fn to_string(registry: &Registry) -> Result<String> {
    let world = registry.world().ok_or(GeometryError::NoWorld)?;
    let mut w = GdmlWriter {
        writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
    };

    w.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("gdml");
    root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
    root.push_attribute(("xsi:noNamespaceSchemaLocation", SCHEMA_LOCATION));
    w.emit(Event::Start(root))?;

    w.emit(Event::Empty(BytesStart::new("define")))?;
    w.materials(registry)?;
    w.solids(registry)?;
    w.structure(registry, world)?;
    w.userinfo(registry)?;

    let mut setup = BytesStart::new("setup");
    setup.push_attribute(("name", "Default"));
    setup.push_attribute(("version", "1.0"));
    w.emit(Event::Start(setup))?;
    w.empty("world", &[("ref", world)])?;
    w.end("setup")?;

    w.end("gdml")?;
    let bytes = w.writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| GdmlError::Invalid(e.to_string()).into())
}

/// Shortest representation that reads back to the same value
fn num(value: f64) -> String {
    format!("{}", value)
}

struct GdmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl GdmlWriter {
    fn emit(&mut self, event: Event) -> std::result::Result<(), GdmlError> {
        self.writer
            .write_event(event)
            .map_err(quick_xml::Error::from)?;
        Ok(())
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> std::result::Result<(), GdmlError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.emit(Event::Start(element))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> std::result::Result<(), GdmlError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.emit(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> std::result::Result<(), GdmlError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    /// Mixtures only; NIST materials are predefined in the simulation
    fn materials(&mut self, registry: &Registry) -> std::result::Result<(), GdmlError> {
        self.start("materials", &[])?;
        for material in registry.materials() {
            let Material::Mixture(mixture) = material else {
                continue;
            };
            self.start(
                "material",
                &[("name", mixture.name.as_str()), ("state", mixture.state.as_str())],
            )?;
            self.empty(
                "D",
                &[("value", num(mixture.density_g_cm3).as_str()), ("unit", "g/cm3")],
            )?;
            for (component, fraction) in &mixture.fractions {
                self.empty(
                    "fraction",
                    &[("n", num(*fraction).as_str()), ("ref", component.as_str())],
                )?;
            }
            self.end("material")?;
        }
        self.end("materials")
    }

    fn solids(&mut self, registry: &Registry) -> std::result::Result<(), GdmlError> {
        self.start("solids", &[])?;
        for solid in registry.solids() {
            self.solid(solid)?;
        }
        self.end("solids")
    }

    fn solid(&mut self, solid: &Solid) -> std::result::Result<(), GdmlError> {
        let name = solid.name.as_str();
        let kind = solid.shape.kind_name();
        match &solid.shape {
            Shape::Box { x, y, z } => self.empty(
                kind,
                &[
                    ("name", name),
                    ("x", num(*x).as_str()),
                    ("y", num(*y).as_str()),
                    ("z", num(*z).as_str()),
                    ("lunit", "mm"),
                ],
            ),
            Shape::Tube {
                rmin,
                rmax,
                z,
                startphi,
                deltaphi,
            } => self.empty(
                kind,
                &[
                    ("name", name),
                    ("rmin", num(*rmin).as_str()),
                    ("rmax", num(*rmax).as_str()),
                    ("z", num(*z).as_str()),
                    ("startphi", num(*startphi).as_str()),
                    ("deltaphi", num(*deltaphi).as_str()),
                    ("aunit", "rad"),
                    ("lunit", "mm"),
                ],
            ),
            Shape::Polycone {
                startphi,
                deltaphi,
                planes,
            } => {
                self.start_rotational(kind, name, *startphi, *deltaphi)?;
                for plane in planes {
                    self.empty(
                        "zplane",
                        &[
                            ("z", num(plane.z).as_str()),
                            ("rmin", num(plane.rmin).as_str()),
                            ("rmax", num(plane.rmax).as_str()),
                        ],
                    )?;
                }
                self.end(kind)
            }
            Shape::GenericPolycone {
                startphi,
                deltaphi,
                points,
            } => {
                self.start_rotational(kind, name, *startphi, *deltaphi)?;
                for point in points {
                    self.empty(
                        "rzpoint",
                        &[("r", num(point.r).as_str()), ("z", num(point.z).as_str())],
                    )?;
                }
                self.end(kind)
            }
            Shape::Subtraction {
                first,
                second,
                placement,
            } => {
                self.start(kind, &[("name", name)])?;
                self.empty("first", &[("ref", first.as_str())])?;
                self.empty("second", &[("ref", second.as_str())])?;
                self.placement(name, placement)?;
                self.end(kind)
            }
        }
    }

    fn start_rotational(
        &mut self,
        kind: &str,
        name: &str,
        startphi: f64,
        deltaphi: f64,
    ) -> std::result::Result<(), GdmlError> {
        let (startphi, deltaphi) = (num(startphi), num(deltaphi));
        self.start(
            kind,
            &[
                ("name", name),
                ("startphi", startphi.as_str()),
                ("deltaphi", deltaphi.as_str()),
                ("aunit", "rad"),
                ("lunit", "mm"),
            ],
        )
    }

    fn placement(&mut self, owner: &str, placement: &Placement) -> std::result::Result<(), GdmlError> {
        let p = placement.position;
        self.empty(
            "position",
            &[
                ("name", format!("{}_pos", owner).as_str()),
                ("x", num(p.x).as_str()),
                ("y", num(p.y).as_str()),
                ("z", num(p.z).as_str()),
                ("unit", "mm"),
            ],
        )?;
        if placement.is_rotated() {
            let r = placement.rotation;
            self.empty(
                "rotation",
                &[
                    ("name", format!("{}_rot", owner).as_str()),
                    ("x", num(r.x).as_str()),
                    ("y", num(r.y).as_str()),
                    ("z", num(r.z).as_str()),
                    ("unit", "rad"),
                ],
            )?;
        }
        Ok(())
    }

    /// Logical volumes, every daughter before its mother
    fn structure(&mut self, registry: &Registry, world: &str) -> std::result::Result<(), GdmlError> {
        let mut order = Vec::new();
        let mut seen = AHashSet::new();
        post_order(registry, world, &mut seen, &mut order);
        for volume in registry.logical_volumes() {
            post_order(registry, &volume.name, &mut seen, &mut order);
        }

        self.start("structure", &[])?;
        for name in order {
            let Some(volume) = registry.logical_volume(name) else {
                continue;
            };
            self.start("volume", &[("name", volume.name.as_str())])?;
            self.empty("materialref", &[("ref", volume.material.as_str())])?;
            self.empty("solidref", &[("ref", volume.solid.as_str())])?;
            for pv in registry.daughters(&volume.name) {
                let copy_number = pv.copy_number.to_string();
                let mut attributes = vec![("name", pv.name.as_str())];
                if pv.copy_number != 0 {
                    attributes.push(("copynumber", copy_number.as_str()));
                }
                self.start("physvol", &attributes)?;
                self.empty("volumeref", &[("ref", pv.logical.as_str())])?;
                self.placement(&pv.name, &pv.placement)?;
                self.end("physvol")?;
            }
            if let Some([r, g, b, a]) = volume.color {
                let color = format!("[{}, {}, {}, {}]", r, g, b, a);
                self.empty("auxiliary", &[("auxtype", "rmg_color"), ("auxvalue", color.as_str())])?;
            }
            self.end("volume")?;
        }
        self.end("structure")
    }

    /// Sensitive detector tables read by the simulation
    fn userinfo(&mut self, registry: &Registry) -> std::result::Result<(), GdmlError> {
        let detectors = registry.detectors();
        if detectors.is_empty() {
            return Ok(());
        }
        self.start("userinfo", &[])?;

        let mut kinds: Vec<_> = detectors.iter().map(|d| d.kind).collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds.dedup();
        for kind in kinds {
            self.start(
                "auxiliary",
                &[("auxtype", "RMG_detector"), ("auxvalue", kind.as_str())],
            )?;
            for detector in detectors.iter().filter(|d| d.kind == kind) {
                let uid = detector.uid.to_string();
                self.empty(
                    "auxiliary",
                    &[("auxtype", detector.physvol.as_str()), ("auxvalue", uid.as_str())],
                )?;
            }
            self.end("auxiliary")?;
        }

        if detectors.iter().any(|d| d.metadata.is_some()) {
            self.start(
                "auxiliary",
                &[("auxtype", "RMG_detector_meta"), ("auxvalue", "")],
            )?;
            for detector in detectors {
                if let Some(meta) = &detector.metadata {
                    let json = meta.to_string();
                    self.empty(
                        "auxiliary",
                        &[("auxtype", detector.physvol.as_str()), ("auxvalue", json.as_str())],
                    )?;
                }
            }
            self.end("auxiliary")?;
        }
        self.end("userinfo")
    }
}

fn post_order<'a>(
    registry: &'a Registry,
    logical: &'a str,
    seen: &mut AHashSet<&'a str>,
    order: &mut Vec<&'a str>,
) {
    if !seen.insert(logical) {
        return;
    }
    for pv in registry.daughters(logical) {
        post_order(registry, &pv.logical, seen, order);
    }
    order.push(logical);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{
        DetectorKind, DetectorRegistration, LogicalVolume, PhysicalVolume, RzPoint,
    };

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.add_material(Material::nist("G4_AIR")).unwrap();
        reg.add_material(Material::germanium(Some(0.9))).unwrap();
        reg.add_solid(Solid::new("world", Shape::Box { x: 1000.0, y: 1000.0, z: 1000.0 }))
            .unwrap();
        reg.add_solid(Solid::new(
            "crystal",
            Shape::full_generic_polycone(vec![
                RzPoint::new(0.0, 0.0),
                RzPoint::new(10.0, 0.0),
                RzPoint::new(10.0, 20.0),
                RzPoint::new(0.0, 20.0),
            ]),
        ))
        .unwrap();
        reg.add_logical_volume(LogicalVolume::new("world_lv", "world", "G4_AIR"))
            .unwrap();
        reg.add_logical_volume(
            LogicalVolume::new("crystal", "crystal", "EnrichedGermanium0.900")
                .with_color([0.0, 0.5, 1.0, 1.0]),
        )
        .unwrap();
        reg.set_world("world_lv").unwrap();
        reg.add_physical_volume(PhysicalVolume::new(
            "det",
            "crystal",
            "world_lv",
            Placement::at(0.0, 0.0, -50.5),
        ))
        .unwrap();
        reg.register_detector(DetectorRegistration {
            physvol: "det".into(),
            kind: DetectorKind::Germanium,
            uid: 1,
            metadata: Some(serde_json::json!({"name": "det"})),
        })
        .unwrap();
        reg
    }

    #[test]
    fn test_document_sections_in_order() {
        let doc = to_string(&registry()).unwrap();
        let at = |s: &str| doc.find(s).unwrap_or_else(|| panic!("missing {}", s));
        assert!(at("<define/>") < at("<materials>"));
        assert!(at("<materials>") < at("<solids>"));
        assert!(at("<solids>") < at("<structure>"));
        assert!(at("<structure>") < at("<userinfo>"));
        assert!(at("<userinfo>") < at("<setup"));
        assert!(doc.contains(r#"<world ref="world_lv"/>"#));
    }

    #[test]
    fn test_daughters_written_before_mothers() {
        let doc = to_string(&registry()).unwrap();
        assert!(doc.find(r#"<volume name="crystal">"#) < doc.find(r#"<volume name="world_lv">"#));
        assert!(doc.contains(r#"z="-50.5""#));
    }

    #[test]
    fn test_only_mixtures_are_written() {
        let doc = to_string(&registry()).unwrap();
        assert!(doc.contains(r#"<material name="EnrichedGermanium0.900" state="solid">"#));
        assert!(!doc.contains(r#"name="G4_AIR""#));
        assert!(doc.contains(r#"<fraction n="1" ref="G4_Ge"/>"#));
    }

    #[test]
    fn test_detector_userinfo() {
        let doc = to_string(&registry()).unwrap();
        assert!(doc.contains(r#"<auxiliary auxtype="RMG_detector" auxvalue="germanium">"#));
        assert!(doc.contains(r#"<auxiliary auxtype="det" auxvalue="1"/>"#));
        assert!(doc.contains("RMG_detector_meta"));
        assert!(doc.contains(r#"auxvalue="[0, 0.5, 1, 1]""#));
    }

    #[test]
    fn test_requires_world() {
        assert!(to_string(&Registry::new()).is_err());
    }
}
