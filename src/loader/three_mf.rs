//! 3MF parsing.
//!
//! A 3MF file is an OPC ZIP archive whose 3D payload lives in an XML part
//! (conventionally `3D/3dmodel.model`). The model holds `object` resources
//! (each a triangle mesh or a set of component references) composed by
//! `build/item` elements, optionally through row-major 3x4 transforms.
//! Like STL, the coordinate space is Z-up and gets converted on load.

use crate::loader::LoadError;
use crate::mesh::{accumulate_vertex_normals, TriangleMesh, NEUTRAL_BASE_COLOR};
use glam::{Mat4, Vec3, Vec4};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Component nesting guard; well-formed files stay shallow.
const MAX_COMPONENT_DEPTH: u32 = 8;

#[derive(Debug, Default)]
struct RawObject {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    components: Vec<(u32, Option<Mat4>)>,
}

#[derive(Debug, Default)]
struct ModelDocument {
    objects: HashMap<u32, RawObject>,
    build_items: Vec<(u32, Option<Mat4>)>,
}

pub fn parse(bytes: &[u8]) -> Result<TriangleMesh, LoadError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| LoadError::ThreeMfArchive { source: err })?;
    let xml = read_model_part(&mut archive)?;
    let document = parse_model_xml(&xml)?;
    compose(&document)
}

/// Locate and read the 3D model part out of the archive.
fn read_model_part(archive: &mut zip::ZipArchive<Cursor<&[u8]>>) -> Result<String, LoadError> {
    let name = {
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        names
            .iter()
            .find(|n| **n == "3D/3dmodel.model")
            .or_else(|| names.iter().find(|n| n.ends_with(".model")))
            .map(|n| n.to_string())
            .ok_or(LoadError::ThreeMfMissingModel)?
    };
    let mut part = archive
        .by_name(&name)
        .map_err(|err| LoadError::ThreeMfArchive { source: err })?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|err| LoadError::ThreeMfMalformed {
            detail: format!("model part '{name}' is not valid UTF-8 ({err})"),
        })?;
    Ok(xml)
}

fn parse_model_xml(xml: &str) -> Result<ModelDocument, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut document = ModelDocument::default();
    let mut current_object: Option<u32> = None;
    let mut in_build = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| LoadError::ThreeMfXml { source: err })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"object" => {
                    let id = require_attr_u32(e, b"id")?;
                    document.objects.insert(id, RawObject::default());
                    current_object = Some(id);
                }
                b"vertex" => {
                    let object = current_object_mut(&mut document, current_object)?;
                    object.positions.push(Vec3::new(
                        require_attr_f32(e, b"x")?,
                        require_attr_f32(e, b"y")?,
                        require_attr_f32(e, b"z")?,
                    ));
                }
                b"triangle" => {
                    let object = current_object_mut(&mut document, current_object)?;
                    object.indices.push(require_attr_u32(e, b"v1")?);
                    object.indices.push(require_attr_u32(e, b"v2")?);
                    object.indices.push(require_attr_u32(e, b"v3")?);
                }
                b"component" => {
                    let reference = require_attr_u32(e, b"objectid")?;
                    let transform = optional_transform(e)?;
                    let object = current_object_mut(&mut document, current_object)?;
                    object.components.push((reference, transform));
                }
                b"build" => in_build = true,
                b"item" if in_build => {
                    let reference = require_attr_u32(e, b"objectid")?;
                    let transform = optional_transform(e)?;
                    document.build_items.push((reference, transform));
                }
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"object" => current_object = None,
                b"build" => in_build = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(document)
}

fn current_object_mut(
    document: &mut ModelDocument,
    current: Option<u32>,
) -> Result<&mut RawObject, LoadError> {
    let id = current.ok_or_else(|| LoadError::ThreeMfMalformed {
        detail: "mesh data outside of an object element".to_string(),
    })?;
    document
        .objects
        .get_mut(&id)
        .ok_or_else(|| LoadError::ThreeMfMalformed {
            detail: format!("object {id} vanished during parse"),
        })
}

fn find_attr(start: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, LoadError> {
    for attr in start.attributes() {
        let attr = attr
            .map_err(quick_xml::Error::from)
            .map_err(|err| LoadError::ThreeMfXml { source: err })?;
        if attr.key.local_name().as_ref() == key {
            let value =
                std::str::from_utf8(&attr.value).map_err(|err| LoadError::ThreeMfMalformed {
                    detail: format!("attribute is not UTF-8: {err}"),
                })?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn require_attr_f32(start: &BytesStart<'_>, key: &[u8]) -> Result<f32, LoadError> {
    let value = require_attr(start, key)?;
    value.trim().parse().map_err(|_| LoadError::ThreeMfMalformed {
        detail: format!(
            "attribute '{}' is not a number: '{value}'",
            String::from_utf8_lossy(key)
        ),
    })
}

fn require_attr_u32(start: &BytesStart<'_>, key: &[u8]) -> Result<u32, LoadError> {
    let value = require_attr(start, key)?;
    value.trim().parse().map_err(|_| LoadError::ThreeMfMalformed {
        detail: format!(
            "attribute '{}' is not an index: '{value}'",
            String::from_utf8_lossy(key)
        ),
    })
}

fn require_attr(start: &BytesStart<'_>, key: &[u8]) -> Result<String, LoadError> {
    find_attr(start, key)?.ok_or_else(|| LoadError::ThreeMfMalformed {
        detail: format!(
            "element '{}' is missing attribute '{}'",
            String::from_utf8_lossy(start.name().as_ref()),
            String::from_utf8_lossy(key)
        ),
    })
}

/// Parse the 3MF `transform` attribute: twelve numbers, the rows of a 3x4
/// matrix applied to row vectors, the last row being the translation.
fn optional_transform(start: &BytesStart<'_>) -> Result<Option<Mat4>, LoadError> {
    let Some(value) = find_attr(start, b"transform")? else {
        return Ok(None);
    };
    let numbers: Vec<f32> = value
        .split_whitespace()
        .map(|token| token.parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| LoadError::ThreeMfMalformed {
            detail: format!("transform is not numeric: '{value}'"),
        })?;
    if numbers.len() != 12 {
        return Err(LoadError::ThreeMfMalformed {
            detail: format!("transform has {} numbers, expected 12", numbers.len()),
        });
    }
    let m = &numbers;
    Ok(Some(Mat4::from_cols(
        Vec4::new(m[0], m[1], m[2], 0.0),
        Vec4::new(m[3], m[4], m[5], 0.0),
        Vec4::new(m[6], m[7], m[8], 0.0),
        Vec4::new(m[9], m[10], m[11], 1.0),
    )))
}

/// Flatten build items (or, when the build section is absent, every object)
/// into one mesh, resolving component references recursively.
fn compose(document: &ModelDocument) -> Result<TriangleMesh, LoadError> {
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    let items: Vec<(u32, Option<Mat4>)> = if document.build_items.is_empty() {
        let mut ids: Vec<u32> = document.objects.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| (id, None)).collect()
    } else {
        document.build_items.clone()
    };

    for (id, transform) in items {
        append_object(
            document,
            id,
            transform.unwrap_or(Mat4::IDENTITY),
            0,
            &mut positions,
            &mut indices,
        )?;
    }

    let normals = accumulate_vertex_normals(&positions, &indices);
    let mut mesh = TriangleMesh::new(positions, normals, indices);
    mesh.base_color = NEUTRAL_BASE_COLOR;
    mesh.apply_transform(Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2));
    Ok(mesh)
}

fn append_object(
    document: &ModelDocument,
    id: u32,
    transform: Mat4,
    depth: u32,
    positions: &mut Vec<Vec3>,
    indices: &mut Vec<u32>,
) -> Result<(), LoadError> {
    if depth > MAX_COMPONENT_DEPTH {
        return Err(LoadError::ThreeMfMalformed {
            detail: format!("component nesting exceeds depth {MAX_COMPONENT_DEPTH}"),
        });
    }
    let object = document
        .objects
        .get(&id)
        .ok_or_else(|| LoadError::ThreeMfMalformed {
            detail: format!("build references unknown object {id}"),
        })?;

    if !object.positions.is_empty() {
        let base = positions.len() as u32;
        let vertex_count = object.positions.len() as u32;
        positions.extend(object.positions.iter().map(|p| transform.transform_point3(*p)));
        for &index in &object.indices {
            if index >= vertex_count {
                return Err(LoadError::ThreeMfMalformed {
                    detail: format!("triangle index {index} out of range in object {id}"),
                });
            }
            indices.push(base + index);
        }
    }
    for (reference, component_transform) in &object.components {
        append_object(
            document,
            *reference,
            transform * component_transform.unwrap_or(Mat4::IDENTITY),
            depth + 1,
            positions,
            indices,
        )?;
    }
    Ok(())
}

// ========================================================================
// Tests
// ========================================================================
