//! Mapping decoded records onto flat, render-ready attribute arrays.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::de::{ElementRecord, PropertyValue};
use crate::{ElementDef, PlyHeader};

/// Decoded geometry, laid out as flat arrays for GPU upload.
///
/// Optional attributes are either empty or hold one entry per vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryBuffer {
    /// Positions, stride 3.
    pub vertices: Vec<f32>,
    /// Normals, stride 3.
    pub normals: Vec<f32>,
    /// Colors normalized to `[0, 1]`, stride 3.
    pub colors: Vec<f32>,
    /// Texture coordinates, stride 2.
    pub uvs: Vec<f32>,
    /// Triangle list.
    pub indices: Vec<u32>,
    /// Texture coordinates per triangle corner, stride 2.
    pub face_vertex_uvs: Vec<f32>,
}

impl GeometryBuffer {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }
}

// Accepted property names per attribute role, in order of preference.
const POS_X: &[&str] = &["x", "px", "posx"];
const POS_Y: &[&str] = &["y", "py", "posy"];
const POS_Z: &[&str] = &["z", "pz", "posz"];
const NORMAL_X: &[&str] = &["nx", "normalx"];
const NORMAL_Y: &[&str] = &["ny", "normaly"];
const NORMAL_Z: &[&str] = &["nz", "normalz"];
const TEX_S: &[&str] = &["s", "u", "texture_u", "tx"];
const TEX_T: &[&str] = &["t", "v", "texture_v", "ty"];
const RED: &[&str] = &["red", "diffuse_red", "r", "diffuse_r"];
const GREEN: &[&str] = &["green", "diffuse_green", "g", "diffuse_g"];
const BLUE: &[&str] = &["blue", "diffuse_blue", "b", "diffuse_b"];
const FACE_INDICES: &[&str] = &["vertex_indices", "vertex_index"];
const FACE_TEXCOORD: &[&str] = &["texcoord"];

fn find_attr(elem_def: &ElementDef, aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| elem_def.property_index(alias))
}

fn find_all<const N: usize>(elem_def: &ElementDef, roles: [&[&str]; N]) -> Option<[usize; N]> {
    let mut found = [0; N];
    for (slot, aliases) in found.iter_mut().zip(roles) {
        *slot = find_attr(elem_def, aliases)?;
    }
    Some(found)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    position: [Option<usize>; 3],
    normal: Option<[usize; 3]>,
    uv: Option<[usize; 2]>,
    color: Option<[usize; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceLayout {
    indices: Option<usize>,
    texcoord: Option<usize>,
}

/// Property indices resolved once per element for each attribute role.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementLayout {
    Vertex(VertexLayout),
    Face(FaceLayout),
    Ignored,
}

impl ElementLayout {
    pub fn for_element(elem_def: &ElementDef) -> Self {
        match elem_def.name.as_str() {
            "vertex" => ElementLayout::Vertex(VertexLayout {
                position: [
                    find_attr(elem_def, POS_X),
                    find_attr(elem_def, POS_Y),
                    find_attr(elem_def, POS_Z),
                ],
                normal: find_all(elem_def, [NORMAL_X, NORMAL_Y, NORMAL_Z]),
                uv: find_all(elem_def, [TEX_S, TEX_T]),
                color: find_all(elem_def, [RED, GREEN, BLUE]),
            }),
            "face" => ElementLayout::Face(FaceLayout {
                indices: find_attr(elem_def, FACE_INDICES),
                texcoord: find_attr(elem_def, FACE_TEXCOORD),
            }),
            _ => ElementLayout::Ignored,
        }
    }
}

fn scalar(record: &ElementRecord, index: usize) -> f64 {
    record
        .get(index)
        .and_then(PropertyValue::as_scalar)
        .unwrap_or(0.0)
}

/// Accumulates records into a [`GeometryBuffer`].
pub struct BufferBuilder {
    buffer: GeometryBuffer,
    vertex_limit: usize,
    skipped_faces: usize,
}

impl BufferBuilder {
    /// Prepare a builder for the elements declared in `header`.
    ///
    /// `size_hint` caps how many vertices are reserved up front, since header counts are
    /// untrusted.
    pub fn new(header: &PlyHeader, size_hint: usize) -> Self {
        // Vertex elements without properties are never decoded.
        let vertex_limit = header
            .elements
            .iter()
            .filter(|e| e.name == "vertex" && !e.properties.is_empty())
            .fold(0usize, |total, e| total.saturating_add(e.count));
        let mut buffer = GeometryBuffer::default();
        buffer.vertices.reserve(vertex_limit.min(size_hint).saturating_mul(3));

        Self {
            buffer,
            vertex_limit,
            skipped_faces: 0,
        }
    }

    pub fn push(&mut self, layout: &ElementLayout, record: &ElementRecord) {
        match layout {
            ElementLayout::Vertex(layout) => self.push_vertex(layout, record),
            ElementLayout::Face(layout) => {
                if !self.push_face(layout, record) {
                    self.skipped_faces += 1;
                }
            }
            ElementLayout::Ignored => {}
        }
    }

    fn push_vertex(&mut self, layout: &VertexLayout, record: &ElementRecord) {
        let buffer = &mut self.buffer;

        for index in layout.position {
            let value = index.map_or(0.0, |i| scalar(record, i));
            buffer.vertices.push(value as f32);
        }
        if let Some(normal) = layout.normal {
            buffer
                .normals
                .extend(normal.map(|i| scalar(record, i) as f32));
        }
        if let Some(uv) = layout.uv {
            buffer.uvs.extend(uv.map(|i| scalar(record, i) as f32));
        }
        if let Some(color) = layout.color {
            buffer
                .colors
                .extend(color.map(|i| (scalar(record, i) / 255.0) as f32));
        }
    }

    /// Returns false when the face is skipped.
    fn push_face(&mut self, layout: &FaceLayout, record: &ElementRecord) -> bool {
        let Some(list) = layout
            .indices
            .and_then(|i| record.get(i))
            .and_then(PropertyValue::as_list)
        else {
            trace!("Skipping face without vertex indices");
            return false;
        };

        if list.iter().any(|&v| v < 0.0 || v as usize >= self.vertex_limit) {
            trace!("Skipping face with out of range index: {list:?}");
            return false;
        }
        let idx = |n: usize| list[n] as u32;

        match list.len() {
            3 => {
                self.buffer.indices.extend([idx(0), idx(1), idx(2)]);

                let texcoord = layout
                    .texcoord
                    .and_then(|i| record.get(i))
                    .and_then(PropertyValue::as_list);
                if let Some(uvs) = texcoord.filter(|uvs| uvs.len() == 6) {
                    self.buffer
                        .face_vertex_uvs
                        .extend(uvs.iter().map(|&v| v as f32));
                }
            }
            4 => {
                // Split along the 1-3 diagonal.
                self.buffer
                    .indices
                    .extend([idx(0), idx(1), idx(3), idx(1), idx(2), idx(3)]);
            }
            n => {
                trace!("Skipping face with {n} vertices");
                return false;
            }
        }
        true
    }

    pub fn finish(self) -> GeometryBuffer {
        if self.skipped_faces > 0 {
            warn!("Skipped {} malformed faces", self.skipped_faces);
        }
        debug!(
            vertices = self.buffer.vertex_count(),
            triangles = self.buffer.triangle_count(),
            "Built geometry buffer"
        );
        self.buffer
    }
}
