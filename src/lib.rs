//! Decode PLY (Polygon File Format) captures into flat geometry buffers.
//!
//! The whole input is decoded in one pass: the header is located and parsed, the body is
//! read as ASCII tokens or packed binary according to the declared format, and each
//! `vertex` and `face` record is mapped onto flat arrays of positions, normals, colors,
//! texture coordinates and triangle indices.
//!
//! # Example
//!
//! ```rust
//! let ply_data = b"ply
//! format ascii 1.0
//! element vertex 2
//! property float x
//! property float y
//! property float z
//! property uchar red
//! property uchar green
//! property uchar blue
//! end_header
//! 0 0 0 255 0 0
//! 1 1 1 0 255 0
//! ";
//!
//! let geometry = ply_geometry::decode(ply_data).unwrap();
//! assert_eq!(geometry.vertices, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
//! assert_eq!(geometry.colors, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
//! ```
//!
//! Malformed headers, truncated ASCII bodies and malformed faces shrink the output
//! instead of failing. Only a binary body that ends before its header says it should is
//! reported as an error.

pub mod de;
mod error;
pub mod geometry;
mod header;
pub mod worker;

pub use error::PlyError;
pub use geometry::{BufferBuilder, ElementLayout, GeometryBuffer};
pub use header::{
    extract_header, ElementDef, HeaderText, PlyFormat, PlyHeader, PropertyType, ScalarType,
};
#[cfg(feature = "tokio")]
pub use worker::decode_async;
pub use worker::{spawn_decode, DecodeMessage, DecodeTask};

use tracing::info;

/// Decode a complete PLY file held in memory.
#[tracing::instrument(skip_all, fields(len = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<GeometryBuffer, PlyError> {
    let header = PlyHeader::from_bytes(bytes);
    decode_with_header(bytes, &header)
}

/// Decode the body of `bytes` using an already parsed header.
pub fn decode_with_header(bytes: &[u8], header: &PlyHeader) -> Result<GeometryBuffer, PlyError> {
    let body_len = bytes.len().saturating_sub(header.header_byte_len);
    let mut builder = BufferBuilder::new(header, body_len);
    de::decode_body(bytes, header, &mut builder)?;

    let geometry = builder.finish();
    info!(
        format = ?header.format,
        vertices = geometry.vertex_count(),
        triangles = geometry.triangle_count(),
        "Decoded PLY"
    );
    Ok(geometry)
}
