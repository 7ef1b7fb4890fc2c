//! Header parsing against the body it describes.

use ply_geometry::{extract_header, ElementDef, PlyFormat, PlyHeader, PropertyType, ScalarType};

#[test]
fn test_built_header_round_trip() {
    let mut vertex = ElementDef::new("vertex", 12);
    for name in ["x", "y", "z"] {
        vertex.properties.push(PropertyType::Scalar {
            data_type: ScalarType::F32,
            name: name.to_string(),
        });
    }
    let mut face = ElementDef::new("face", 20);
    face.properties.push(PropertyType::List {
        count_type: ScalarType::U8,
        data_type: ScalarType::U32,
        name: "vertex_indices".to_string(),
    });

    let mut header = PlyHeader {
        format: Some(PlyFormat::BinaryLittleEndian),
        version: "1.0".to_string(),
        comments: vec!["icosahedron".to_string(), "".to_string()],
        obj_info: "generated".to_string(),
        elements: vec![vertex, face],
        header_byte_len: 0,
    };
    let text = header.to_string();
    header.header_byte_len = text.len();

    assert_eq!(PlyHeader::parse_str(&text), header);
}

#[test]
fn test_legacy_and_sized_type_names_agree() {
    let legacy = PlyHeader::parse_str(
        "ply\nformat ascii 1.0\nelement v 0\nproperty char a\nproperty uchar b\nproperty short c\nproperty ushort d\nproperty int e\nproperty uint f\nproperty float g\nproperty double h\nend_header\n",
    );
    let sized = PlyHeader::parse_str(
        "ply\nformat ascii 1.0\nelement v 0\nproperty int8 a\nproperty uint8 b\nproperty int16 c\nproperty uint16 d\nproperty int32 e\nproperty uint32 f\nproperty float32 g\nproperty float64 h\nend_header\n",
    );

    assert_eq!(legacy.elements, sized.elements);
    let widths: Vec<usize> = legacy.elements[0]
        .properties
        .iter()
        .map(|p| match p {
            PropertyType::Scalar { data_type, .. } => data_type.size_bytes(),
            PropertyType::List { .. } => 0,
        })
        .collect();
    assert_eq!(widths, vec![1, 1, 2, 2, 4, 4, 4, 8]);
}

#[test]
fn test_header_len_marks_body_start() {
    let data = b"ply\nformat binary_big_endian 1.0\n\nelement vertex 1\nproperty float x\nend_header\nBODY";
    let header = extract_header(data);
    assert_eq!(&data[header.byte_len..], b"BODY");
    assert!(!header.text.contains("\n\n"));
}

#[test]
fn test_whitespace_is_normalized() {
    let header = PlyHeader::parse_str(
        "ply\n  format   ascii 1.0  \nelement\tvertex  2\nproperty   list uchar   int  vertex_indices\ncomment   spaced    out\nend_header\n",
    );

    assert_eq!(header.format, Some(PlyFormat::Ascii));
    assert_eq!(header.elements[0].count, 2);
    assert_eq!(header.elements[0].properties[0].name(), "vertex_indices");
    assert_eq!(header.comments, vec!["spaced out".to_string()]);
}
