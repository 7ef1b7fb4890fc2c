//! PLY header extraction and parsing.
//!
//! The header is located by scanning raw bytes up to the `end_header` line, which gives
//! the exact offset where a binary body starts. The extracted text is then parsed into a
//! [`PlyHeader`]. Parsing never fails: lines that cannot be understood are logged and
//! skipped, and a header that is cut short describes no elements at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// PLY file format (ascii or binary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl PlyFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ascii" => Some(PlyFormat::Ascii),
            "binary_little_endian" => Some(PlyFormat::BinaryLittleEndian),
            "binary_big_endian" => Some(PlyFormat::BinaryBigEndian),
            _ => None,
        }
    }
}

impl fmt::Display for PlyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlyFormat::Ascii => write!(f, "ascii"),
            PlyFormat::BinaryLittleEndian => write!(f, "binary_little_endian"),
            PlyFormat::BinaryBigEndian => write!(f, "binary_big_endian"),
        }
    }
}

/// PLY scalar data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    /// Parse a type name, accepting both the sized names and the legacy aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "char" | "int8" => Some(ScalarType::I8),
            "uchar" | "uint8" => Some(ScalarType::U8),
            "short" | "int16" => Some(ScalarType::I16),
            "ushort" | "uint16" => Some(ScalarType::U16),
            "int" | "int32" => Some(ScalarType::I32),
            "uint" | "uint32" => Some(ScalarType::U32),
            "float" | "float32" => Some(ScalarType::F32),
            "double" | "float64" => Some(ScalarType::F64),
            _ => None,
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Whether ASCII tokens of this type are read with integer semantics.
    pub fn is_integer(&self) -> bool {
        !matches!(self, ScalarType::F32 | ScalarType::F64)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::I8 => "char",
            ScalarType::U8 => "uchar",
            ScalarType::I16 => "short",
            ScalarType::U16 => "ushort",
            ScalarType::I32 => "int",
            ScalarType::U32 => "uint",
            ScalarType::F32 => "float",
            ScalarType::F64 => "double",
        };
        f.write_str(name)
    }
}

/// PLY property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyType {
    /// A scalar property with a single value
    Scalar { data_type: ScalarType, name: String },
    /// A list property with variable length
    List {
        count_type: ScalarType,
        data_type: ScalarType,
        name: String,
    },
}

impl PropertyType {
    pub fn name(&self) -> &str {
        match self {
            PropertyType::Scalar { name, .. } | PropertyType::List { name, .. } => name,
        }
    }

    /// Parse the tokens following the `property` keyword.
    fn parse(parts: &[&str]) -> Option<Self> {
        match parts {
            ["list", count_type, data_type, name, ..] => Some(PropertyType::List {
                count_type: ScalarType::parse(count_type)?,
                data_type: ScalarType::parse(data_type)?,
                name: name.to_string(),
            }),
            [data_type, name, ..] if *data_type != "list" => Some(PropertyType::Scalar {
                data_type: ScalarType::parse(data_type)?,
                name: name.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Scalar { data_type, name } => write!(f, "property {data_type} {name}"),
            PropertyType::List {
                count_type,
                data_type,
                name,
            } => write!(f, "property list {count_type} {data_type} {name}"),
        }
    }
}

/// PLY element definition (e.g., vertex, face)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDef {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyType>,
}

impl ElementDef {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            properties: Vec::new(),
        }
    }

    /// Index of the first property with the given name.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name() == name)
    }
}

impl fmt::Display for ElementDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "element {} {}", self.name, self.count)?;
        for property in &self.properties {
            writeln!(f, "{property}")?;
        }
        Ok(())
    }
}

/// Raw header text located at the start of a PLY buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderText {
    /// Non-empty header lines before `end_header`, joined with `\n`.
    pub text: String,
    /// Offset of the first body byte.
    pub byte_len: usize,
    /// Whether an `end_header` line was found.
    pub terminated: bool,
}

const END_HEADER: &[u8] = b"end_header";

/// Scan `bytes` for the header block.
///
/// Lines end at either `\n` or `\r`. When the file starts with `ply\r\n`, the `\n` paired
/// with the `\r` that ends `end_header` is skipped as well, so `byte_len` lands exactly on
/// the first body byte.
pub fn extract_header(bytes: &[u8]) -> HeaderText {
    let has_crlf = bytes.starts_with(b"ply\r\n");

    let mut lines: Vec<&[u8]> = Vec::new();
    let mut line_start = 0;
    let mut pos = 0;
    let mut terminated = false;

    while pos < bytes.len() {
        let byte = bytes[pos];
        pos += 1;

        if byte != b'\n' && byte != b'\r' {
            continue;
        }

        let line = &bytes[line_start..pos - 1];
        line_start = pos;
        if line == END_HEADER {
            terminated = true;
            break;
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    // A header that ends right at end-of-input without a terminator still counts.
    if !terminated && &bytes[line_start..] == END_HEADER {
        terminated = true;
        pos = bytes.len();
    } else if !terminated && line_start < bytes.len() {
        lines.push(&bytes[line_start..]);
    }

    if terminated && has_crlf {
        pos = (pos + 1).min(bytes.len());
    }

    let text = lines
        .iter()
        .map(|line| String::from_utf8_lossy(line))
        .collect::<Vec<_>>()
        .join("\n");

    HeaderText {
        text,
        byte_len: pos,
        terminated,
    }
}

/// PLY header containing format information and element definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlyHeader {
    /// `None` when the header has no recognised `format` line.
    pub format: Option<PlyFormat>,
    pub version: String,
    pub comments: Vec<String>,
    pub obj_info: String,
    /// Elements in declaration order, which is also body order.
    pub elements: Vec<ElementDef>,
    /// Offset of the first body byte.
    pub header_byte_len: usize,
}

impl PlyHeader {
    /// Locate and parse the header at the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::parse(&extract_header(bytes))
    }

    /// Parse a header from PLY text, e.g. one produced by this type's `Display`.
    pub fn parse_str(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Parse extracted header text.
    pub fn parse(header: &HeaderText) -> Self {
        let mut result = PlyHeader {
            header_byte_len: header.byte_len,
            ..Default::default()
        };

        if !header.terminated {
            warn!("PLY header has no end_header line, decoding no elements");
            return result;
        }

        let mut lines = header
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());

        if lines.next() != Some("ply") {
            warn!("Missing 'ply' magic line, decoding no elements");
            return result;
        }

        let mut current_element: Option<ElementDef> = None;

        for line in lines {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let rest = parts[1..].join(" ");

            match parts[0] {
                "format" => match parts.get(1).and_then(|f| PlyFormat::parse(f)) {
                    Some(format) => {
                        result.format = Some(format);
                        result.version = parts.get(2).unwrap_or(&"").to_string();
                    }
                    None => warn!("Unsupported PLY format line: {line}"),
                },
                "comment" => result.comments.push(rest),
                "obj_info" => result.obj_info = rest,
                "element" => {
                    if let Some(element) = current_element.take() {
                        result.elements.push(element);
                    }

                    let name = parts.get(1).unwrap_or(&"");
                    let count = match parts.get(2).map(|c| c.parse::<usize>()) {
                        Some(Ok(count)) => count,
                        _ => {
                            warn!("Invalid element count in line: {line}");
                            0
                        }
                    };
                    current_element = Some(ElementDef::new(*name, count));
                }
                "property" => {
                    let Some(element) = current_element.as_mut() else {
                        warn!("Property without element: {line}");
                        continue;
                    };
                    match PropertyType::parse(&parts[1..]) {
                        Some(property) => element.properties.push(property),
                        None => warn!("Invalid property line: {line}"),
                    }
                }
                "end_header" => break,
                other => debug!("Ignoring unhandled header line {other}: {rest}"),
            }
        }

        if let Some(element) = current_element {
            result.elements.push(element);
        }

        result
    }

    pub fn get_element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Total record count over all elements named `name`.
    pub fn count_of(&self, name: &str) -> usize {
        self.elements
            .iter()
            .filter(|e| e.name == name)
            .fold(0, |total, e| total.saturating_add(e.count))
    }
}

impl fmt::Display for PlyHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ply")?;
        if let Some(format) = self.format {
            writeln!(f, "format {format} {}", self.version)?;
        }
        for comment in &self.comments {
            writeln!(f, "comment {comment}")?;
        }
        if !self.obj_info.is_empty() {
            writeln!(f, "obj_info {}", self.obj_info)?;
        }
        for element in &self.elements {
            write!(f, "{element}")?;
        }
        writeln!(f, "end_header")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parsing() {
        let header_text = "ply\nformat ascii 1.0\ncomment test file\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n";

        let header = PlyHeader::parse_str(header_text);

        assert_eq!(header.format, Some(PlyFormat::Ascii));
        assert_eq!(header.version, "1.0");
        assert_eq!(header.elements.len(), 2);
        assert_eq!(header.comments, vec!["test file".to_string()]);
        assert_eq!(header.header_byte_len, header_text.len());

        let vertex_element = header.get_element("vertex").unwrap();
        assert_eq!(vertex_element.count, 3);
        assert_eq!(vertex_element.properties.len(), 3);

        let face_element = header.get_element("face").unwrap();
        assert_eq!(face_element.count, 1);
        assert_eq!(
            face_element.properties[0],
            PropertyType::List {
                count_type: ScalarType::U8,
                data_type: ScalarType::I32,
                name: "vertex_indices".to_string(),
            }
        );
    }

    #[test]
    fn test_scalar_type_parsing() {
        assert_eq!(ScalarType::parse("float"), Some(ScalarType::F32));
        assert_eq!(ScalarType::parse("float32"), Some(ScalarType::F32));
        assert_eq!(ScalarType::parse("double"), Some(ScalarType::F64));
        assert_eq!(ScalarType::parse("int"), Some(ScalarType::I32));
        assert_eq!(ScalarType::parse("uchar"), Some(ScalarType::U8));
        assert_eq!(ScalarType::parse("uint16"), Some(ScalarType::U16));
        assert_eq!(ScalarType::parse("invalid_type"), None);
    }

    #[test]
    fn test_extract_lf() {
        let data = b"ply\nformat binary_little_endian 1.0\nend_header\n\x01\x02";
        let header = extract_header(data);
        assert!(header.terminated);
        assert_eq!(header.byte_len, data.len() - 2);
        assert_eq!(header.text, "ply\nformat binary_little_endian 1.0");
    }

    #[test]
    fn test_extract_crlf() {
        let data = b"ply\r\nformat binary_little_endian 1.0\r\nend_header\r\n\x0a\x02";
        let header = extract_header(data);
        assert!(header.terminated);
        // The body starts with a 0x0a byte which must not be eaten as a line ending.
        assert_eq!(header.byte_len, data.len() - 2);
        assert_eq!(&data[header.byte_len..], b"\x0a\x02");
    }

    #[test]
    fn test_extract_missing_end_header() {
        let data = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\n";
        let header = extract_header(data);
        assert!(!header.terminated);
        assert_eq!(header.byte_len, data.len());

        let parsed = PlyHeader::parse(&header);
        assert!(parsed.elements.is_empty());
    }

    #[test]
    fn test_missing_magic() {
        let header = PlyHeader::parse_str("format ascii 1.0\nelement vertex 1\nend_header\n");
        assert!(header.elements.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let header = PlyHeader::parse_str(
            "ply\nformat ascii 1.0\nproperty float stray\nelement vertex many\nproperty float x\nproperty quux y\nbogus line here\nobj_info scanner 7\nend_header\n",
        );

        assert_eq!(header.elements.len(), 1);
        assert_eq!(header.elements[0].count, 0);
        assert_eq!(header.elements[0].properties.len(), 1);
        assert_eq!(header.obj_info, "scanner 7");
    }

    #[test]
    fn test_unknown_format() {
        let header = PlyHeader::parse_str("ply\nformat binary_middle_endian 1.0\nend_header\n");
        assert_eq!(header.format, None);
        assert_eq!(header.version, "");
    }

    #[test]
    fn test_canonical_round_trip() {
        let text = "ply\nformat binary_big_endian 1.0\ncomment made by hand\ncomment second\nobj_info capture rig 2\nelement vertex 8\nproperty float x\nproperty double y\nproperty uchar red\nelement face 6\nproperty list uchar int vertex_indices\nproperty list uchar float texcoord\nelement edge 0\nend_header\n";

        let header = PlyHeader::parse_str(text);
        assert_eq!(header.to_string(), text);
        assert_eq!(PlyHeader::parse_str(&header.to_string()), header);
    }
}
