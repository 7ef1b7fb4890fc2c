//! PLY body decoding.
//!
//! Both encodings share one record loop, generic over a [`val_reader::ScalarReader`].
//! The ASCII reader signals token exhaustion or an unparseable token, either of which
//! ends decoding early and keeps the records read so far. The binary reader
//! bounds-checks every read, and an overrun is reported as an error.

mod row;

pub mod val_reader;

use byteorder::{BigEndian, LittleEndian};
use tracing::{debug, warn};

pub use row::{ElementRecord, PropertyValue};

use crate::geometry::{BufferBuilder, ElementLayout};
use crate::{PlyError, PlyFormat, PlyHeader};
use row::read_row;
use val_reader::{AsciiValReader, BinValReader, ScalarReader};

/// Decode the body following `header` in `bytes`, feeding each record to `builder`.
pub fn decode_body(
    bytes: &[u8],
    header: &PlyHeader,
    builder: &mut BufferBuilder,
) -> Result<(), PlyError> {
    let body_start = header.header_byte_len.min(bytes.len());

    match header.format {
        Some(PlyFormat::Ascii) => {
            decode_elements(&mut AsciiValReader::new(&bytes[body_start..]), header, builder)
        }
        Some(PlyFormat::BinaryLittleEndian) => decode_elements(
            &mut BinValReader::<LittleEndian>::new(bytes, body_start),
            header,
            builder,
        ),
        Some(PlyFormat::BinaryBigEndian) => decode_elements(
            &mut BinValReader::<BigEndian>::new(bytes, body_start),
            header,
            builder,
        ),
        None => {
            if !header.elements.is_empty() {
                warn!("PLY header has no usable format, skipping body");
            }
            Ok(())
        }
    }
}

fn decode_elements<R: ScalarReader>(
    reader: &mut R,
    header: &PlyHeader,
    builder: &mut BufferBuilder,
) -> Result<(), PlyError> {
    let mut record = ElementRecord::default();

    for elem_def in &header.elements {
        let layout = ElementLayout::for_element(elem_def);
        debug!(
            element = %elem_def.name,
            count = elem_def.count,
            "Decoding element"
        );

        // Records without properties read nothing, so their count is unbounded by the body.
        if elem_def.properties.is_empty() {
            if elem_def.count > 0 {
                warn!(
                    "Skipping {} {} records without properties",
                    elem_def.count, elem_def.name
                );
            }
            continue;
        }

        for row in 0..elem_def.count {
            match read_row(reader, elem_def, &mut record) {
                Ok(()) => builder.push(&layout, &record),
                Err(PlyError::TokensExhausted) => {
                    warn!(
                        "ASCII body ended at {} row {row} of {}, keeping decoded rows",
                        elem_def.name, elem_def.count
                    );
                    return Ok(());
                }
                Err(PlyError::InvalidNumber(token)) => {
                    warn!(
                        "Invalid ASCII token {token:?} at {} row {row}, keeping decoded rows",
                        elem_def.name
                    );
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}
