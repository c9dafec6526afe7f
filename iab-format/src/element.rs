// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The generic `Plex8(id) · Plex8(length) · payload` element framing shared by every level of
//! the tree: the top-level preamble/IA-sub-frame wrapper, a frame's direct sub-elements, and a
//! bed definition's nested bed remaps / multi-layout bed definitions (spec §4.D).

use iab_core::errors::{IabError, Result, WarningCounters, WarningKind};
use iab_core::io::{BitReader, BitWriter};

use crate::plex;

/// Writes one element: its Plex-8 ID, the Plex-8 byte length of `body`, then `body` itself. The
/// writer must already be byte-aligned, and remains so afterwards (every Plex-8 field is a
/// multiple of 8 bits).
pub fn write_element(writer: &mut BitWriter, id: u32, body: &[u8]) {
    debug_assert!(writer.is_aligned(), "elements are only ever written at a byte boundary");
    plex::write_plex8(writer, id);
    plex::write_plex8(writer, body.len() as u32);
    writer.write_bytes_aligned(body);
}

/// One parsed element header plus its bounded payload slice.
pub struct ElementHeader<'a> {
    pub id: u32,
    pub payload: &'a [u8],
}

/// Reads one element's `id`/`length` header and returns its payload as a borrowed, exactly
/// length-bounded slice. The reader must be byte-aligned and remains so afterwards, positioned
/// just past the payload.
pub fn read_element<'a>(reader: &mut BitReader<'a>) -> Result<ElementHeader<'a>> {
    debug_assert!(reader.is_aligned(), "elements are only ever read at a byte boundary");
    let id = plex::read_plex8(reader)?;
    let len = plex::read_plex8(reader)? as usize;
    let payload = reader.read_slice_aligned(len)?;
    Ok(ElementHeader { id, payload })
}

/// Parses an element's bit-level body with a dedicated [`BitReader`] bounded to exactly its
/// declared length, then checks that the body parser consumed the whole payload. A short parse
/// (the body parser stopped before the declared end, e.g. because a newer bitstream appended
/// trailing fields this implementation does not know about) is recorded as
/// [`WarningKind::SizeMismatch`] rather than treated as fatal, per spec §4.D; an over-read is
/// impossible by construction since the inner reader is bounded to `header.payload`.
pub fn parse_body<T>(
    header: &ElementHeader<'_>,
    warnings: &mut WarningCounters,
    body: impl FnOnce(&mut BitReader<'_>, &mut WarningCounters) -> Result<T>,
) -> Result<T> {
    let mut inner = BitReader::new(header.payload);
    let value = body(&mut inner, warnings)?;
    if inner.bits_left() != 0 {
        warnings.record(WarningKind::SizeMismatch);
    }
    Ok(value)
}

/// Builds one element's byte body from a bit-level writer closure, aligning (byte-padding) the
/// body's end as spec §4.D requires of every bit-level element body.
pub fn build_body(body: impl FnOnce(&mut BitWriter)) -> Vec<u8> {
    let mut writer = BitWriter::new();
    body(&mut writer);
    writer.into_inner()
}

/// Returns an element-size error; used when a sub-element's byte length does not fit the `u32`
/// Plex cap ST 2098-2 imposes.
pub fn size_too_large<T>() -> Result<T> {
    Err(IabError::Internal("element payload exceeds the 32-bit Plex size cap"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_element_roundtrip() {
        let body = build_body(|w| {
            w.write_bits_leq32(0xABCD, 16);
        });
        let mut writer = BitWriter::new();
        write_element(&mut writer, 0x42, &body);
        let bytes = writer.into_inner();

        let mut reader = BitReader::new(&bytes);
        let header = read_element(&mut reader).unwrap();
        assert_eq!(header.id, 0x42);
        assert_eq!(header.payload, body.as_slice());
    }

    #[test]
    fn verify_size_mismatch_is_a_warning_not_fatal() {
        // Declare 4 bytes of payload but only consume 2.
        let mut writer = BitWriter::new();
        write_element(&mut writer, 0x01, &[0xAA, 0xBB, 0xCC, 0xDD]);
        let bytes = writer.into_inner();

        let mut reader = BitReader::new(&bytes);
        let header = read_element(&mut reader).unwrap();
        let mut warnings = WarningCounters::new();
        let value = parse_body(&header, &mut warnings, |inner, _| inner.read_bits_leq32(16)).unwrap();
        assert_eq!(value, 0xAABB);
        assert_eq!(warnings.count(WarningKind::SizeMismatch), 1);
    }
}
