// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The outermost wire framing: preamble block, IA sub-frame, and optional trailing integrity
//! word (spec §4.D "Wire layout of a frame").

use iab_core::checksum::Crc16Ccitt;
use iab_core::errors::{frame_structure_error, IabError, Result, WarningCounters, WarningKind};
use iab_core::io::{BitReader, BitWriter};

use crate::element;
use crate::frame::Frame;
use crate::tag;

/// Options controlling how strictly [`parse`] enforces version and integrity checks (spec §4.D,
/// §7).
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// If `true` (the default), a frame version outside [`crate::frame::RECOGNISED_VERSIONS`]
    /// is a fatal [`IabError::InvalidVersion`]. If `false`, it is recorded as a warning and
    /// parsing continues with the current layout (spec §4.D "Version handling").
    pub fail_on_version_error: bool,
    /// If `true` (the default), a trailing integrity word that does not match the computed CRC
    /// is a fatal [`IabError::CrcMismatch`]. If `false`, it is recorded as a warning.
    pub strict_crc: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { fail_on_version_error: true, strict_crc: true }
    }
}

/// Options controlling how [`pack`] emits a bitstream (spec §4.D).
#[derive(Debug, Clone, Copy, Default)]
pub struct PackOptions {
    /// Whether to emit the trailing integrity word. Not universally present across profiles
    /// (spec §4.D "Frame CRC / integrity").
    pub emit_crc: bool,
}

/// The top-level wire unit: an opaque preamble payload and the frame it precedes. Profiles that
/// emit a trailing integrity word have it verified (or recomputed on pack) transparently; it is
/// not itself part of this struct since it carries no information beyond the frame bytes it
/// covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitstream {
    pub preamble: Vec<u8>,
    pub frame: Frame,
}

impl Bitstream {
    pub fn new(preamble: Vec<u8>, frame: Frame) -> Self {
        Bitstream { preamble, frame }
    }
}

/// Parses a complete preamble + IA sub-frame wire unit, returning the decoded [`Bitstream`]
/// alongside the non-fatal warnings accumulated while doing so (spec §7).
pub fn parse(bytes: &[u8], options: &ParseOptions) -> Result<(Bitstream, WarningCounters)> {
    let mut warnings = WarningCounters::new();
    let mut reader = BitReader::new(bytes);

    let preamble_header = element::read_element(&mut reader)?;
    if preamble_header.id != tag::PREAMBLE {
        return frame_structure_error("expected a preamble block as the first top-level element");
    }
    let preamble = preamble_header.payload.to_vec();

    let ia_header = element::read_element(&mut reader)?;
    if ia_header.id != tag::IA_FRAME {
        return frame_structure_error("expected an IA sub-frame block after the preamble");
    }

    let mut ia_reader = BitReader::new(ia_header.payload);
    let frame_header = element::read_element(&mut ia_reader)?;
    if frame_header.id != tag::FRAME {
        return frame_structure_error("the IA sub-frame's first element must be the Frame element");
    }
    let frame = element::parse_body(&frame_header, &mut warnings, |inner, w| {
        Frame::read(inner, options.fail_on_version_error, w)
    })?;

    match ia_reader.bits_left() {
        0 => {}
        16 => {
            let declared_crc = ia_reader.read_bits_leq32(16)? as u16;
            let covered = &ia_header.payload[..ia_header.payload.len() - 2];
            let mut crc = Crc16Ccitt::new();
            crc.process_buf_bytes(covered);
            if crc.value() != declared_crc {
                if options.strict_crc {
                    return Err(IabError::CrcMismatch);
                }
                warnings.record(WarningKind::CrcMismatchPermissive);
            }
        }
        _ => {
            // Neither "no trailing word" nor "exactly one CRC word" fits; the declared IA
            // sub-frame size disagreed with what the Frame element actually consumed.
            warnings.record(WarningKind::SizeMismatch);
        }
    }

    Ok((Bitstream::new(preamble, frame), warnings))
}

/// Serialises a [`Bitstream`] back into its wire bytes (spec §4.D "Packing contract").
pub fn pack(bitstream: &Bitstream, options: &PackOptions) -> Vec<u8> {
    let frame_body = element::build_body(|w| bitstream.frame.write(w));

    let mut ia_payload_writer = BitWriter::new();
    element::write_element(&mut ia_payload_writer, tag::FRAME, &frame_body);
    let mut ia_payload = ia_payload_writer.into_inner();

    if options.emit_crc {
        let mut crc = Crc16Ccitt::new();
        crc.process_buf_bytes(&ia_payload);
        ia_payload.extend_from_slice(&crc.value().to_be_bytes());
    }

    let mut writer = BitWriter::new();
    element::write_element(&mut writer, tag::PREAMBLE, &bitstream.preamble);
    element::write_element(&mut writer, tag::IA_FRAME, &ia_payload);
    writer.into_inner()
}
