// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The "Plex" variable-length unsigned integer coding ST 2098-2 uses for element IDs and element
//! sizes (spec §4.B). An 8-bit base value escapes to 16 bits with `0xFF`, and a 16-bit escaped
//! value escapes further to 32 bits with `0xFFFF`; 32 bits is the hard cap, matching the source
//! library which never escapes past a `uint32_t`.

use iab_core::errors::{IabError, Result};
use iab_core::io::{BitReader, BitWriter};

/// Reads a Plex-8 coded value: an 8-bit value `v`; if `v < 0xFF` that is the result, else a
/// 16-bit value `w` follows; if `w < 0xFFFF` that is the result, else a terminal 32-bit value.
pub fn read_plex8(reader: &mut BitReader<'_>) -> Result<u32> {
    let byte = reader.read_bits_leq32(8)?;
    if byte < 0xFF {
        return Ok(byte);
    }
    let word = reader.read_bits_leq32(16)?;
    if word < 0xFFFF {
        return Ok(word);
    }
    reader.read_bits_leq32(32)
}

/// Writes `value` using the shortest Plex-8 form that represents it exactly.
pub fn write_plex8(writer: &mut BitWriter, value: u32) {
    if value < 0xFF {
        writer.write_bits_leq32(value, 8);
    }
    else if value < 0xFFFF {
        writer.write_bits_leq32(0xFF, 8);
        writer.write_bits_leq32(value, 16);
    }
    else {
        writer.write_bits_leq32(0xFF, 8);
        writer.write_bits_leq32(0xFFFF, 16);
        writer.write_bits_leq32(value, 32);
    }
}

/// Reads a Plex-4 coded value: a 4-bit value; escapes to 16 bits via `0xF`, then to 32 bits via
/// `0xFFFF`. Used by sub-codec fields that the source packs more tightly than element framing.
pub fn read_plex4(reader: &mut BitReader<'_>) -> Result<u32> {
    let nibble = reader.read_bits_leq32(4)?;
    if nibble < 0xF {
        return Ok(nibble);
    }
    let word = reader.read_bits_leq32(16)?;
    if word < 0xFFFF {
        return Ok(word);
    }
    reader.read_bits_leq32(32)
}

/// Writes `value` using the shortest Plex-4 form that represents it exactly.
pub fn write_plex4(writer: &mut BitWriter, value: u32) {
    if value < 0xF {
        writer.write_bits_leq32(value, 4);
    }
    else if value < 0xFFFF {
        writer.write_bits_leq32(0xF, 4);
        writer.write_bits_leq32(value, 16);
    }
    else {
        writer.write_bits_leq32(0xF, 4);
        writer.write_bits_leq32(0xFFFF, 16);
        writer.write_bits_leq32(value, 32);
    }
}

/// Confirms a terminal 32-bit escape was itself well-formed; the 32-bit cap never escapes
/// further, so the only failure mode is running out of bits, which `BitReader` already reports
/// as [`IabError::IoShort`]. Kept as a named predicate for callers that want to distinguish an
/// unterminated escape from a short read at a higher level.
pub fn is_unterminated(err: &IabError) -> bool {
    matches!(err, IabError::IoShort)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip8(value: u32) {
        let mut w = BitWriter::new();
        write_plex8(&mut w, value);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_plex8(&mut r).unwrap(), value);
    }

    #[test]
    fn verify_plex8_roundtrip_all_widths() {
        roundtrip8(0);
        roundtrip8(254);
        roundtrip8(255);
        roundtrip8(65_534);
        roundtrip8(65_535);
        roundtrip8(1_000_000);
    }

    #[test]
    fn verify_plex8_shortest_form() {
        let mut w = BitWriter::new();
        write_plex8(&mut w, 42);
        assert_eq!(w.into_inner(), vec![42]);

        let mut w = BitWriter::new();
        write_plex8(&mut w, 300);
        assert_eq!(w.into_inner(), vec![0xFF, 0x01, 0x2C]);
    }

    #[test]
    fn verify_plex4_roundtrip() {
        let mut w = BitWriter::new();
        write_plex4(&mut w, 0);
        write_plex4(&mut w, 14);
        write_plex4(&mut w, 20_000);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read_plex4(&mut r).unwrap(), 0);
        assert_eq!(read_plex4(&mut r).unwrap(), 14);
        assert_eq!(read_plex4(&mut r).unwrap(), 20_000);
    }
}
