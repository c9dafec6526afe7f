// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The packing entry point, mirroring the original library's `IABPackerAPI`.

use iab_format::codec::{self, Bitstream, PackOptions};

/// Packs a [`Bitstream`] into its wire bytes. A `Packer` is just its [`PackOptions`] held ready to
/// reuse across many calls to [`Packer::pack`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Packer {
    options: PackOptions,
}

impl Packer {
    /// A packer that does not emit the trailing integrity word.
    pub fn new() -> Self {
        Packer::default()
    }

    /// A packer that appends a trailing CRC-16 integrity word after every IA sub-frame (spec
    /// §4.D "Frame CRC / integrity").
    pub fn with_crc() -> Self {
        Packer { options: PackOptions { emit_crc: true } }
    }

    /// A packer built from explicit options.
    pub fn with_options(options: PackOptions) -> Self {
        Packer { options }
    }

    /// Packs `bitstream` into its wire bytes.
    pub fn pack(&self, bitstream: &Bitstream) -> Vec<u8> {
        codec::pack(bitstream, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use iab_core::units::{FrameRate, SampleRate};
    use iab_format::frame::Frame;

    use super::*;
    use crate::Parser;

    #[test]
    fn verify_crc_packer_round_trips_through_default_parser() {
        let frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let bitstream = Bitstream::new(b"preamble".to_vec(), frame);

        let bytes = Packer::with_crc().pack(&bitstream);
        let (decoded, warnings) = Parser::new().parse(&bytes).unwrap();
        assert_eq!(decoded, bitstream);
        assert_eq!(warnings.total(), 0);
    }
}
