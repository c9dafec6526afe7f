// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The parsing entry point, mirroring the original library's `IABParserAPI`.

use iab_core::errors::{Result, WarningCounters};
use iab_format::codec::{self, Bitstream, ParseOptions};

/// Parses preamble + IA sub-frame wire units. A `Parser` is just its [`ParseOptions`] held ready
/// to reuse across many calls to [`Parser::parse`]; it carries no other state, since parsing one
/// frame never depends on any other (spec §5 "single-threaded parser... no internal concurrency").
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    /// A parser with the default, strict options: an unrecognised version or a mismatched
    /// integrity word is a fatal error (spec §4.D, §7).
    pub fn new() -> Self {
        Parser::default()
    }

    /// A parser in permissive mode: version and integrity-word mismatches are recorded as
    /// warnings instead of aborting the parse (spec §7 "warn and continue").
    pub fn permissive() -> Self {
        Parser { options: ParseOptions { fail_on_version_error: false, strict_crc: false } }
    }

    /// A parser built from explicit options.
    pub fn with_options(options: ParseOptions) -> Self {
        Parser { options }
    }

    /// Parses one preamble + IA sub-frame wire unit, returning the decoded [`Bitstream`]
    /// alongside the non-fatal conditions accumulated while doing so (spec §7).
    pub fn parse(&self, bytes: &[u8]) -> Result<(Bitstream, WarningCounters)> {
        codec::parse(bytes, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use iab_core::units::{FrameRate, SampleRate};
    use iab_format::frame::Frame;

    use super::*;
    use crate::Packer;

    #[test]
    fn verify_default_parser_round_trips_a_packed_frame() {
        let frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let bitstream = Bitstream::new(b"pre".to_vec(), frame);
        let bytes = Packer::new().pack(&bitstream);

        let (decoded, warnings) = Parser::new().parse(&bytes).unwrap();
        assert_eq!(decoded, bitstream);
        assert_eq!(warnings.total(), 0);
    }

    #[test]
    fn verify_permissive_parser_warns_instead_of_failing_on_unrecognised_version() {
        let frame = Frame::new(7, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let bitstream = Bitstream::new(b"pre".to_vec(), frame);
        let bytes = Packer::new().pack(&bitstream);

        assert!(Parser::new().parse(&bytes).is_err());

        let (_, warnings) = Parser::permissive().parse(&bytes).unwrap();
        assert_eq!(warnings.count(iab_core::errors::WarningKind::InvalidVersionPermissive), 1);
    }
}
