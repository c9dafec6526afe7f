// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 2-bit-prefix gain and zone-gain encoding shared by Bed Channels and Object Sub-Blocks
//! (spec §3 "Gain" / "Zone Gain").

use iab_core::errors::{IabError, Result};
use iab_core::io::{BitReader, BitWriter};

const MANTISSA_BITS: u32 = 10;
const MANTISSA_MAX: u32 = (1 << MANTISSA_BITS) - 1;

/// A single gain value: Unity (1.0), Silence (0.0), or an in-stream 10-bit mantissa scaled to
/// `[0, 1]`. The `Reserved` prefix is a parse error per spec §3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    /// `None` means Unity or Silence; `Some(value)` is the decoded `[0, 1]` value either way, so
    /// callers that only want the numeric gain can use [`Gain::value`] without matching.
    encoded: GainEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GainEncoding {
    Unity,
    Silence,
    InStream(u16),
}

impl Gain {
    pub const UNITY: Gain = Gain { encoded: GainEncoding::Unity };
    pub const SILENCE: Gain = Gain { encoded: GainEncoding::Silence };

    /// Builds an in-stream gain from a `[0, 1]` value, quantising to the nearest representable
    /// 10-bit mantissa. Values at the extremes collapse to [`Gain::UNITY`] / [`Gain::SILENCE`]
    /// only if the caller explicitly constructs those variants; `from_value` always emits an
    /// `InStream` encoding so a round-trip through the typed builder API is stable.
    pub fn from_value(value: f32) -> Self {
        let clamped = value.clamp(0.0, 1.0);
        let mantissa = (clamped * MANTISSA_MAX as f32).round() as u32;
        Gain { encoded: GainEncoding::InStream(mantissa.min(MANTISSA_MAX) as u16) }
    }

    /// The decoded linear gain value in `[0, 1]`.
    pub fn value(self) -> f32 {
        match self.encoded {
            GainEncoding::Unity => 1.0,
            GainEncoding::Silence => 0.0,
            GainEncoding::InStream(m) => m as f32 / MANTISSA_MAX as f32,
        }
    }

    pub fn is_silence(self) -> bool {
        matches!(self.encoded, GainEncoding::Silence)
    }

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let prefix = reader.read_bits_leq32(2)?;
        Ok(match prefix {
            0 => Gain { encoded: GainEncoding::Unity },
            1 => Gain { encoded: GainEncoding::Silence },
            2 => {
                let mantissa = reader.read_bits_leq32(MANTISSA_BITS)?;
                Gain { encoded: GainEncoding::InStream(mantissa as u16) }
            }
            _ => return Err(IabError::ReservedPrefix),
        })
    }

    pub fn write(self, writer: &mut BitWriter) {
        match self.encoded {
            GainEncoding::Unity => writer.write_bits_leq32(0, 2),
            GainEncoding::Silence => writer.write_bits_leq32(1, 2),
            GainEncoding::InStream(m) => {
                writer.write_bits_leq32(2, 2);
                writer.write_bits_leq32(u32::from(m), MANTISSA_BITS);
            }
        }
    }
}

impl Default for Gain {
    fn default() -> Self {
        Gain::UNITY
    }
}

/// The 9-zone gain set an Object Sub-Block may carry (spec §3 "Zone Gain"). Zone order matches
/// the closed ST 2098-2 partition referenced (not reproduced) in spec §9's open question; this
/// implementation follows `iab_render`'s `zone` module for the speaker-to-zone mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneGain9 {
    pub gains: [Gain; 9],
}

impl ZoneGain9 {
    /// All nine zones at unity, the pass-through state spec §4.G calls out explicitly.
    pub const UNITY: ZoneGain9 = ZoneGain9 { gains: [Gain::UNITY; 9] };

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let mut gains = [Gain::UNITY; 9];
        for g in gains.iter_mut() {
            *g = Gain::read(reader)?;
        }
        Ok(ZoneGain9 { gains })
    }

    pub fn write(&self, writer: &mut BitWriter) {
        for g in &self.gains {
            g.write(writer);
        }
    }
}

impl Default for ZoneGain9 {
    fn default() -> Self {
        ZoneGain9::UNITY
    }
}
