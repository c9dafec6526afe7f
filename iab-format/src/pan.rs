// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Object pan state: position, snap and spread (spec §3 "Object Sub-Block").

use iab_core::errors::{IabError, Result};
use iab_core::io::{BitReader, BitWriter};

const POSITION_BITS: u32 = 16;
const POSITION_MAX: u32 = (1 << POSITION_BITS) - 1;

/// A unit-cube position, each axis quantised to 16 bits over `[0, 1]` (spec §3 "Object Sub-Block"
/// position field, spec §8 testable property 7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const CENTER: Position = Position { x: 0.5, y: 0.5, z: 0.5 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Position { x: x.clamp(0.0, 1.0), y: y.clamp(0.0, 1.0), z: z.clamp(0.0, 1.0) }
    }

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        Ok(Position {
            x: decode_axis(reader.read_bits_leq32(POSITION_BITS)?),
            y: decode_axis(reader.read_bits_leq32(POSITION_BITS)?),
            z: decode_axis(reader.read_bits_leq32(POSITION_BITS)?),
        })
    }

    pub fn write(&self, writer: &mut BitWriter) {
        writer.write_bits_leq32(encode_axis(self.x), POSITION_BITS);
        writer.write_bits_leq32(encode_axis(self.y), POSITION_BITS);
        writer.write_bits_leq32(encode_axis(self.z), POSITION_BITS);
    }

    /// Remaps the unit-cube position to a direction on the unit sphere, centred at (0.5, 0.5,
    /// 0.5), the convention the renderer's VBAP stage (§4.G) consumes.
    pub fn to_unit_direction(self) -> (f32, f32, f32) {
        let dx = self.x * 2.0 - 1.0;
        let dy = self.y * 2.0 - 1.0;
        let dz = self.z * 2.0 - 1.0;
        let len = (dx * dx + dy * dy + dz * dz).sqrt();
        if len < 1e-9 {
            (0.0, 1.0, 0.0)
        }
        else {
            (dx / len, dy / len, dz / len)
        }
    }
}

fn encode_axis(v: f32) -> u32 {
    (v.clamp(0.0, 1.0) * POSITION_MAX as f32).round() as u32
}

fn decode_axis(code: u32) -> f32 {
    code as f32 / POSITION_MAX as f32
}

/// Snap-to-speaker state: a present flag, an optional explicit tolerance, and the tolerance
/// value itself as a 12-bit code (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub present: bool,
    pub tolerance_code: Option<u16>,
}

const SNAP_TOLERANCE_BITS: u32 = 12;

impl Snap {
    pub const NONE: Snap = Snap { present: false, tolerance_code: None };

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let present = reader.read_bit()?;
        if !present {
            return Ok(Snap::NONE);
        }
        let tolerance_exists = reader.read_bit()?;
        let tolerance_code = if tolerance_exists {
            Some(reader.read_bits_leq32(SNAP_TOLERANCE_BITS)? as u16)
        }
        else {
            None
        };
        Ok(Snap { present, tolerance_code })
    }

    pub fn write(&self, writer: &mut BitWriter) {
        writer.write_bit(self.present);
        if !self.present {
            return;
        }
        writer.write_bit(self.tolerance_code.is_some());
        if let Some(code) = self.tolerance_code {
            writer.write_bits_leq32(u32::from(code), SNAP_TOLERANCE_BITS);
        }
    }

    /// Maps the 12-bit tolerance code to a spherical arc-length tolerance, in radians. The
    /// source treats the tolerance field as a linear fraction of a half-turn; this is the only
    /// interpretation spec §4.G "Snap" requires (a monotone mapping from code to arc length).
    pub fn tolerance_radians(self) -> f32 {
        match self.tolerance_code {
            Some(code) => (code as f32 / ((1 << SNAP_TOLERANCE_BITS) - 1) as f32) * std::f32::consts::PI,
            None => 0.0,
        }
    }
}

impl Default for Snap {
    fn default() -> Self {
        Snap::NONE
    }
}

/// Spread mode and its one (1-D) or three (3-D) `[0, 1]` softening values (spec §3, §4.G).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spread {
    LowRes1D(f32),
    HiRes1D(f32),
    HiRes3D { x: f32, y: f32, z: f32 },
}

const SPREAD_VALUE_BITS: u32 = 8;

impl Spread {
    pub const NONE: Spread = Spread::LowRes1D(0.0);

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let mode = reader.read_bits_leq32(2)?;
        Ok(match mode {
            0 => Spread::LowRes1D(decode_spread_value(reader.read_bits_leq32(3)?, 3)),
            1 => Spread::HiRes1D(decode_spread_value(reader.read_bits_leq32(SPREAD_VALUE_BITS)?, SPREAD_VALUE_BITS)),
            2 => Spread::HiRes3D {
                x: decode_spread_value(reader.read_bits_leq32(SPREAD_VALUE_BITS)?, SPREAD_VALUE_BITS),
                y: decode_spread_value(reader.read_bits_leq32(SPREAD_VALUE_BITS)?, SPREAD_VALUE_BITS),
                z: decode_spread_value(reader.read_bits_leq32(SPREAD_VALUE_BITS)?, SPREAD_VALUE_BITS),
            },
            _ => return Err(IabError::FrameStructure("unrecognised spread mode code")),
        })
    }

    pub fn write(&self, writer: &mut BitWriter) {
        match *self {
            Spread::LowRes1D(v) => {
                writer.write_bits_leq32(0, 2);
                writer.write_bits_leq32(encode_spread_value(v, 3), 3);
            }
            Spread::HiRes1D(v) => {
                writer.write_bits_leq32(1, 2);
                writer.write_bits_leq32(encode_spread_value(v, SPREAD_VALUE_BITS), SPREAD_VALUE_BITS);
            }
            Spread::HiRes3D { x, y, z } => {
                writer.write_bits_leq32(2, 2);
                writer.write_bits_leq32(encode_spread_value(x, SPREAD_VALUE_BITS), SPREAD_VALUE_BITS);
                writer.write_bits_leq32(encode_spread_value(y, SPREAD_VALUE_BITS), SPREAD_VALUE_BITS);
                writer.write_bits_leq32(encode_spread_value(z, SPREAD_VALUE_BITS), SPREAD_VALUE_BITS);
            }
        }
    }

    /// A single scalar mix ratio in `[0, 1]` (0 = pure VBAP point source, 1 = isotropic),
    /// combining the per-axis values for the 3-D case. Any monotone combination satisfies spec
    /// §4.G's endpoint conditions; this implementation uses the mean of the available axes.
    pub fn mix_ratio(self) -> f32 {
        match self {
            Spread::LowRes1D(v) | Spread::HiRes1D(v) => v,
            Spread::HiRes3D { x, y, z } => (x + y + z) / 3.0,
        }
    }
}

fn decode_spread_value(code: u32, width: u32) -> f32 {
    let max = (1u32 << width) - 1;
    code as f32 / max as f32
}

fn encode_spread_value(v: f32, width: u32) -> u32 {
    let max = (1u32 << width) - 1;
    (v.clamp(0.0, 1.0) * max as f32).round() as u32
}
