// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Object Definition and Object Sub-Block (spec §3).

use iab_core::errors::Result;
use iab_core::io::{BitReader, BitWriter};

use crate::gain::{Gain, ZoneGain9};
use crate::pan::{Position, Snap, Spread};
use crate::plex;

/// The pan state an Object Sub-Block either carries directly or inherits from its predecessor
/// (spec §3: "If `pan_info_exists = 0`, the sub-block inherits the previous sub-block's pan
/// state").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanState {
    pub gain: Gain,
    pub position: Position,
    pub snap: Snap,
    pub zone_gain_9: Option<ZoneGain9>,
    pub spread: Spread,
    pub decor_coeff: Option<(u8, u8)>,
}

impl PanState {
    pub const DEFAULT: PanState = PanState {
        gain: Gain::UNITY,
        position: Position::CENTER,
        snap: Snap::NONE,
        zone_gain_9: None,
        spread: Spread::NONE,
        decor_coeff: None,
    };
}

impl Default for PanState {
    fn default() -> Self {
        PanState::DEFAULT
    }
}

/// One sub-block of an Object Definition's per-temporal-partition pan metadata (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSubBlock {
    pub pan_info_exists: bool,
    /// Resolved pan state: either this sub-block's own fields, or a copy of the predecessor's
    /// state when `pan_info_exists` is false. Always populated so renderer code (spec §4.H) never
    /// needs to chase an inheritance chain itself.
    pub pan: PanState,
}

impl ObjectSubBlock {
    pub fn read(reader: &mut BitReader<'_>, previous: PanState) -> Result<Self> {
        let pan_info_exists = reader.read_bit()?;
        if !pan_info_exists {
            return Ok(ObjectSubBlock { pan_info_exists, pan: previous });
        }

        let gain = Gain::read(reader)?;
        let position = Position::read(reader)?;
        let snap = Snap::read(reader)?;

        let zone_gain_control = reader.read_bit()?;
        let zone_gain_9 = if zone_gain_control { Some(ZoneGain9::read(reader)?) } else { None };

        let spread = Spread::read(reader)?;

        let decor_exists = reader.read_bit()?;
        let decor_coeff = if decor_exists {
            Some((reader.read_bits_leq32(8)? as u8, reader.read_bits_leq32(8)? as u8))
        }
        else {
            None
        };

        Ok(ObjectSubBlock {
            pan_info_exists,
            pan: PanState { gain, position, snap, zone_gain_9, spread, decor_coeff },
        })
    }

    pub fn write(&self, writer: &mut BitWriter) {
        writer.write_bit(self.pan_info_exists);
        if !self.pan_info_exists {
            return;
        }
        self.pan.gain.write(writer);
        self.pan.position.write(writer);
        self.pan.snap.write(writer);

        writer.write_bit(self.pan.zone_gain_9.is_some());
        if let Some(zone) = &self.pan.zone_gain_9 {
            zone.write(writer);
        }

        self.pan.spread.write(writer);

        writer.write_bit(self.pan.decor_coeff.is_some());
        if let Some((prefix, value)) = self.pan.decor_coeff {
            writer.write_bits_leq32(u32::from(prefix), 8);
            writer.write_bits_leq32(u32::from(value), 8);
        }
    }
}

/// A positional audio asset with per-sub-block pan metadata (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDefinition {
    pub metadata_id: u32,
    /// `0` designates a silent object with no associated audio asset (spec §3).
    pub audio_data_id: u32,
    pub sub_blocks: Vec<ObjectSubBlock>,
}

impl ObjectDefinition {
    pub fn new(metadata_id: u32, audio_data_id: u32) -> Self {
        ObjectDefinition { metadata_id, audio_data_id, sub_blocks: Vec::new() }
    }

    pub fn is_silent(&self) -> bool {
        self.audio_data_id == 0
    }

    /// Reads `sub_block_count` sub-blocks (fixed by frame rate per spec §3), propagating pan
    /// state inheritance between them.
    pub(crate) fn read(reader: &mut BitReader<'_>, sub_block_count: usize) -> Result<Self> {
        let metadata_id = plex::read_plex8(reader)?;
        let audio_data_id = plex::read_plex8(reader)?;

        let mut sub_blocks = Vec::with_capacity(sub_block_count);
        let mut previous = PanState::DEFAULT;
        for _ in 0..sub_block_count {
            let block = ObjectSubBlock::read(reader, previous)?;
            previous = block.pan;
            sub_blocks.push(block);
        }

        Ok(ObjectDefinition { metadata_id, audio_data_id, sub_blocks })
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        plex::write_plex8(writer, self.metadata_id);
        plex::write_plex8(writer, self.audio_data_id);
        for block in &self.sub_blocks {
            block.write(writer);
        }
    }
}
