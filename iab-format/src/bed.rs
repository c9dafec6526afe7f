// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bed Definition, Bed Channel and Bed Remap (spec §3).

use std::collections::HashSet;

use iab_core::errors::{frame_structure_error, IabError, Result, WarningCounters, WarningKind};
use iab_core::io::{BitReader, BitWriter};

use crate::channel::{ChannelId, UseCase};
use crate::element::{self, ElementHeader};
use crate::gain::Gain;
use crate::plex;
use crate::tag;

/// One channel of a Bed Definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BedChannel {
    pub channel_id: ChannelId,
    pub audio_data_id: u32,
    pub gain: Gain,
    pub decor_coeff: Option<DecorCoeff>,
}

/// A decorrelation coefficient: an 8-bit prefix (selecting a decorrelation filter/profile) and an
/// 8-bit value, present only when a bed channel's `decor_info_exists` flag is set (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorCoeff {
    pub prefix: u8,
    pub value: u8,
}

impl DecorCoeff {
    fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        Ok(DecorCoeff { prefix: reader.read_bits_leq32(8)? as u8, value: reader.read_bits_leq32(8)? as u8 })
    }

    fn write(&self, writer: &mut BitWriter) {
        writer.write_bits_leq32(u32::from(self.prefix), 8);
        writer.write_bits_leq32(u32::from(self.value), 8);
    }
}

impl BedChannel {
    fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let channel_code = reader.read_bits_leq32(8)?;
        let channel_id = ChannelId::from_code(channel_code)
            .ok_or_else(|| IabError::FrameStructure("unrecognised bed channel id"))?;
        let audio_data_id = plex::read_plex8(reader)?;
        let gain = Gain::read(reader)?;
        let decor_info_exists = reader.read_bit()?;
        let decor_coeff = if decor_info_exists { Some(DecorCoeff::read(reader)?) } else { None };
        Ok(BedChannel { channel_id, audio_data_id, gain, decor_coeff })
    }

    fn write(&self, writer: &mut BitWriter) {
        writer.write_bits_leq32(self.channel_id.to_code(), 8);
        plex::write_plex8(writer, self.audio_data_id);
        self.gain.write(writer);
        writer.write_bit(self.decor_coeff.is_some());
        if let Some(decor) = &self.decor_coeff {
            decor.write(writer);
        }
    }
}

/// A Bed Definition: a channel-based audio asset bundle (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct BedDefinition {
    pub metadata_id: u32,
    pub use_case: UseCase,
    pub channels: Vec<BedChannel>,
    /// Nested bed remaps and further, multi-layout bed definitions (spec §3). Unknown nested
    /// sub-elements are counted but dropped, matching top-level frame sub-element handling.
    pub nested: Vec<BedNested>,
    pub unknown_nested_count: u32,
}

/// A child of a [`BedDefinition`]'s own sub-element list.
#[derive(Debug, Clone, PartialEq)]
pub enum BedNested {
    Remap(BedRemap),
    Definition(Box<BedDefinition>),
}

/// A Bed Remap: an alternate channel routing for the same metadata, expressed as one replacement
/// channel list (spec §3 references Bed Remap without a separate field schedule; this models it
/// as carrying its own bed channel list, reusing [`BedChannel`]'s encoding).
#[derive(Debug, Clone, PartialEq)]
pub struct BedRemap {
    pub channels: Vec<BedChannel>,
}

impl BedRemap {
    fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let count = plex::read_plex8(reader)?;
        let mut channels = Vec::with_capacity(count as usize);
        for _ in 0..count {
            channels.push(BedChannel::read(reader)?);
        }
        Ok(BedRemap { channels })
    }

    fn write(&self, writer: &mut BitWriter) {
        plex::write_plex8(writer, self.channels.len() as u32);
        for ch in &self.channels {
            ch.write(writer);
        }
    }
}

impl BedDefinition {
    /// Constructs an empty bed with the given identity; channels are added with
    /// [`BedDefinition::add_channel`], which enforces spec §3's per-bed channel-ID uniqueness.
    pub fn new(metadata_id: u32, use_case: UseCase) -> Self {
        BedDefinition {
            metadata_id,
            use_case,
            channels: Vec::new(),
            nested: Vec::new(),
            unknown_nested_count: 0,
        }
    }

    /// Appends a channel, enforcing that channel IDs are unique within the bed (spec §3
    /// invariant).
    pub fn add_channel(&mut self, channel: BedChannel) -> Result<()> {
        if self.channels.iter().any(|c| c.channel_id == channel.channel_id) {
            return frame_structure_error("duplicate bed channel id within a bed definition");
        }
        self.channels.push(channel);
        Ok(())
    }

    pub(crate) fn read(reader: &mut BitReader<'_>, warnings: &mut WarningCounters) -> Result<Self> {
        let metadata_id = plex::read_plex8(reader)?;
        let use_case = UseCase::from_code(reader.read_bits_leq32(8)?)?;

        let channel_count = plex::read_plex8(reader)?;
        let mut channels = Vec::with_capacity(channel_count as usize);
        let mut seen = HashSet::new();
        for _ in 0..channel_count {
            let channel = BedChannel::read(reader)?;
            if !seen.insert(channel.channel_id) {
                return frame_structure_error("duplicate bed channel id within a bed definition");
            }
            channels.push(channel);
        }

        if let Some(expected) = use_case.expected_channel_count() {
            if expected != channels.len() {
                return frame_structure_error("bed channel count does not match its declared use-case");
            }
        }

        let nested_count = plex::read_plex8(reader)?;
        let mut nested = Vec::new();
        let mut unknown_nested_count = 0;
        for _ in 0..nested_count {
            let header = element::read_element(reader)?;
            if !tag::is_known_bed_sub_element(header.id) {
                unknown_nested_count += 1;
                warnings.record(WarningKind::UnknownElement);
                continue;
            }
            let parsed = Self::parse_nested(&header, warnings)?;
            nested.push(parsed);
        }

        Ok(BedDefinition { metadata_id, use_case, channels, nested, unknown_nested_count })
    }

    fn parse_nested(header: &ElementHeader<'_>, warnings: &mut WarningCounters) -> Result<BedNested> {
        match header.id {
            tag::BED_REMAP => {
                element::parse_body(header, warnings, |inner, _| Ok(BedNested::Remap(BedRemap::read(inner)?)))
            }
            tag::BED_DEFINITION => element::parse_body(header, warnings, |inner, w| {
                Ok(BedNested::Definition(Box::new(BedDefinition::read(inner, w)?)))
            }),
            _ => unreachable!("is_known_bed_sub_element already filtered this"),
        }
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        plex::write_plex8(writer, self.metadata_id);
        writer.write_bits_leq32(self.use_case.to_code(), 8);

        plex::write_plex8(writer, self.channels.len() as u32);
        for channel in &self.channels {
            channel.write(writer);
        }

        plex::write_plex8(writer, self.nested.len() as u32);
        for child in &self.nested {
            let body = element::build_body(|inner| match child {
                BedNested::Remap(remap) => remap.write(inner),
                BedNested::Definition(def) => def.write(inner),
            });
            let id = match child {
                BedNested::Remap(_) => tag::BED_REMAP,
                BedNested::Definition(_) => tag::BED_DEFINITION,
            };
            element::write_element(writer, id, &body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_channel(id: ChannelId, audio_data_id: u32) -> BedChannel {
        BedChannel { channel_id: id, audio_data_id, gain: Gain::UNITY, decor_coeff: None }
    }

    #[test]
    fn verify_bed_channel_roundtrip_with_decor() {
        let channel = BedChannel {
            channel_id: ChannelId::Lfe,
            audio_data_id: 7,
            gain: Gain::from_value(0.5),
            decor_coeff: Some(DecorCoeff { prefix: 3, value: 200 }),
        };
        let mut w = BitWriter::new();
        channel.write(&mut w);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        assert_eq!(BedChannel::read(&mut r).unwrap(), channel);
    }

    #[test]
    fn verify_duplicate_channel_id_rejected_by_builder() {
        let mut bed = BedDefinition::new(1, UseCase::NoUseCase);
        bed.add_channel(sample_channel(ChannelId::Left, 1)).unwrap();
        assert!(bed.add_channel(sample_channel(ChannelId::Left, 2)).is_err());
    }

    #[test]
    fn verify_use_case_channel_count_mismatch_is_fatal() {
        let mut writer = BitWriter::new();
        plex::write_plex8(&mut writer, 1);
        writer.write_bits_leq32(UseCase::Config5_1.to_code(), 8);
        plex::write_plex8(&mut writer, 1); // only 1 channel, 5.1 expects 6
        sample_channel(ChannelId::Left, 1).write(&mut writer);
        plex::write_plex8(&mut writer, 0);
        let bytes = writer.into_inner();
        let mut reader = BitReader::new(&bytes);
        let mut warnings = WarningCounters::new();
        assert!(BedDefinition::read(&mut reader, &mut warnings).is_err());
    }
}
