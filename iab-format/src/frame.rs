// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Frame element: the root of every IA sub-frame's element tree (spec §3, §4.D).

use std::collections::HashMap;

use iab_core::errors::{frame_structure_error, IabError, Result, WarningCounters, WarningKind};
use iab_core::io::{BitReader, BitWriter};
use iab_core::units::{FrameRate, SampleRate};

use crate::audio_data::{AudioDataDlc, AudioDataPcm};
use crate::authoring_tool::AuthoringToolInfo;
use crate::bed::BedDefinition;
use crate::element::{self, ElementHeader};
use crate::object::ObjectDefinition;
use crate::plex;
use crate::tag;
use crate::user_data::UserData;

/// The closed set of IAB versions this implementation recognises. ST 2098-2 has shipped only
/// version 0 to date; any other value is handled per the parser's `fail_on_version_error` policy
/// (spec §4.D).
pub const RECOGNISED_VERSIONS: &[u8] = &[0];

/// One child of a [`Frame`]'s sub-element list: every recognised variant in spec §3's data model
/// plus [`FrameSubElement::Unknown`] for anything this implementation does not recognise. An
/// `Unknown` entry that originated from parsing is kept so re-serialisation reproduces it
/// byte-for-byte (spec §4.D packing contract); one constructed through the typed API is never
/// written back since nothing built it from a real wire element.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameSubElement {
    Bed(BedDefinition),
    Object(ObjectDefinition),
    AudioDataDlc(AudioDataDlc),
    AudioDataPcm(AudioDataPcm),
    AuthoringToolInfo(AuthoringToolInfo),
    UserData(UserData),
    Unknown { id: u32, payload: Vec<u8> },
}

/// A resolved audio reference: either a DLC or PCM audio data element, borrowed from the frame
/// that owns it. Built by [`Frame::audio_lookup`] for the renderer (spec §3 "Ownership").
#[derive(Debug, Clone, Copy)]
pub enum AudioDataRef<'a> {
    Dlc(&'a AudioDataDlc),
    Pcm(&'a AudioDataPcm),
}

/// The Frame element (spec §3 "Frame").
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub version: u8,
    pub sample_rate: SampleRate,
    pub frame_rate: FrameRate,
    pub max_rendered_assets: u32,
    pub sub_elements: Vec<FrameSubElement>,
    /// Count of sub-elements whose ID was not recognised (spec §4.D, testable property 4).
    pub unknown_sub_element_count: u32,
}

impl Frame {
    pub fn new(version: u8, sample_rate: SampleRate, frame_rate: FrameRate, max_rendered_assets: u32) -> Self {
        Frame {
            version,
            sample_rate,
            frame_rate,
            max_rendered_assets,
            sub_elements: Vec::new(),
            unknown_sub_element_count: 0,
        }
    }

    /// Number of samples per channel every audio sub-element in this frame must carry (spec §3
    /// invariant `sample_count_per_channel = round(sample_rate / frame_rate)`).
    pub fn sample_count(&self) -> u32 {
        self.frame_rate.sample_count(self.sample_rate)
    }

    /// Number of object sub-blocks every Object Definition in this frame must carry (spec §3).
    pub fn object_sub_block_count(&self) -> usize {
        self.frame_rate.object_sub_block_count()
    }

    pub fn add_sub_element(&mut self, element: FrameSubElement) {
        self.sub_elements.push(element);
    }

    /// Builds the per-frame `audio_data_id -> audio element` lookup that bed channels and object
    /// definitions resolve their references against (spec §3 "Ownership").
    pub fn audio_lookup(&self) -> HashMap<u32, AudioDataRef<'_>> {
        let mut map = HashMap::new();
        for element in &self.sub_elements {
            match element {
                FrameSubElement::AudioDataDlc(dlc) => {
                    map.insert(dlc.audio_data_id, AudioDataRef::Dlc(dlc));
                }
                FrameSubElement::AudioDataPcm(pcm) => {
                    map.insert(pcm.audio_data_id, AudioDataRef::Pcm(pcm));
                }
                _ => {}
            }
        }
        map
    }

    pub fn beds(&self) -> impl Iterator<Item = &BedDefinition> {
        self.sub_elements.iter().filter_map(|e| match e {
            FrameSubElement::Bed(bed) => Some(bed),
            _ => None,
        })
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.sub_elements.iter().filter_map(|e| match e {
            FrameSubElement::Object(obj) => Some(obj),
            _ => None,
        })
    }

    pub(crate) fn read(reader: &mut BitReader<'_>, fail_on_version_error: bool, warnings: &mut WarningCounters) -> Result<Self> {
        let version = reader.read_bits_leq32(8)? as u8;
        if !RECOGNISED_VERSIONS.contains(&version) {
            if fail_on_version_error {
                return Err(IabError::InvalidVersion(version));
            }
            warnings.record(WarningKind::InvalidVersionPermissive);
        }

        let sample_rate = SampleRate::from_code(reader.read_bits_leq32(2)?)?;
        let frame_rate = FrameRate::from_code(reader.read_bits_leq32(4)?)?;
        let max_rendered_assets = plex::read_plex8(reader)?;

        let sample_count = frame_rate.sample_count(sample_rate);
        let sub_block_count = frame_rate.object_sub_block_count();

        let declared_count = plex::read_plex8(reader)?;
        let mut sub_elements = Vec::with_capacity(declared_count as usize);
        let mut unknown_sub_element_count = 0u32;
        let mut recognised_count = 0u32;

        for _ in 0..declared_count {
            let header = element::read_element(reader)?;
            match Self::parse_sub_element(&header, sample_count, sub_block_count, warnings)? {
                Some(parsed) => {
                    recognised_count += 1;
                    sub_elements.push(parsed);
                }
                None => {
                    unknown_sub_element_count += 1;
                    warnings.record(WarningKind::UnknownElement);
                    sub_elements.push(FrameSubElement::Unknown { id: header.id, payload: header.payload.to_vec() });
                }
            }
        }

        if recognised_count > declared_count {
            return frame_structure_error("parsed more recognised sub-elements than declared");
        }

        Ok(Frame {
            version,
            sample_rate,
            frame_rate,
            max_rendered_assets,
            sub_elements,
            unknown_sub_element_count,
        })
    }

    fn parse_sub_element(
        header: &ElementHeader<'_>,
        sample_count: u32,
        sub_block_count: usize,
        warnings: &mut WarningCounters,
    ) -> Result<Option<FrameSubElement>> {
        if !tag::is_known_frame_sub_element(header.id) {
            return Ok(None);
        }
        let parsed = match header.id {
            tag::BED_DEFINITION => {
                element::parse_body(header, warnings, |inner, w| Ok(FrameSubElement::Bed(BedDefinition::read(inner, w)?)))?
            }
            tag::OBJECT_DEFINITION => element::parse_body(header, warnings, |inner, _| {
                Ok(FrameSubElement::Object(ObjectDefinition::read(inner, sub_block_count)?))
            })?,
            tag::AUDIO_DATA_DLC => {
                element::parse_body(header, warnings, |inner, _| Ok(FrameSubElement::AudioDataDlc(AudioDataDlc::read(inner)?)))?
            }
            tag::AUDIO_DATA_PCM => element::parse_body(header, warnings, |inner, _| {
                Ok(FrameSubElement::AudioDataPcm(AudioDataPcm::read(inner, sample_count)?))
            })?,
            tag::AUTHORING_TOOL_INFO => element::parse_body(header, warnings, |inner, _| {
                Ok(FrameSubElement::AuthoringToolInfo(AuthoringToolInfo::read(inner)?))
            })?,
            tag::USER_DATA => {
                element::parse_body(header, warnings, |inner, _| Ok(FrameSubElement::UserData(UserData::read(inner)?)))?
            }
            _ => unreachable!("is_known_frame_sub_element already filtered this"),
        };
        Ok(Some(parsed))
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        writer.write_bits_leq32(u32::from(self.version), 8);
        writer.write_bits_leq32(self.sample_rate.to_code(), 2);
        writer.write_bits_leq32(self.frame_rate.to_code(), 4);
        plex::write_plex8(writer, self.max_rendered_assets);

        plex::write_plex8(writer, self.sub_elements.len() as u32);
        for element in &self.sub_elements {
            let (id, body) = match element {
                FrameSubElement::Bed(bed) => (tag::BED_DEFINITION, element::build_body(|w| bed.write(w))),
                FrameSubElement::Object(obj) => (tag::OBJECT_DEFINITION, element::build_body(|w| obj.write(w))),
                FrameSubElement::AudioDataDlc(dlc) => (tag::AUDIO_DATA_DLC, element::build_body(|w| dlc.write(w))),
                FrameSubElement::AudioDataPcm(pcm) => (tag::AUDIO_DATA_PCM, element::build_body(|w| pcm.write(w))),
                FrameSubElement::AuthoringToolInfo(info) => {
                    (tag::AUTHORING_TOOL_INFO, element::build_body(|w| info.write(w)))
                }
                FrameSubElement::UserData(data) => (tag::USER_DATA, element::build_body(|w| data.write(w))),
                FrameSubElement::Unknown { id, payload } => (*id, payload.clone()),
            };
            element::write_element(writer, id, &body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelId, UseCase};
    use crate::gain::Gain;

    fn roundtrip(frame: &Frame) -> (Frame, WarningCounters) {
        let mut w = BitWriter::new();
        frame.write(&mut w);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        let mut warnings = WarningCounters::new();
        let decoded = Frame::read(&mut r, true, &mut warnings).unwrap();
        (decoded, warnings)
    }

    #[test]
    fn verify_empty_frame_roundtrip() {
        let frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let (decoded, warnings) = roundtrip(&frame);
        assert_eq!(decoded, frame);
        assert_eq!(warnings.total(), 0);
        assert_eq!(decoded.sample_count(), 2000);
        assert_eq!(decoded.object_sub_block_count(), 8);
    }

    #[test]
    fn verify_frame_with_bed_and_object_roundtrip() {
        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);

        let mut bed = BedDefinition::new(1, UseCase::NoUseCase);
        bed.add_channel(crate::bed::BedChannel {
            channel_id: ChannelId::Left,
            audio_data_id: 1,
            gain: Gain::UNITY,
            decor_coeff: None,
        })
        .unwrap();
        frame.add_sub_element(FrameSubElement::Bed(bed));

        let mut object = ObjectDefinition::new(2, 0);
        for _ in 0..frame.object_sub_block_count() {
            object.sub_blocks.push(crate::object::ObjectSubBlock {
                pan_info_exists: true,
                pan: crate::object::PanState::DEFAULT,
            });
        }
        frame.add_sub_element(FrameSubElement::Object(object));

        let (decoded, warnings) = roundtrip(&frame);
        assert_eq!(decoded, frame);
        assert_eq!(warnings.total(), 0);
        assert_eq!(decoded.beds().count(), 1);
        assert_eq!(decoded.objects().count(), 1);
    }

    #[test]
    fn verify_unknown_sub_element_is_counted_and_preserved() {
        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        frame.add_sub_element(FrameSubElement::Unknown { id: 0xFE, payload: vec![0u8; 17] });

        let (decoded, warnings) = roundtrip(&frame);
        assert_eq!(decoded.unknown_sub_element_count, 1);
        assert_eq!(warnings.count(WarningKind::UnknownElement), 1);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn verify_strict_version_error() {
        let mut w = BitWriter::new();
        w.write_bits_leq32(99, 8);
        w.write_bits_leq32(SampleRate::Hz48000.to_code(), 2);
        w.write_bits_leq32(FrameRate::Fps24.to_code(), 4);
        plex::write_plex8(&mut w, 10);
        plex::write_plex8(&mut w, 0);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        let mut warnings = WarningCounters::new();
        assert!(matches!(Frame::read(&mut r, true, &mut warnings), Err(IabError::InvalidVersion(99))));
    }

    #[test]
    fn verify_permissive_version_is_a_warning() {
        let mut w = BitWriter::new();
        w.write_bits_leq32(99, 8);
        w.write_bits_leq32(SampleRate::Hz48000.to_code(), 2);
        w.write_bits_leq32(FrameRate::Fps24.to_code(), 4);
        plex::write_plex8(&mut w, 10);
        plex::write_plex8(&mut w, 0);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        let mut warnings = WarningCounters::new();
        let frame = Frame::read(&mut r, false, &mut warnings).unwrap();
        assert_eq!(frame.version, 99);
        assert_eq!(warnings.count(WarningKind::InvalidVersionPermissive), 1);
    }
}
