// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The single-threaded render pipeline (spec §4.H): decode every audio element once, then render
//! beds and objects into a fixed-size output buffer. `crate::mt` re-uses the per-item render step
//! this module exposes, fanned out across a thread pool, so the two stay behaviourally identical.

use std::collections::HashMap;

use iab_core::errors::{Result, WarningCounters, WarningKind};
use iab_core::units::SampleRate;
use iab_format::bed::{BedChannel, BedDefinition};
use iab_format::frame::{Frame, FrameSubElement};
use iab_format::object::ObjectDefinition;

use crate::config::RendererConfig;
use crate::vbap;
use crate::vector::{ScalarVectorOps, VectorOps};

/// The renderer's fixed output sample rate. A 96 kHz asset is downsampled onto it using only its
/// embedded 48 kHz DLC layer (spec §4.H "96 kHz sample-rate case").
pub const OUTPUT_SAMPLE_RATE: SampleRate = SampleRate::Hz48000;

/// One rendered frame: one float buffer per configured speaker (virtual speakers included, so
/// trailing downmixes have somewhere to read from), each `sample_count` samples long.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub sample_count: usize,
    /// Indexed by `RendererConfig::speakers` position. Callers that only want physical output
    /// should use [`RenderedFrame::physical_channels`].
    pub channels: Vec<Vec<f32>>,
}

impl RenderedFrame {
    /// Physical (non-virtual) speaker buffers, in `config.speakers` order.
    pub fn physical_channels<'a>(&'a self, config: &'a RendererConfig) -> impl Iterator<Item = &'a [f32]> {
        config
            .speakers
            .iter()
            .zip(self.channels.iter())
            .filter(|(s, _)| s.output_index.is_some())
            .map(|(_, buf)| buf.as_slice())
    }
}

/// Carries each object's last-rendered speaker gains from one frame to the next, so the first
/// sub-block of a frame ramps from a known state rather than starting cold (spec §4.H step 4 "or
/// within a frame when the previous frame's final state is known"). Keyed by the object's
/// `metadata_id`.
#[derive(Debug, Clone, Default)]
pub struct RendererState {
    last_gains: HashMap<u32, HashMap<usize, f32>>,
}

impl RendererState {
    pub fn new() -> Self {
        RendererState::default()
    }

    /// A clone of the object's per-speaker gains as of the end of the last frame it was rendered
    /// in, or empty if this is its first appearance. Exposed so [`crate::mt`] can snapshot ramp
    /// continuity up front, before any concurrent render task starts (spec §4.I "workers never
    /// share mutable state across tasks").
    pub(crate) fn gains_for(&self, metadata_id: u32) -> HashMap<usize, f32> {
        self.last_gains.get(&metadata_id).cloned().unwrap_or_default()
    }

    /// Replaces an object's stored gains wholesale, the counterpart to [`RendererState::gains_for`].
    pub(crate) fn set_gains(&mut self, metadata_id: u32, gains: HashMap<usize, f32>) {
        self.last_gains.insert(metadata_id, gains);
    }
}

/// Renders one frame against `config`, accumulating non-fatal conditions into `warnings` and
/// carrying pan-gain continuity in `state`. Decodes every audio element exactly once up front
/// (spec §4.H step 1), matching `original_source/RenderIABToFiles.cpp`'s decode-then-render split.
pub fn render_frame(frame: &Frame, config: &RendererConfig, state: &mut RendererState, warnings: &mut WarningCounters) -> Result<RenderedFrame> {
    let ops = ScalarVectorOps;
    let sample_count = render_sample_count(frame);
    let pcm = decode_all_assets(frame, warnings);

    let mut channels = vec![vec![0.0f32; sample_count]; config.speakers.len()];

    for bed in frame.beds() {
        render_bed(config, bed, &pcm, &mut channels, warnings);
    }

    for object in frame.objects() {
        render_object(config, object, &pcm, sample_count, frame.object_sub_block_count(), state, &mut channels, &ops);
    }

    apply_trailing_downmixes(config, &mut channels);

    Ok(RenderedFrame { sample_count, channels })
}

/// Number of samples per channel the pipeline renders, always expressed at [`OUTPUT_SAMPLE_RATE`]
/// regardless of the frame's own `sample_rate` (spec §4.H "96 kHz sample-rate case").
pub(crate) fn render_sample_count(frame: &Frame) -> usize {
    frame.frame_rate.sample_count(OUTPUT_SAMPLE_RATE) as usize
}

/// Decodes every audio element once, by `audio_data_id` (spec §4.H step 1). A DLC decode failure
/// is non-fatal: the asset is dropped from the map, and every reader of a missing ID treats it as
/// silence (spec §4.H failure semantics "DLC decode error on an asset").
pub(crate) fn decode_all_assets(frame: &Frame, warnings: &mut WarningCounters) -> HashMap<u32, Vec<f32>> {
    let mut pcm = HashMap::new();
    for element in &frame.sub_elements {
        if let Some((id, result)) = decode_asset_element(element) {
            match result {
                Ok(samples) => {
                    pcm.insert(id, samples);
                }
                Err(_) => warnings.record(WarningKind::AssetDlcDecode),
            }
        }
    }
    pcm
}

/// Decodes a single audio sub-element, if `element` is one (spec §4.H step 1's per-element unit
/// of work, reused directly by the decode queue in [`crate::mt`]).
pub(crate) fn decode_asset_element(element: &FrameSubElement) -> Option<(u32, Result<Vec<f32>>)> {
    match element {
        FrameSubElement::AudioDataDlc(dlc) => {
            let decoded = if dlc.sample_rate == SampleRate::Hz96000 {
                iab_dlc::decode_48k_base_layer(&dlc.payload)
            }
            else {
                iab_dlc::decode(&dlc.payload, dlc.sample_rate)
            };
            Some((dlc.audio_data_id, decoded.map(|s| s.into_iter().map(iab_format::audio_data::sample_to_f32).collect())))
        }
        FrameSubElement::AudioDataPcm(asset) => {
            Some((asset.audio_data_id, Ok(asset.samples.iter().map(|&s| iab_format::audio_data::sample_to_f32(s)).collect())))
        }
        _ => None,
    }
}

/// Renders every channel of a single Bed Definition (spec §4.H step 3). Nested bed remaps and
/// further bed definitions are alternate layouts for the same metadata, not additional content, so
/// only the top-level channel list is mixed.
pub(crate) fn render_bed(config: &RendererConfig, bed: &BedDefinition, pcm: &HashMap<u32, Vec<f32>>, channels: &mut [Vec<f32>], warnings: &mut WarningCounters) {
    for channel in &bed.channels {
        render_bed_channel(config, channel, pcm, channels, warnings);
    }
}

fn render_bed_channel(config: &RendererConfig, channel: &BedChannel, pcm: &HashMap<u32, Vec<f32>>, channels: &mut [Vec<f32>], warnings: &mut WarningCounters) {
    let speaker_idx = if channel.channel_id.is_lfe() {
        match config.lfe_speaker {
            Some(idx) => idx,
            None => {
                warnings.record(WarningKind::NoLfeForBedLfe);
                return;
            }
        }
    }
    else {
        match config.speaker_by_name(channel.channel_id.label()) {
            Some(idx) => idx,
            None => {
                warnings.record(WarningKind::UnknownChannelId);
                return;
            }
        }
    };

    let Some(samples) = pcm.get(&channel.audio_data_id)
    else {
        warnings.record(WarningKind::MissingAudioReference);
        return;
    };

    let gain = channel.gain.value();
    let dst = &mut channels[speaker_idx];
    let len = dst.len().min(samples.len());
    for i in 0..len {
        dst[i] += samples[i] * gain;
    }
}

/// Renders every sub-block of a single Object Definition (spec §4.H step 4), reading ramp
/// continuity from `state` and writing the object's new gains back into it. Thin wrapper around
/// [`render_object_from`] for the single-threaded pipeline; [`crate::mt`] calls the latter
/// directly so concurrent object tasks never take `&mut RendererState` at the same time.
pub(crate) fn render_object(
    config: &RendererConfig,
    object: &ObjectDefinition,
    pcm: &HashMap<u32, Vec<f32>>,
    sample_count: usize,
    sub_block_count: usize,
    state: &mut RendererState,
    channels: &mut [Vec<f32>],
    ops: &ScalarVectorOps,
) {
    let previous = state.gains_for(object.metadata_id);
    let final_gains = render_object_from(config, object, pcm, sample_count, sub_block_count, &previous, channels, ops);
    state.set_gains(object.metadata_id, final_gains);
}

/// The pure core of object rendering: given the object's gains at the end of the previous frame
/// (or sub-block), mixes every sub-block into `channels` and returns the gains the object ends
/// this frame at, for the caller to persist (spec §4.H step 4). A silent object (`audio_data_id ==
/// 0`) or one whose audio reference is missing still computes and returns ramp state, but
/// contributes no samples.
pub(crate) fn render_object_from(
    config: &RendererConfig,
    object: &ObjectDefinition,
    pcm: &HashMap<u32, Vec<f32>>,
    sample_count: usize,
    sub_block_count: usize,
    previous_gains: &HashMap<usize, f32>,
    channels: &mut [Vec<f32>],
    ops: &ScalarVectorOps,
) -> HashMap<usize, f32> {
    let samples = if object.is_silent() { None } else { pcm.get(&object.audio_data_id) };
    let mut previous_gains = previous_gains.clone();

    for (k, sub_block) in object.sub_blocks.iter().enumerate() {
        let start = k * sample_count / sub_block_count;
        let end = (k + 1) * sample_count / sub_block_count;

        let pan = &sub_block.pan;
        let spatial_gains = vbap::resolve_pan_gains(config, pan.position, pan.snap, pan.zone_gain_9.as_ref(), pan.spread);
        let object_gain = pan.gain.value();
        let target_gains: Vec<(usize, f32)> = spatial_gains.into_iter().map(|(idx, g)| (idx, g * object_gain)).collect();

        if let Some(samples) = samples {
            for &(speaker_idx, target) in &target_gains {
                let previous = previous_gains.get(&speaker_idx).copied().unwrap_or(0.0);
                let dst = &mut channels[speaker_idx][start..end.min(channels[speaker_idx].len())];
                let src_end = end.min(samples.len());
                let src = if start < src_end { &samples[start..src_end] } else { &[] };
                let src = &src[..dst.len().min(src.len())];
                let dst = &mut dst[..src.len()];
                ops.multiply_add_ramp(dst, src, previous, target);
            }
        }

        previous_gains.clear();
        previous_gains.extend(target_gains);
    }

    previous_gains
}

/// Spec §4.H step 5: redistributes every configured speaker's accumulated signal onto its
/// declared downmix targets, in addition to (not instead of) that speaker's own buffer — a speaker
/// only lacks physical output in the first place when it is virtual, in which case its buffer is
/// never read by [`RenderedFrame::physical_channels`] anyway.
pub(crate) fn apply_trailing_downmixes(config: &RendererConfig, channels: &mut [Vec<f32>]) {
    for downmix in &config.downmixes {
        let source = channels[downmix.source].clone();
        for &(target_idx, coeff) in &downmix.targets_normalized {
            let dst = &mut channels[target_idx];
            for (d, &s) in dst.iter_mut().zip(source.iter()) {
                *d += s * coeff;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use iab_core::units::FrameRate;
    use iab_format::audio_data::AudioDataDlc;
    use iab_format::bed::BedChannel;
    use iab_format::channel::{ChannelId, UseCase};
    use iab_format::gain::Gain;
    use iab_format::object::{ObjectSubBlock, PanState};
    use iab_format::pan::Position;

    use super::*;
    use crate::config::ConfigBuilder;

    fn symmetric_5_1() -> RendererConfig {
        let mut b = ConfigBuilder::new();
        b.add_speaker("L", Some(0), -30.0, 0.0, None).unwrap();
        b.add_speaker("C", Some(1), 0.0, 0.0, None).unwrap();
        b.add_speaker("R", Some(2), 30.0, 0.0, None).unwrap();
        b.add_speaker("LS", Some(3), -110.0, 0.0, None).unwrap();
        b.add_speaker("RS", Some(4), 110.0, 0.0, None).unwrap();
        b.add_speaker("LFE", Some(5), 0.0, -90.0, None).unwrap();
        b.add_patch("L", "C", "R").unwrap();
        b.set_lfe("LFE").unwrap();
        b.build().unwrap()
    }

    fn dlc_asset(id: u32, samples: &[i32]) -> FrameSubElement {
        FrameSubElement::AudioDataDlc(AudioDataDlc {
            audio_data_id: id,
            sample_rate: SampleRate::Hz48000,
            payload: iab_dlc::encode(samples, SampleRate::Hz48000),
        })
    }

    #[test]
    fn verify_bed_channel_routes_to_named_speaker() {
        let config = symmetric_5_1();
        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let samples = vec![4_194_304i32; 2000]; // 0.5 full scale
        frame.add_sub_element(dlc_asset(1, &samples));

        let mut bed = BedDefinition::new(1, UseCase::NoUseCase);
        bed.add_channel(BedChannel { channel_id: ChannelId::Left, audio_data_id: 1, gain: Gain::UNITY, decor_coeff: None }).unwrap();
        frame.add_sub_element(FrameSubElement::Bed(bed));

        let mut state = RendererState::new();
        let mut warnings = WarningCounters::new();
        let rendered = render_frame(&frame, &config, &mut state, &mut warnings).unwrap();

        let l = config.speaker_by_name("L").unwrap();
        assert!((rendered.channels[l][0] - 0.5).abs() < 1e-3);
        assert_eq!(warnings.total(), 0);
    }

    #[test]
    fn verify_bed_lfe_without_configured_lfe_warns_and_drops() {
        let mut b = ConfigBuilder::new();
        b.add_speaker("L", Some(0), -30.0, 0.0, None).unwrap();
        let config = b.build().unwrap();

        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        frame.add_sub_element(dlc_asset(1, &vec![1_000_000; 2000]));
        let mut bed = BedDefinition::new(1, UseCase::NoUseCase);
        bed.add_channel(BedChannel { channel_id: ChannelId::Lfe, audio_data_id: 1, gain: Gain::UNITY, decor_coeff: None }).unwrap();
        frame.add_sub_element(FrameSubElement::Bed(bed));

        let mut state = RendererState::new();
        let mut warnings = WarningCounters::new();
        render_frame(&frame, &config, &mut state, &mut warnings).unwrap();
        assert_eq!(warnings.count(WarningKind::NoLfeForBedLfe), 1);
    }

    #[test]
    fn verify_missing_audio_reference_warns_and_is_silent() {
        let config = symmetric_5_1();
        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let mut bed = BedDefinition::new(1, UseCase::NoUseCase);
        bed.add_channel(BedChannel { channel_id: ChannelId::Left, audio_data_id: 99, gain: Gain::UNITY, decor_coeff: None }).unwrap();
        frame.add_sub_element(FrameSubElement::Bed(bed));

        let mut state = RendererState::new();
        let mut warnings = WarningCounters::new();
        let rendered = render_frame(&frame, &config, &mut state, &mut warnings).unwrap();
        assert_eq!(warnings.count(WarningKind::MissingAudioReference), 1);
        let l = config.speaker_by_name("L").unwrap();
        assert!(rendered.channels[l].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn verify_silent_object_yields_no_signal_but_still_ramps() {
        let config = symmetric_5_1();
        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let mut object = ObjectDefinition::new(1, 0);
        for _ in 0..frame.object_sub_block_count() {
            object.sub_blocks.push(ObjectSubBlock { pan_info_exists: true, pan: PanState::DEFAULT });
        }
        frame.add_sub_element(FrameSubElement::Object(object));

        let mut state = RendererState::new();
        let mut warnings = WarningCounters::new();
        let rendered = render_frame(&frame, &config, &mut state, &mut warnings).unwrap();
        for buf in &rendered.channels {
            assert!(buf.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn verify_object_ramps_toward_unity_gain_at_center_patch() {
        let config = symmetric_5_1();
        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let samples = vec![8_388_607i32; frame.sample_count() as usize];
        frame.add_sub_element(dlc_asset(7, &samples));

        let c = config.speaker_by_name("C").unwrap();
        let c_direction = config.speakers[c].direction;
        let position = Position::new((c_direction[0] + 1.0) / 2.0, (c_direction[1] + 1.0) / 2.0, (c_direction[2] + 1.0) / 2.0);

        let mut object = ObjectDefinition::new(2, 7);
        for _ in 0..frame.object_sub_block_count() {
            object
                .sub_blocks
                .push(ObjectSubBlock { pan_info_exists: true, pan: PanState { position, ..PanState::DEFAULT } });
        }
        frame.add_sub_element(FrameSubElement::Object(object));

        let mut state = RendererState::new();
        let mut warnings = WarningCounters::new();
        let rendered = render_frame(&frame, &config, &mut state, &mut warnings).unwrap();

        // Last sub-block's last sample should have ramped close to unity gain at C.
        let last = *rendered.channels[c].last().unwrap();
        assert!(last > 0.9, "expected near-unity gain at C, got {last}");
    }

    #[test]
    fn verify_96k_asset_uses_48k_base_layer_only() {
        let config = symmetric_5_1();
        let mut frame = Frame::new(0, SampleRate::Hz96000, FrameRate::Fps24, 10);
        let samples = vec![2_097_152i32; 4000]; // 96kHz frame sample count at Fps24
        frame.add_sub_element(FrameSubElement::AudioDataDlc(AudioDataDlc {
            audio_data_id: 1,
            sample_rate: SampleRate::Hz96000,
            payload: iab_dlc::encode(&samples, SampleRate::Hz96000),
        }));
        let mut bed = BedDefinition::new(1, UseCase::NoUseCase);
        bed.add_channel(BedChannel { channel_id: ChannelId::Left, audio_data_id: 1, gain: Gain::UNITY, decor_coeff: None }).unwrap();
        frame.add_sub_element(FrameSubElement::Bed(bed));

        let mut state = RendererState::new();
        let mut warnings = WarningCounters::new();
        let rendered = render_frame(&frame, &config, &mut state, &mut warnings).unwrap();
        // Renders at the fixed 48kHz output count, half the 96kHz frame's sample count.
        assert_eq!(rendered.sample_count, 2000);
    }
}
