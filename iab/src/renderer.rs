// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The rendering entry point: a loudspeaker configuration plus the pan-gain ramp state it carries
//! across frames (spec §4.H step 4). Call [`Renderer::render`] once per frame, in frame order.

use iab_core::errors::{Result, WarningCounters};
use iab_format::frame::Frame;
use iab_render::{RenderedFrame, RendererConfig, RendererState};

#[cfg(feature = "mt")]
pub use iab_render::RenderOptions;

/// Renders frames against a fixed [`RendererConfig`], carrying ramp-gain continuity across calls.
/// Construct one per output stream; a fresh `Renderer` has no prior-frame state, so its first
/// frame ramps from silence (spec §4.H step 4 "or within a frame when the previous frame's final
/// state is known").
pub struct Renderer {
    config: RendererConfig,
    state: RendererState,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Renderer { config, state: RendererState::new() }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Renders one frame through the single-threaded pipeline (spec §4.H), returning per-speaker
    /// output alongside the warnings accumulated while rendering it.
    pub fn render(&mut self, frame: &Frame) -> Result<(RenderedFrame, WarningCounters)> {
        let mut warnings = WarningCounters::new();
        let rendered = iab_render::render_frame(frame, &self.config, &mut self.state, &mut warnings)?;
        Ok((rendered, warnings))
    }

    /// Renders one frame through the thread-pool-backed pipeline (spec §4.I), bit-identical to
    /// [`Renderer::render`] for the same frame, configuration and ramp state. Shares this
    /// renderer's ramp state with [`Renderer::render`], so the two entry points may be mixed
    /// frame-to-frame without breaking ramp continuity.
    #[cfg(feature = "mt")]
    pub fn render_mt(&mut self, frame: &Frame, options: &RenderOptions) -> Result<(RenderedFrame, WarningCounters)> {
        let mut warnings = WarningCounters::new();
        let rendered = iab_render::render_frame_mt(frame, &self.config, &mut self.state, &mut warnings, options)?;
        Ok((rendered, warnings))
    }
}

#[cfg(test)]
mod tests {
    use iab_core::units::{FrameRate, SampleRate};
    use iab_format::audio_data::AudioDataDlc;
    use iab_format::bed::BedDefinition;
    use iab_format::channel::{ChannelId, UseCase};
    use iab_format::frame::FrameSubElement;
    use iab_format::gain::Gain;

    use super::*;
    use crate::ConfigBuilder;

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

    #[test]
    fn verify_renderer_carries_ramp_state_across_frames() {
        let mut renderer = Renderer::new(symmetric_5_1());

        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let samples = vec![8_388_607i32; frame.sample_count() as usize];
        frame.add_sub_element(FrameSubElement::AudioDataDlc(AudioDataDlc {
            audio_data_id: 1,
            sample_rate: SampleRate::Hz48000,
            payload: iab_dlc::encode(&samples, SampleRate::Hz48000),
        }));
        let mut bed = BedDefinition::new(1, UseCase::NoUseCase);
        bed.add_channel(iab_format::bed::BedChannel {
            channel_id: ChannelId::Left,
            audio_data_id: 1,
            gain: Gain::UNITY,
            decor_coeff: None,
        })
        .unwrap();
        frame.add_sub_element(FrameSubElement::Bed(bed));

        let (first, warnings) = renderer.render(&frame).unwrap();
        assert_eq!(warnings.total(), 0);
        let l = renderer.config().speaker_by_name("L").unwrap();
        assert!((first.channels[l][0] - 1.0).abs() < 1e-3);

        let (second, _) = renderer.render(&frame).unwrap();
        assert!((second.channels[l][0] - 1.0).abs() < 1e-3);
    }
}
