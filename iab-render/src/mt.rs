// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The multi-threaded render pipeline (spec §4.I): a decode queue and an object render queue,
//! each fanned out across a small worker pool, joined before the next phase starts. Every object
//! still renders through [`crate::pipeline::render_object_from`] into its own private scratch
//! buffer, so the only thing concurrency changes is *when* a buffer's samples are computed, never
//! *how*; the final reduction sums those buffers back into the shared channels in the same order
//! [`crate::pipeline::render_frame`] would have produced them itself, so the two paths are
//! bit-identical (spec §4.I "deterministic, bit-identical to the single-threaded renderer").

use std::sync::Mutex;

use iab_core::errors::{IabError, Result, WarningCounters, WarningKind};
use iab_format::frame::{Frame, FrameSubElement};
use iab_format::object::ObjectDefinition;

use crate::config::RendererConfig;
use crate::pipeline::{self, RenderedFrame, RendererState};
use crate::vector::ScalarVectorOps;

/// Worker count used when [`RenderOptions::thread_count`] is `None`: the host's available
/// parallelism, or [`DEFAULT_THREAD_COUNT`] if that cannot be determined (spec §4.I "a small
/// worker pool, sized to the host by default").
const DEFAULT_THREAD_COUNT: usize = 4;

/// Tuning knobs for [`render_frame_mt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Explicit worker count. `None` asks the host for its available parallelism.
    pub thread_count: Option<usize>,
}

fn resolve_thread_count(options: &RenderOptions) -> usize {
    options
        .thread_count
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(DEFAULT_THREAD_COUNT))
        .max(1)
}

/// Runs `f` over every item in `items`, fanned out across `thread_count` scoped worker threads
/// pulling indices off a shared queue, and returns the outputs in the same order as `items`. This
/// is the decode queue and the object render queue both: the work item type and the per-item
/// closure differ, the fan-out/join shape does not.
///
/// A worker that panics fails the whole call: every other worker is still joined (no sample data
/// outlives a dropped scope), but the frame as a whole fails rather than rendering with a gap
/// (spec §4.I "a frame fully renders or fully fails").
fn run_parallel<'env, T, R, F>(thread_count: usize, items: &'env [T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &'env T) -> R + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let thread_count = thread_count.min(items.len());

    let (work_tx, work_rx) = crossbeam::channel::unbounded::<usize>();
    for idx in 0..items.len() {
        work_tx.send(idx).expect("receiver outlives every send, the scope below joins before it drops");
    }
    drop(work_tx);

    let results: Mutex<Vec<Option<R>>> = Mutex::new((0..items.len()).map(|_| None).collect());
    let f = &f;
    let results_ref = &results;

    let join_outcome = crossbeam::thread::scope(|scope| {
        for _ in 0..thread_count {
            let work_rx = work_rx.clone();
            scope.spawn(move |_| {
                while let Ok(idx) = work_rx.recv() {
                    let out = f(idx, &items[idx]);
                    results_ref.lock().expect("worker panics are the only poison source, and scope() surfaces those")[idx] = Some(out);
                }
            });
        }
    });

    join_outcome.map_err(|_| IabError::Internal("a render worker thread panicked"))?;

    let results = results.into_inner().expect("no worker is still running past the join above");
    Ok(results.into_iter().map(|out| out.expect("every queued index was claimed by exactly one worker")).collect())
}

/// Spec §4.I's decode queue: one task per frame sub-element, run across the pool, joined before
/// any rendering starts. Mirrors [`pipeline::decode_all_assets`] exactly except for where each
/// decode actually runs.
fn decode_all_assets_mt(frame: &Frame, thread_count: usize, warnings: &mut WarningCounters) -> Result<std::collections::HashMap<u32, Vec<f32>>> {
    let decoded = run_parallel(thread_count, &frame.sub_elements, |_, element| pipeline::decode_asset_element(element))?;

    let mut pcm = std::collections::HashMap::new();
    for entry in decoded.into_iter().flatten() {
        match entry {
            (id, Ok(samples)) => {
                pcm.insert(id, samples);
            }
            (_, Err(_)) => warnings.record(WarningKind::AssetDlcDecode),
        }
    }
    Ok(pcm)
}

/// One render-queue task: renders `object` into a freshly zeroed, full-width scratch buffer
/// (rather than the shared channel buffers every other concurrent task is also touching) so tasks
/// never contend for write access, and returns it alongside the object's new ramp-continuity
/// gains for the caller to persist once every task has finished (spec §4.I "workers never share
/// mutable state across tasks").
fn render_object_task(
    config: &RendererConfig,
    object: &ObjectDefinition,
    pcm: &std::collections::HashMap<u32, Vec<f32>>,
    sample_count: usize,
    sub_block_count: usize,
    previous_gains: &std::collections::HashMap<usize, f32>,
) -> (std::collections::HashMap<usize, f32>, Vec<Vec<f32>>) {
    let ops = ScalarVectorOps;
    let mut scratch = vec![vec![0.0f32; sample_count]; config.speakers.len()];
    let final_gains = pipeline::render_object_from(config, object, pcm, sample_count, sub_block_count, previous_gains, &mut scratch, &ops);
    (final_gains, scratch)
}

/// The multi-threaded counterpart to [`crate::pipeline::render_frame`]: decodes every audio
/// element across a worker pool, renders beds single-threaded (their contribution is a handful of
/// additions, not worth parallelising), renders every object across the pool into a private
/// scratch buffer, then sums those buffers back into the output in frame order. Produces
/// bit-identical output to the single-threaded renderer for the same frame, config and starting
/// `state` (spec §4.I).
pub fn render_frame_mt(
    frame: &Frame,
    config: &RendererConfig,
    state: &mut RendererState,
    warnings: &mut WarningCounters,
    options: &RenderOptions,
) -> Result<RenderedFrame> {
    let thread_count = resolve_thread_count(options);
    let sample_count = pipeline::render_sample_count(frame);

    let pcm = decode_all_assets_mt(frame, thread_count, warnings)?;

    let mut channels = vec![vec![0.0f32; sample_count]; config.speakers.len()];
    for bed in frame.beds() {
        pipeline::render_bed(config, bed, &pcm, &mut channels, warnings);
    }

    let objects: Vec<&ObjectDefinition> = frame.objects().collect();
    let sub_block_count = frame.object_sub_block_count();
    let previous_snapshots: Vec<std::collections::HashMap<usize, f32>> =
        objects.iter().map(|object| state.gains_for(object.metadata_id)).collect();

    let rendered_objects = run_parallel(thread_count, &objects, |idx, &object| {
        render_object_task(config, object, &pcm, sample_count, sub_block_count, &previous_snapshots[idx])
    })?;

    for (object, (final_gains, scratch)) in objects.into_iter().zip(rendered_objects.into_iter()) {
        for (dst, src) in channels.iter_mut().zip(scratch.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += s;
            }
        }
        state.set_gains(object.metadata_id, final_gains);
    }

    pipeline::apply_trailing_downmixes(config, &mut channels);

    Ok(RenderedFrame { sample_count, channels })
}

#[cfg(test)]
mod tests {
    use iab_core::units::{FrameRate, SampleRate};
    use iab_format::audio_data::AudioDataDlc;
    use iab_format::bed::{BedChannel, BedDefinition};
    use iab_format::channel::{ChannelId, UseCase};
    use iab_format::gain::Gain;
    use iab_format::object::{ObjectDefinition, ObjectSubBlock, PanState};
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

    fn multi_object_frame() -> Frame {
        let mut frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        for oid in 1..=6u32 {
            let samples = vec![(oid as i32) * 500_000; frame.sample_count() as usize];
            frame.add_sub_element(FrameSubElement::AudioDataDlc(AudioDataDlc {
                audio_data_id: oid,
                sample_rate: SampleRate::Hz48000,
                payload: iab_dlc::encode(&samples, SampleRate::Hz48000),
            }));
            let mut object = ObjectDefinition::new(oid, oid);
            let position = Position::new(0.1 * (oid as f32), 0.5, 0.5);
            for _ in 0..frame.object_sub_block_count() {
                object
                    .sub_blocks
                    .push(ObjectSubBlock { pan_info_exists: true, pan: PanState { position, ..PanState::DEFAULT } });
            }
            frame.add_sub_element(FrameSubElement::Object(object));
        }

        let mut bed = BedDefinition::new(100, UseCase::NoUseCase);
        bed.add_channel(BedChannel { channel_id: ChannelId::Left, audio_data_id: 1, gain: Gain::UNITY, decor_coeff: None }).unwrap();
        frame.add_sub_element(FrameSubElement::Bed(bed));
        frame
    }

    #[test]
    fn verify_mt_matches_single_threaded_output() {
        let config = symmetric_5_1();
        let frame = multi_object_frame();

        let mut state_st = RendererState::new();
        let mut warnings_st = WarningCounters::new();
        let rendered_st = pipeline::render_frame(&frame, &config, &mut state_st, &mut warnings_st).unwrap();

        let mut state_mt = RendererState::new();
        let mut warnings_mt = WarningCounters::new();
        let options = RenderOptions { thread_count: Some(3) };
        let rendered_mt = render_frame_mt(&frame, &config, &mut state_mt, &mut warnings_mt, &options).unwrap();

        assert_eq!(rendered_st.sample_count, rendered_mt.sample_count);
        for (ch_st, ch_mt) in rendered_st.channels.iter().zip(rendered_mt.channels.iter()) {
            assert_eq!(ch_st, ch_mt, "single-threaded and multi-threaded renders diverged");
        }
    }

    #[test]
    fn verify_mt_carries_ramp_state_across_frames_like_single_threaded() {
        let config = symmetric_5_1();
        let frame = multi_object_frame();

        let mut state_st = RendererState::new();
        let mut warnings_st = WarningCounters::new();
        pipeline::render_frame(&frame, &config, &mut state_st, &mut warnings_st).unwrap();
        let second_st = pipeline::render_frame(&frame, &config, &mut state_st, &mut warnings_st).unwrap();

        let mut state_mt = RendererState::new();
        let mut warnings_mt = WarningCounters::new();
        let options = RenderOptions::default();
        render_frame_mt(&frame, &config, &mut state_mt, &mut warnings_mt, &options).unwrap();
        let second_mt = render_frame_mt(&frame, &config, &mut state_mt, &mut warnings_mt, &options).unwrap();

        for (ch_st, ch_mt) in second_st.channels.iter().zip(second_mt.channels.iter()) {
            assert_eq!(ch_st, ch_mt);
        }
    }

    #[test]
    fn verify_empty_frame_renders_silence() {
        let config = symmetric_5_1();
        let frame = Frame::new(0, SampleRate::Hz48000, FrameRate::Fps24, 10);
        let mut state = RendererState::new();
        let mut warnings = WarningCounters::new();
        let rendered = render_frame_mt(&frame, &config, &mut state, &mut warnings, &RenderOptions::default()).unwrap();
        assert!(rendered.channels.iter().all(|buf| buf.iter().all(|&s| s == 0.0)));
    }
}
