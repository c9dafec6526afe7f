// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Asset-level DLC encode/decode: the opaque byte payload an `AudioDataDlc` element carries (spec
//! §4.E). A 48 kHz asset is one [`crate::layer::Layer`]. A 96 kHz asset is two: a base layer
//! carrying the per-pair average of the full-rate signal, and an extension layer carrying the
//! per-pair difference, so that decoding the base layer alone already yields a valid 48 kHz
//! downmix (spec §4.E point 6, "a 96 kHz payload always embeds a 48 kHz layer").
//!
//! The average/difference split and its exact reconstruction are the integer mid/side
//! decorrelation used by lossless audio codecs generally (lifting scheme: store `(a+b)>>1` and
//! `a-b`; recover the dropped LSB of the sum from the parity of the difference).

use iab_core::errors::{dlc_decode_error, Result};
use iab_core::io::{BitReader, BitWriter};
use iab_core::units::SampleRate;

use crate::layer::Layer;

const SHIFT_BITS_BITS: u32 = 5;

/// Rice remainder width used by [`encode`]. Our encoder never tunes it per asset; a fixed,
/// moderate value keeps sub-block coding simple without materially affecting losslessness.
const DEFAULT_RICE_REM_BITS: u32 = 8;

/// Encodes `samples` (one frame's worth, at `sample_rate`) into an opaque DLC payload.
pub fn encode(samples: &[i32], sample_rate: SampleRate) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_bits_leq32(0, SHIFT_BITS_BITS);

    match sample_rate {
        SampleRate::Hz48000 => {
            encode_single_layer(samples).write(&mut writer);
        }
        SampleRate::Hz96000 => {
            let (mid, side) = split_mid_side(samples);
            encode_single_layer(&mid).write(&mut writer);
            encode_single_layer(&side).write(&mut writer);
        }
    }

    writer.into_inner()
}

/// Decodes only the asset's embedded 48 kHz layer (spec §4.H "96 kHz sample-rate case"): for a
/// 48 kHz payload this is the whole payload; for a 96 kHz payload this is the base (mid) layer
/// alone, which is already a valid 48 kHz downmix of the full-rate signal (see module docs). The
/// extension (side) layer, if present, is never read.
pub fn decode_48k_base_layer(payload: &[u8]) -> Result<Vec<i32>> {
    let mut reader = BitReader::new(payload);
    let shift_bits = reader.read_bits_leq32(SHIFT_BITS_BITS)?;
    let samples = Layer::read(&mut reader)?.decode();
    if shift_bits == 0 {
        Ok(samples)
    }
    else {
        Ok(samples.into_iter().map(|s| s << shift_bits).collect())
    }
}

/// Decodes an opaque DLC payload back into samples at `sample_rate`.
pub fn decode(payload: &[u8], sample_rate: SampleRate) -> Result<Vec<i32>> {
    let mut reader = BitReader::new(payload);
    let shift_bits = reader.read_bits_leq32(SHIFT_BITS_BITS)?;

    let samples = match sample_rate {
        SampleRate::Hz48000 => Layer::read(&mut reader)?.decode(),
        SampleRate::Hz96000 => {
            let mid = Layer::read(&mut reader)?.decode();
            let side = Layer::read(&mut reader)?.decode();
            join_mid_side(&mid, &side)?
        }
    };

    if shift_bits == 0 {
        Ok(samples)
    }
    else {
        Ok(samples.into_iter().map(|s| s << shift_bits).collect())
    }
}

/// A single region spanning every sample, order zero. Lossless by construction regardless of
/// signal content since the predictor contributes nothing; this trades compression ratio for an
/// encoder simple enough to ground a reference decoder against.
fn encode_single_layer(samples: &[i32]) -> Layer {
    let len = samples.len();
    Layer::encode(samples, &[len], &[Vec::new()], &[len], DEFAULT_RICE_REM_BITS)
}

/// Splits `samples` into an average ("mid") stream and a difference ("side") stream, one pair
/// per two consecutive input samples. An odd trailing sample is carried as an extra, side-less
/// entry at the end of `mid` (so `mid.len() == side.len()` or `mid.len() == side.len() + 1`).
fn split_mid_side(samples: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let pairs = samples.len() / 2;
    let mut mid = Vec::with_capacity(pairs + samples.len() % 2);
    let mut side = Vec::with_capacity(pairs);
    for i in 0..pairs {
        let a = samples[2 * i];
        let b = samples[2 * i + 1];
        mid.push((a + b) >> 1);
        side.push(a - b);
    }
    if samples.len() % 2 == 1 {
        mid.push(samples[samples.len() - 1]);
    }
    (mid, side)
}

/// Inverse of [`split_mid_side`].
fn join_mid_side(mid: &[i32], side: &[i32]) -> Result<Vec<i32>> {
    if mid.len() != side.len() && mid.len() != side.len() + 1 {
        return dlc_decode_error("96 kHz DLC base and extension layers disagree on pair count");
    }
    let mut samples = Vec::with_capacity(mid.len() + side.len());
    for (&m, &s) in mid.iter().zip(side.iter()) {
        let sum = (m << 1) | (s & 1);
        let a = (sum + s) >> 1;
        let b = (sum - s) >> 1;
        samples.push(a);
        samples.push(b);
    }
    if mid.len() > side.len() {
        samples.push(mid[mid.len() - 1]);
    }
    Ok(samples)
}
