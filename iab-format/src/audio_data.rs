// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Audio Data DLC and Audio Data PCM elements (spec §3). These carry the element framing only;
//! the DLC payload's internal predictive/residual structure is owned by the `iab-dlc` crate,
//! which this crate does not depend on (the codec and the sub-codec are separate components per
//! spec §2).

use iab_core::errors::{frame_structure_error, Result};
use iab_core::io::{BitReader, BitWriter};
use iab_core::units::SampleRate;

use crate::plex;

/// An Audio Data DLC element: an `audio_data_id`, its sample rate, and the opaque DLC payload
/// bytes (spec §3, §4.E). A 96 kHz payload always embeds a 48 kHz layer per spec §4.E point 6.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDataDlc {
    pub audio_data_id: u32,
    pub sample_rate: SampleRate,
    pub payload: Vec<u8>,
}

impl AudioDataDlc {
    pub(crate) fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let audio_data_id = plex::read_plex8(reader)?;
        let sample_rate = SampleRate::from_code(reader.read_bits_leq32(2)?)?;
        reader.align();
        let len = plex::read_plex8(reader)? as usize;
        let mut payload = vec![0u8; len];
        reader.read_bytes_aligned(&mut payload)?;
        Ok(AudioDataDlc { audio_data_id, sample_rate, payload })
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        plex::write_plex8(writer, self.audio_data_id);
        writer.write_bits_leq32(self.sample_rate.to_code(), 2);
        writer.align();
        plex::write_plex8(writer, self.payload.len() as u32);
        writer.write_bytes_aligned(&self.payload);
    }
}

/// Full-scale divisor for a 24-bit signed sample (spec §9 design note, `original_source/
/// PCMUtilities.h`): decoded DLC and PCM samples alike are normalised through this constant before
/// the renderer pipeline mixes them as floats.
pub const PCM_FULL_SCALE: f32 = 8_388_608.0;

/// Normalises a decoded 24-bit sample to a float in `[-1.0, 1.0)`.
pub fn sample_to_f32(sample: i32) -> f32 {
    sample as f32 / PCM_FULL_SCALE
}

/// An Audio Data PCM element: raw 24-bit big-endian samples, `sample_count * 3` bytes (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDataPcm {
    pub audio_data_id: u32,
    /// One 24-bit sample per entry, sign-extended into an `i32`.
    pub samples: Vec<i32>,
}

impl AudioDataPcm {
    pub(crate) fn read(reader: &mut BitReader<'_>, sample_count: u32) -> Result<Self> {
        let audio_data_id = plex::read_plex8(reader)?;
        let mut samples = Vec::with_capacity(sample_count as usize);
        for _ in 0..sample_count {
            samples.push(reader.read_bits_leq32_signed(24)?);
        }
        Ok(AudioDataPcm { audio_data_id, samples })
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        plex::write_plex8(writer, self.audio_data_id);
        for &sample in &self.samples {
            writer.write_bits_leq32((sample as u32) & 0x00FF_FFFF, 24);
        }
    }

    /// Validates `samples.len()` against the frame's declared sample count, per spec §3's
    /// "Invariant: all audio sub-elements must carry exactly that many samples."
    pub fn validate_sample_count(&self, expected: u32) -> Result<()> {
        if self.samples.len() as u32 != expected {
            return frame_structure_error("PCM audio data element sample count does not match the frame");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_audio_data_dlc_roundtrip() {
        let elem = AudioDataDlc { audio_data_id: 5, sample_rate: SampleRate::Hz96000, payload: vec![1, 2, 3, 4, 5] };
        let mut w = BitWriter::new();
        elem.write(&mut w);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        assert_eq!(AudioDataDlc::read(&mut r).unwrap(), elem);
    }

    #[test]
    fn verify_audio_data_pcm_roundtrip_and_sign() {
        let elem = AudioDataPcm { audio_data_id: 2, samples: vec![0, -1, 8_388_607, -8_388_608, 12345] };
        let mut w = BitWriter::new();
        elem.write(&mut w);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        let decoded = AudioDataPcm::read(&mut r, elem.samples.len() as u32).unwrap();
        assert_eq!(decoded, elem);
        decoded.validate_sample_count(5).unwrap();
        assert!(decoded.validate_sample_count(4).is_err());
    }

    #[test]
    fn verify_sample_to_f32_full_scale() {
        assert_eq!(sample_to_f32(0), 0.0);
        assert!((sample_to_f32(8_388_607) - 1.0).abs() < 1e-6);
        assert_eq!(sample_to_f32(-8_388_608), -1.0);
    }
}
