// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sample-rate and frame-rate enumerations, and the closed lookup tables that relate them to a
//! frame's sample count and object sub-block count.

use crate::errors::{IabError, Result};

/// The two sample rates ST 2098-2 permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRate {
    Hz48000,
    Hz96000,
}

impl SampleRate {
    /// Decodes the 2-bit `sample_rate_code` field.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(SampleRate::Hz48000),
            1 => Ok(SampleRate::Hz96000),
            _ => Err(IabError::InvalidSampleRate(code)),
        }
    }

    /// Encodes to the 2-bit `sample_rate_code` field.
    pub fn to_code(self) -> u32 {
        match self {
            SampleRate::Hz48000 => 0,
            SampleRate::Hz96000 => 1,
        }
    }

    pub fn as_hz(self) -> u32 {
        match self {
            SampleRate::Hz48000 => 48_000,
            SampleRate::Hz96000 => 96_000,
        }
    }
}

/// The closed set of frame rates ST 2098-2 permits, grouped into three families that share an
/// object sub-block count: the 24 fps family (8 sub-blocks), the 48 fps family (4 sub-blocks),
/// and the 96 fps family (2 sub-blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRate {
    Fps23_976,
    Fps24,
    Fps25,
    Fps29_97,
    Fps30,
    Fps47_95,
    Fps48,
    Fps50,
    Fps59_94,
    Fps60,
    Fps96,
    Fps100,
    Fps119_88,
    Fps120,
}

impl FrameRate {
    /// Decodes the 4-bit `frame_rate_code` field.
    pub fn from_code(code: u32) -> Result<Self> {
        use FrameRate::*;
        Ok(match code {
            0 => Fps23_976,
            1 => Fps24,
            2 => Fps25,
            3 => Fps29_97,
            4 => Fps30,
            5 => Fps47_95,
            6 => Fps48,
            7 => Fps50,
            8 => Fps59_94,
            9 => Fps60,
            10 => Fps96,
            11 => Fps100,
            12 => Fps119_88,
            13 => Fps120,
            _ => return Err(IabError::InvalidFrameRate),
        })
    }

    /// Encodes to the 4-bit `frame_rate_code` field.
    pub fn to_code(self) -> u32 {
        use FrameRate::*;
        match self {
            Fps23_976 => 0,
            Fps24 => 1,
            Fps25 => 2,
            Fps29_97 => 3,
            Fps30 => 4,
            Fps47_95 => 5,
            Fps48 => 6,
            Fps50 => 7,
            Fps59_94 => 8,
            Fps60 => 9,
            Fps96 => 10,
            Fps100 => 11,
            Fps119_88 => 12,
            Fps120 => 13,
        }
    }

    /// The rate as frames per second, exact where the nominal rate is exact and a close decimal
    /// approximation where it is an NTSC-style fractional rate.
    pub fn as_fps(self) -> f64 {
        use FrameRate::*;
        match self {
            Fps23_976 => 24000.0 / 1001.0,
            Fps24 => 24.0,
            Fps25 => 25.0,
            Fps29_97 => 30000.0 / 1001.0,
            Fps30 => 30.0,
            Fps47_95 => 48000.0 / 1001.0,
            Fps48 => 48.0,
            Fps50 => 50.0,
            Fps59_94 => 60000.0 / 1001.0,
            Fps60 => 60.0,
            Fps96 => 96.0,
            Fps100 => 100.0,
            Fps119_88 => 120000.0 / 1001.0,
            Fps120 => 120.0,
        }
    }

    /// Number of object sub-blocks per frame at this rate, a closed lookup fixed by ST 2098-2.
    pub fn object_sub_block_count(self) -> usize {
        use FrameRate::*;
        match self {
            Fps23_976 | Fps24 | Fps25 | Fps29_97 | Fps30 => 8,
            Fps47_95 | Fps48 | Fps50 | Fps59_94 | Fps60 => 4,
            Fps96 | Fps100 | Fps119_88 | Fps120 => 2,
        }
    }

    /// Number of samples per channel in a frame at `sample_rate`, rounded to the nearest integer
    /// per the frame invariant `sample_count_per_channel = round(sample_rate / frame_rate)`.
    pub fn sample_count(self, sample_rate: SampleRate) -> u32 {
        (sample_rate.as_hz() as f64 / self.as_fps()).round() as u32
    }
}
