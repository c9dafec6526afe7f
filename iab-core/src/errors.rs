// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error and warning taxonomy shared by the codec, DLC
//! sub-codec and renderer.

use std::error::Error as StdError;
use std::fmt;

/// `IabError` enumerates every fatal condition the core can report.
#[derive(Debug)]
pub enum IabError {
    /// A read crossed the end of the available bits/bytes, or a write exceeded a capped buffer.
    IoShort,
    /// A Plex-coded integer's escape sequence was never terminated.
    BadPlex,
    /// The bitstream's declared element or sub-frame size was exceeded while reading.
    SizeBound,
    /// A 2-bit gain/zone-gain prefix carried the reserved value.
    ReservedPrefix,
    /// The frame carried a version outside the recognised set, and strict mode is enabled.
    InvalidVersion(u8),
    /// `sample_rate` was not one of the values ST 2098-2 permits.
    InvalidSampleRate(u32),
    /// `frame_rate` was not one of the values ST 2098-2 permits.
    InvalidFrameRate,
    /// The element tree could not be traversed unambiguously (e.g. a bed channel count that
    /// contradicts its declared use case).
    FrameStructure(&'static str),
    /// The DLC sub-codec failed to decode an audio asset.
    DlcDecode(&'static str),
    /// The renderer configuration violates one of its build-time invariants.
    RendererConfig(&'static str),
    /// The frame's trailing integrity word did not match the computed checksum, and strict mode
    /// is enabled.
    CrcMismatch,
    /// An invariant internal to this implementation was violated.
    Internal(&'static str),
}

impl fmt::Display for IabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IabError::IoShort => write!(f, "unexpected end of bitstream"),
            IabError::BadPlex => write!(f, "unterminated plex-coded integer"),
            IabError::SizeBound => write!(f, "read would cross declared element boundary"),
            IabError::ReservedPrefix => write!(f, "reserved gain prefix encountered"),
            IabError::InvalidVersion(v) => write!(f, "unsupported bitstream version {v}"),
            IabError::InvalidSampleRate(r) => write!(f, "unsupported sample rate {r}"),
            IabError::InvalidFrameRate => write!(f, "unsupported frame rate code"),
            IabError::FrameStructure(msg) => write!(f, "malformed frame structure: {msg}"),
            IabError::DlcDecode(msg) => write!(f, "DLC decode failed: {msg}"),
            IabError::RendererConfig(msg) => write!(f, "invalid renderer configuration: {msg}"),
            IabError::CrcMismatch => write!(f, "sub-frame integrity word mismatch"),
            IabError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl StdError for IabError {}

pub type Result<T> = std::result::Result<T, IabError>;

/// Convenience constructor for a frame-structure error.
pub fn frame_structure_error<T>(msg: &'static str) -> Result<T> {
    Err(IabError::FrameStructure(msg))
}

/// Convenience constructor for a DLC decode error.
pub fn dlc_decode_error<T>(msg: &'static str) -> Result<T> {
    Err(IabError::DlcDecode(msg))
}

/// Convenience constructor for a renderer configuration error.
pub fn renderer_config_error<T>(msg: &'static str) -> Result<T> {
    Err(IabError::RendererConfig(msg))
}

/// Non-fatal conditions accumulated while parsing or rendering a frame. These never abort the
/// operation in progress; they are counted and exposed for the caller to inspect once per frame
/// or session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// An element's internal bit-counted fields did not exactly fill its declared Plex size.
    SizeMismatch,
    /// An unrecognised sub-element ID was skipped.
    UnknownElement,
    /// The frame version was outside the recognised set, but parsing continued (permissive mode).
    InvalidVersionPermissive,
    /// A bed channel declared LFE but the renderer configuration has no LFE speaker.
    NoLfeForBedLfe,
    /// A bed channel referenced an unrecognised loudspeaker label.
    UnknownChannelId,
    /// An audio_data_id did not resolve to any audio element in the frame.
    MissingAudioReference,
    /// An object's zone gain definition was empty or malformed; treated as unity.
    EmptyZone,
    /// No VBAP patch contained the pan direction; the nearest patch was used as a fallback.
    NoVbapPatch,
    /// A single asset failed DLC decode; it was rendered as silence.
    AssetDlcDecode,
    /// The sub-frame's trailing integrity word did not match the computed checksum, but strict
    /// mode was not enabled so parsing continued.
    CrcMismatchPermissive,
}

/// Accumulates warning counts keyed by [`WarningKind`] across a parse, pack, or render session.
#[derive(Debug, Clone, Default)]
pub struct WarningCounters {
    counts: std::collections::HashMap<WarningKind, u32>,
}

impl WarningCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `kind`.
    pub fn record(&mut self, kind: WarningKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
        log::debug!("warning recorded: {kind:?}");
    }

    /// Total warnings of every kind recorded so far.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Count of warnings of a specific kind.
    pub fn count(&self, kind: WarningKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Iterates over all non-zero warning counts.
    pub fn iter(&self) -> impl Iterator<Item = (&WarningKind, &u32)> {
        self.counts.iter()
    }

    /// Folds another counter's tallies into this one. Used by the multi-threaded renderer (spec
    /// §4.I) to combine per-task warning counts back onto the caller's counters once all render
    /// tasks for a frame have completed.
    pub fn merge(&mut self, other: &WarningCounters) {
        for (&kind, &count) in other.counts.iter() {
            *self.counts.entry(kind).or_insert(0) += count;
        }
    }
}
