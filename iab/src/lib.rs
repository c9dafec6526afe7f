// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! `iab` is the top-level ST 2098-2 Immersive Audio Bitstream crate: parse and pack the wire
//! bitstream ([`Parser`] / [`Packer`]), decode/encode its DLC sub-codec ([`dlc`]), and render a
//! frame to per-speaker PCM against a loudspeaker configuration ([`Renderer`]). This mirrors the
//! shape of the original `IABParserAPI` / `IABPackerAPI` / renderer entry points, split across the
//! pipeline-stage crates `iab-core`, `iab-format`, `iab-dlc` and `iab-render` this crate
//! re-exports and wires together.
//!
//! # Usage
//!
//! 1. Parse an existing bitstream with [`Parser`], or build a [`Frame`] by hand through
//!    `iab_format`'s typed element types and pack it with [`Packer`].
//! 2. Build a [`RendererConfig`] from a text configuration (spec §6) via [`parse_config`], or
//!    programmatically via [`ConfigBuilder`].
//! 3. Construct a [`Renderer`] from that configuration and call [`Renderer::render`] once per
//!    frame, in frame order, so pan-gain ramp continuity carries across frames correctly (spec
//!    §4.H step 4). Enable the `mt` feature and call [`Renderer::render_mt`] for the thread-pool
//!    backed path (spec §4.I); both share the same ramp state and the same output contract.

pub use iab_core::errors::{IabError, Result, WarningCounters, WarningKind};
pub use iab_core::units::{FrameRate, SampleRate};
pub use iab_format::frame::{Frame, FrameSubElement};

pub use iab_render::{parse_config, ConfigBuilder, RendererConfig};

/// Re-exports the DLC sub-codec (spec §4.E) for collaborators that encode or decode 24-bit PCM
/// assets directly, outside a full frame parse/pack round-trip.
pub mod dlc {
    pub use iab_dlc::{decode, decode_48k_base_layer, encode};
}

mod packer;
mod parser;
mod renderer;

pub use packer::Packer;
pub use parser::Parser;
pub use renderer::Renderer;
#[cfg(feature = "mt")]
pub use renderer::RenderOptions;
