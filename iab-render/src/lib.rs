// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `iab-render` implements the ST 2098-2 renderer: speaker/patch configuration (spec §4.F), the
//! VBAP gain engine (spec §4.G), and the decode-then-render pipeline (spec §4.H) that turns a
//! [`iab_format::frame::Frame`] into per-speaker sample buffers. An optional `mt` feature adds a
//! thread-pool-backed variant (spec §4.I) that is bit-identical to the single-threaded path.

pub mod config;
pub mod grammar;
#[cfg(feature = "mt")]
pub mod mt;
pub mod pipeline;
pub mod vbap;
pub mod vector;
pub mod zone;

pub use config::{ConfigBuilder, RendererConfig};
pub use grammar::parse_config;
#[cfg(feature = "mt")]
pub use mt::{render_frame_mt, RenderOptions};
pub use pipeline::{render_frame, RenderedFrame, RendererState};
