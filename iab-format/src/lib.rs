// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `iab-format` implements the ST 2098-2 IAB frame tree model and its bit-exact codec: Plex
//! variable-length integers, generic element framing, and the typed sub-element variants (Bed,
//! Object, Audio Data, Authoring Tool Info, User Data) that make up a [`frame::Frame`].

pub mod audio_data;
pub mod authoring_tool;
pub mod bed;
pub mod channel;
pub mod codec;
pub mod element;
pub mod frame;
pub mod gain;
pub mod object;
pub mod pan;
pub mod plex;
pub mod tag;
pub mod user_data;

pub use codec::{pack, parse, Bitstream, PackOptions, ParseOptions};
pub use frame::{AudioDataRef, Frame, FrameSubElement};
