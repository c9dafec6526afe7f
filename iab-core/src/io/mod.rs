// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bit-level I/O primitives shared by the codec and DLC sub-codec. Every ST 2098-2 field, plex
//! value and element header is read and written through [`BitReader`]/[`BitWriter`] even where
//! it is byte-aligned, so there is exactly one I/O abstraction rather than two redundant ones.

mod bit;

pub use bit::{BitReader, BitWriter};
