// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `iab-core` provides the bit/byte I/O, error taxonomy, checksum and unit primitives shared by
//! the frame codec, the DLC sub-codec and the renderer.

pub mod checksum;
pub mod errors;
pub mod io;
pub mod units;
pub mod util;
