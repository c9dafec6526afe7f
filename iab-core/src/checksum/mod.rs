// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `checksum` module provides the error-detecting code used for the frame's optional
//! trailing integrity word.

mod crc16;

pub use crc16::Crc16Ccitt;
