// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authoring Tool Info: a null-terminated ASCII URI-like string pass-through (spec §3).

use iab_core::errors::{IabError, Result};
use iab_core::io::{BitReader, BitWriter};

/// A null-terminated ASCII string naming (or otherwise identifying) the tool that authored the
/// frame. This implementation treats the string as opaque pass-through data; it is never
/// interpreted, only carried (spec §6 "Exposed to collaborators").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthoringToolInfo {
    pub text: String,
}

impl AuthoringToolInfo {
    pub fn new(text: impl Into<String>) -> Self {
        AuthoringToolInfo { text: text.into() }
    }

    pub(crate) fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let mut bytes = Vec::new();
        loop {
            let byte = reader.read_byte()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        let text = String::from_utf8(bytes).map_err(|_| IabError::FrameStructure("authoring tool info is not valid ASCII/UTF-8"))?;
        Ok(AuthoringToolInfo { text })
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        for byte in self.text.as_bytes() {
            writer.write_bits_leq32(u32::from(*byte), 8);
        }
        writer.write_bits_leq32(0, 8);
    }
}
