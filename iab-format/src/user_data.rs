// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User Data: a 16-byte universal label plus an arbitrary byte block, passed through unchanged
//! (spec §3, §6).

use iab_core::errors::Result;
use iab_core::io::{BitReader, BitWriter};

use crate::plex;

pub const UNIVERSAL_LABEL_LEN: usize = 16;

/// An opaque, application-defined block of user data, identified by a 16-byte universal label.
/// Neither the label nor the payload is interpreted by this implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub universal_label: [u8; UNIVERSAL_LABEL_LEN],
    pub payload: Vec<u8>,
}

impl UserData {
    pub fn new(universal_label: [u8; UNIVERSAL_LABEL_LEN], payload: Vec<u8>) -> Self {
        UserData { universal_label, payload }
    }

    pub(crate) fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let mut universal_label = [0u8; UNIVERSAL_LABEL_LEN];
        for b in universal_label.iter_mut() {
            *b = reader.read_byte()?;
        }
        let len = plex::read_plex8(reader)? as usize;
        let mut payload = vec![0u8; len];
        reader.read_bytes_aligned(&mut payload)?;
        Ok(UserData { universal_label, payload })
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        writer.write_bytes_aligned(&self.universal_label);
        plex::write_plex8(writer, self.payload.len() as u32);
        writer.write_bytes_aligned(&self.payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_user_data_roundtrip() {
        let data = UserData::new([0xAB; UNIVERSAL_LABEL_LEN], vec![1, 2, 3, 4, 5]);
        let mut w = BitWriter::new();
        data.write(&mut w);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        assert_eq!(UserData::read(&mut r).unwrap(), data);
    }

    #[test]
    fn verify_empty_user_data_payload() {
        let data = UserData::new([0u8; UNIVERSAL_LABEL_LEN], Vec::new());
        let mut w = BitWriter::new();
        data.write(&mut w);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        assert_eq!(UserData::read(&mut r).unwrap(), data);
    }
}
