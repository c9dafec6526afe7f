// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PCM and Rice residual sub-blocks (spec §4.E point 5).

use iab_core::errors::{dlc_decode_error, Result};
use iab_core::io::{BitReader, BitWriter};
use iab_core::util::bits::sign_extend_leq64_to_i64;

const BIT_DEPTH_BITS: u32 = 6;
const RICE_REM_BITS_BITS: u32 = 5;
const SIZE_BITS: u32 = 16;

const CODE_TYPE_PCM: u32 = 0;
const CODE_TYPE_RICE: u32 = 1;

/// One residual sub-block: either raw two's-complement PCM residuals or Rice-coded ones (spec
/// §4.E). Both carry their own sample count (`size`), which need not equal any other sub-block's.
#[derive(Debug, Clone, PartialEq)]
pub enum ResidualSubBlock {
    Pcm { bit_depth: u32, values: Vec<i64> },
    Rice { rem_bits: u32, values: Vec<i64> },
}

impl ResidualSubBlock {
    pub fn size(&self) -> usize {
        match self {
            ResidualSubBlock::Pcm { values, .. } => values.len(),
            ResidualSubBlock::Rice { values, .. } => values.len(),
        }
    }

    pub fn values(&self) -> &[i64] {
        match self {
            ResidualSubBlock::Pcm { values, .. } => values,
            ResidualSubBlock::Rice { values, .. } => values,
        }
    }

    /// Builds a PCM residual sub-block, picking the narrowest bit depth that losslessly
    /// represents every value as two's complement.
    pub fn pcm_from_values(values: Vec<i64>) -> Self {
        let bit_depth = minimal_signed_bit_depth(&values);
        ResidualSubBlock::Pcm { bit_depth, values }
    }

    /// Builds a Rice residual sub-block with the given remainder width.
    pub fn rice_from_values(rem_bits: u32, values: Vec<i64>) -> Self {
        ResidualSubBlock::Rice { rem_bits, values }
    }

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let code_type = reader.read_bits_leq32(1)?;
        match code_type {
            CODE_TYPE_PCM => {
                let bit_depth = reader.read_bits_leq32(BIT_DEPTH_BITS)?;
                let size = reader.read_bits_leq32(SIZE_BITS)? as usize;
                if bit_depth == 0 && size > 0 {
                    return dlc_decode_error("PCM residual sub-block declares zero bit depth with non-zero size");
                }
                let mut values = Vec::with_capacity(size);
                for _ in 0..size {
                    let raw = reader.read_bits_leq64(bit_depth)?;
                    values.push(sign_extend_leq64_to_i64(raw, bit_depth.max(1)));
                }
                Ok(ResidualSubBlock::Pcm { bit_depth, values })
            }
            CODE_TYPE_RICE => {
                let rem_bits = reader.read_bits_leq32(RICE_REM_BITS_BITS)?;
                let size = reader.read_bits_leq32(SIZE_BITS)? as usize;
                let mut values = Vec::with_capacity(size);
                for _ in 0..size {
                    let quotient = reader.read_unary_zeros()?;
                    let remainder = reader.read_bits_leq64(rem_bits)?;
                    let magnitude = (i64::from(quotient) << rem_bits) | remainder as i64;
                    let value = if magnitude == 0 {
                        0
                    }
                    else if reader.read_bit()? {
                        -magnitude
                    }
                    else {
                        magnitude
                    };
                    values.push(value);
                }
                Ok(ResidualSubBlock::Rice { rem_bits, values })
            }
            _ => unreachable!("single bit code type"),
        }
    }

    pub fn write(&self, writer: &mut BitWriter) {
        match self {
            ResidualSubBlock::Pcm { bit_depth, values } => {
                writer.write_bits_leq32(CODE_TYPE_PCM, 1);
                writer.write_bits_leq32(*bit_depth, BIT_DEPTH_BITS);
                writer.write_bits_leq32(values.len() as u32, SIZE_BITS);
                for &value in values {
                    writer.write_bits_leq64(value as u64 & mask_for_width(*bit_depth), *bit_depth);
                }
            }
            ResidualSubBlock::Rice { rem_bits, values } => {
                writer.write_bits_leq32(CODE_TYPE_RICE, 1);
                writer.write_bits_leq32(*rem_bits, RICE_REM_BITS_BITS);
                writer.write_bits_leq32(values.len() as u32, SIZE_BITS);
                for &value in values {
                    let magnitude = value.unsigned_abs();
                    let quotient = (magnitude >> rem_bits) as u32;
                    writer.write_unary_zeros(quotient);
                    writer.write_bits_leq64(magnitude & rice_rem_mask(*rem_bits), *rem_bits);
                    if magnitude != 0 {
                        writer.write_bit(value < 0);
                    }
                }
            }
        }
    }
}

fn rice_rem_mask(rem_bits: u32) -> u64 {
    if rem_bits == 0 {
        0
    }
    else {
        (1u64 << rem_bits) - 1
    }
}

fn mask_for_width(width: u32) -> u64 {
    if width == 0 {
        0
    }
    else if width >= 64 {
        u64::MAX
    }
    else {
        (1u64 << width) - 1
    }
}

/// Narrowest width (1..=63) that represents every value in `values` as two's complement; `0`
/// only when `values` is empty.
fn minimal_signed_bit_depth(values: &[i64]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let mut width = 1u32;
    loop {
        let min = -(1i64 << (width - 1));
        let max = (1i64 << (width - 1)) - 1;
        if values.iter().all(|&v| v >= min && v <= max) || width >= 63 {
            return width;
        }
        width += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(block: &ResidualSubBlock) -> ResidualSubBlock {
        let mut w = BitWriter::new();
        block.write(&mut w);
        let bytes = w.into_inner();
        let mut r = BitReader::new(&bytes);
        ResidualSubBlock::read(&mut r).unwrap()
    }

    #[test]
    fn verify_pcm_roundtrip() {
        let block = ResidualSubBlock::pcm_from_values(vec![0, -1, 1, 127, -128, 8_388_607, -8_388_608]);
        assert_eq!(roundtrip(&block), block);
    }

    #[test]
    fn verify_pcm_empty_roundtrip() {
        let block = ResidualSubBlock::pcm_from_values(Vec::new());
        assert_eq!(roundtrip(&block), block);
    }

    #[test]
    fn verify_rice_roundtrip_with_zeros_and_large_values() {
        let block = ResidualSubBlock::rice_from_values(4, vec![0, 0, 1, -1, 17, -17, 300, -300, 0]);
        assert_eq!(roundtrip(&block), block);
    }

    #[test]
    fn verify_rice_zero_rem_bits() {
        let block = ResidualSubBlock::rice_from_values(0, vec![0, 1, 2, 3, -1, -2]);
        assert_eq!(roundtrip(&block), block);
    }

    #[test]
    fn verify_minimal_bit_depth() {
        assert_eq!(minimal_signed_bit_depth(&[0]), 1);
        assert_eq!(minimal_signed_bit_depth(&[1, -1]), 2);
        assert_eq!(minimal_signed_bit_depth(&[127, -128]), 8);
        assert_eq!(minimal_signed_bit_depth(&[128]), 9);
    }
}
