// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One full-rate DLC layer: a sequence of prediction regions (each with its own lattice order and
//! `K` coefficients) laid end to end over the layer's samples, and a separately-partitioned
//! sequence of residual sub-blocks carrying the entropy-coded prediction error (spec §4.E
//! "Regions" and "Sub-blocks"). The two partitions run over the same sample axis but need not
//! share boundaries: regions govern how the predictor resets, sub-blocks govern how the residual
//! stream is chunked for entropy coding.

use iab_core::errors::{dlc_decode_error, Result};
use iab_core::io::{BitReader, BitWriter};

use crate::predictor::LatticePredictor;
use crate::residual::ResidualSubBlock;

const NUM_PRED_REGIONS_BITS: u32 = 2;
const ORDER_BITS: u32 = 5;
const REGION_LENGTH_BITS: u32 = 16;
const K_COEFF_BITS: u32 = 10;
const NUM_SUB_BLOCKS_BITS: u32 = 8;

const MAX_REGIONS: usize = 4;
const MAX_ORDER: usize = 31;

/// One prediction region: `order` reflection coefficients (`k`), in effect for `length`
/// consecutive samples (spec §4.E). Regions within a layer always start the lattice fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorRegion {
    pub length: usize,
    pub k: Vec<i32>,
}

impl PredictorRegion {
    pub fn order(&self) -> usize {
        self.k.len()
    }
}

/// A complete DLC layer: its prediction regions and residual sub-blocks (spec §4.E).
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub regions: Vec<PredictorRegion>,
    pub sub_blocks: Vec<ResidualSubBlock>,
}

impl Layer {
    /// Total sample count implied by the region partition (spec invariant: sum of region
    /// lengths equals the layer's sample count).
    pub fn sample_count(&self) -> usize {
        self.regions.iter().map(|r| r.length).sum()
    }

    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let num_regions_code = reader.read_bits_leq32(NUM_PRED_REGIONS_BITS)? as usize;
        let region_count = num_regions_code + 1;
        debug_assert!(region_count <= MAX_REGIONS);

        let mut regions = Vec::with_capacity(region_count);
        for _ in 0..region_count {
            let order = reader.read_bits_leq32(ORDER_BITS)? as usize;
            if order > MAX_ORDER {
                return dlc_decode_error("predictor region order exceeds the 5-bit field's range");
            }
            let length = reader.read_bits_leq32(REGION_LENGTH_BITS)? as usize;
            let mut k = Vec::with_capacity(order);
            for _ in 0..order {
                k.push(reader.read_bits_leq32_signed(K_COEFF_BITS)?);
            }
            regions.push(PredictorRegion { length, k });
        }

        let num_sub_blocks = reader.read_bits_leq32(NUM_SUB_BLOCKS_BITS)? as usize;
        let mut sub_blocks = Vec::with_capacity(num_sub_blocks);
        for _ in 0..num_sub_blocks {
            sub_blocks.push(ResidualSubBlock::read(reader)?);
        }

        let layer = Layer { regions, sub_blocks };
        let region_total = layer.sample_count();
        let sub_block_total: usize = layer.sub_blocks.iter().map(|b| b.size()).sum();
        if region_total != sub_block_total {
            return dlc_decode_error("region lengths and residual sub-block sizes disagree on the layer's sample count");
        }
        Ok(layer)
    }

    pub fn write(&self, writer: &mut BitWriter) {
        debug_assert!(!self.regions.is_empty() && self.regions.len() <= MAX_REGIONS);
        writer.write_bits_leq32((self.regions.len() - 1) as u32, NUM_PRED_REGIONS_BITS);
        for region in &self.regions {
            debug_assert!(region.order() <= MAX_ORDER);
            writer.write_bits_leq32(region.order() as u32, ORDER_BITS);
            writer.write_bits_leq32(region.length as u32, REGION_LENGTH_BITS);
            for &k in &region.k {
                writer.write_bits_leq32(k as u32 & ((1 << K_COEFF_BITS) - 1), K_COEFF_BITS);
            }
        }
        writer.write_bits_leq32(self.sub_blocks.len() as u32, NUM_SUB_BLOCKS_BITS);
        for block in &self.sub_blocks {
            block.write(writer);
        }
    }

    /// Runs every region's lattice predictor over `samples` (encoder direction) and packs the
    /// resulting residuals into `sub_block_lengths`-sized [`ResidualSubBlock::Rice`] blocks with
    /// `rem_bits` each. `samples.len()` must equal the sum of `region_lengths`, and
    /// `sub_block_lengths` must sum to the same total.
    pub fn encode(samples: &[i32], region_lengths: &[usize], k_per_region: &[Vec<i32>], sub_block_lengths: &[usize], rice_rem_bits: u32) -> Self {
        debug_assert_eq!(region_lengths.len(), k_per_region.len());
        debug_assert_eq!(samples.len(), region_lengths.iter().sum::<usize>());
        debug_assert_eq!(samples.len(), sub_block_lengths.iter().sum::<usize>());

        let mut residuals = Vec::with_capacity(samples.len());
        let mut offset = 0usize;
        let mut regions = Vec::with_capacity(region_lengths.len());
        for (&length, k) in region_lengths.iter().zip(k_per_region.iter()) {
            let mut predictor = LatticePredictor::new(k.len());
            for &sample in &samples[offset..offset + length] {
                residuals.push(predictor.analyze(k, sample));
            }
            regions.push(PredictorRegion { length, k: k.clone() });
            offset += length;
        }

        let mut sub_blocks = Vec::with_capacity(sub_block_lengths.len());
        let mut pos = 0usize;
        for &length in sub_block_lengths {
            let chunk = residuals[pos..pos + length].to_vec();
            sub_blocks.push(ResidualSubBlock::rice_from_values(rice_rem_bits, chunk));
            pos += length;
        }

        Layer { regions, sub_blocks }
    }

    /// Inverse of [`Self::encode`]: concatenates every sub-block's residual values, then runs
    /// each region's lattice predictor in synthesis direction to reconstruct the samples.
    pub fn decode(&self) -> Vec<i32> {
        let residuals: Vec<i64> = self.sub_blocks.iter().flat_map(|b| b.values().iter().copied()).collect();

        let mut samples = Vec::with_capacity(residuals.len());
        let mut offset = 0usize;
        for region in &self.regions {
            let mut predictor = LatticePredictor::new(region.order());
            for &residual in &residuals[offset..offset + region.length] {
                samples.push(predictor.synthesize(&region.k, residual));
            }
            offset += region.length;
        }
        samples
    }
}
