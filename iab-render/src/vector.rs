// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector arithmetic over sample buffers, kept behind a trait (spec §9 design note:
//! `original_source/VectDSP.cpp` / `VectDSPMacAccelerate.cpp` are a portable implementation and a
//! platform-accelerated one behind the same interface). Only the portable implementation is
//! provided here; the seam exists so an accelerated backend could be added as a Cargo feature
//! without changing [`pipeline`](crate::pipeline) call sites.

/// Buffer-level arithmetic the renderer pipeline needs: scaled accumulation, a linear ramp, and
/// fill. Every method operates on `dst` in place.
pub trait VectorOps {
    /// `dst[i] += src[i] * gain` for every `i`.
    fn multiply_add(&self, dst: &mut [f32], src: &[f32], gain: f32);

    /// `dst[i] += src[i] * gain(i)` where `gain` linearly interpolates from `start` (at `i = 0`)
    /// to `end` (at `i = dst.len() - 1`); a length-1 (or shorter) buffer uses `end` throughout
    /// (spec §4.H "Ramp semantics": degenerate sub-blocks take the current target).
    fn multiply_add_ramp(&self, dst: &mut [f32], src: &[f32], start: f32, end: f32);

    /// `dst[i] = value` for every `i`.
    fn fill(&self, dst: &mut [f32], value: f32);
}

/// The portable, scalar [`VectorOps`] implementation. No accelerated backend is registered in
/// this workspace; see the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarVectorOps;

impl VectorOps for ScalarVectorOps {
    fn multiply_add(&self, dst: &mut [f32], src: &[f32], gain: f32) {
        debug_assert_eq!(dst.len(), src.len());
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d += s * gain;
        }
    }

    fn multiply_add_ramp(&self, dst: &mut [f32], src: &[f32], start: f32, end: f32) {
        debug_assert_eq!(dst.len(), src.len());
        let len = dst.len();
        if len < 2 {
            for (d, &s) in dst.iter_mut().zip(src.iter()) {
                *d += s * end;
            }
            return;
        }
        let last = (len - 1) as f32;
        for (i, (d, &s)) in dst.iter_mut().zip(src.iter()).enumerate() {
            let t = i as f32 / last;
            let gain = start + (end - start) * t;
            *d += s * gain;
        }
    }

    fn fill(&self, dst: &mut [f32], value: f32) {
        dst.iter_mut().for_each(|d| *d = value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_multiply_add() {
        let ops = ScalarVectorOps;
        let mut dst = vec![1.0, 1.0, 1.0];
        ops.multiply_add(&mut dst, &[2.0, 3.0, 4.0], 0.5);
        assert_eq!(dst, vec![2.0, 2.5, 3.0]);
    }

    #[test]
    fn verify_ramp_endpoints_and_monotone() {
        let ops = ScalarVectorOps;
        let src = vec![1.0; 5];
        let mut dst = vec![0.0; 5];
        ops.multiply_add_ramp(&mut dst, &src, 0.0, 1.0);
        assert_eq!(dst[0], 0.0);
        assert_eq!(dst[4], 1.0);
        for w in dst.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn verify_ramp_degenerate_length_uses_end() {
        let ops = ScalarVectorOps;
        let mut dst = vec![0.0];
        ops.multiply_add_ramp(&mut dst, &[1.0], 0.2, 0.9);
        assert_eq!(dst[0], 0.9);
    }

    #[test]
    fn verify_fill() {
        let ops = ScalarVectorOps;
        let mut dst = vec![0.0; 4];
        ops.fill(&mut dst, 7.0);
        assert_eq!(dst, vec![7.0; 4]);
    }
}
