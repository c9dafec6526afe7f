// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The lattice-form all-pole predictor that turns a region's reflection (`K`) coefficients into
//! a per-sample prediction (spec §4.E "Predictor").
//!
//! The lattice is the textbook PARCOR structure: stage `m` (`1..=order`) derives its forward and
//! backward residuals from stage `m-1`'s,
//!
//! ```text
//! e_m[n] = e_{m-1}[n] - k_m * b_{m-1}[n-1]
//! b_m[n] = b_{m-1}[n-1] - k_m * e_{m-1}[n]
//! ```
//!
//! with `e_0 = b_0 = x` (the sample itself). [`LatticePredictor::analyze`] runs this forward
//! (encoder) to turn a sample into the final-stage residual `e_order`; [`LatticePredictor::synthesize`]
//! runs the algebraic inverse (decoder) to turn `e_order` back into the sample. Both use the same
//! truncating fixed-point multiply for every `k_m * (...)` term, so the two directions stay exact
//! inverses of one another bit-for-bit — this is what makes the sub-codec lossless regardless of
//! how good a given set of `K`-coefficients actually is at prediction.
//!
//! Only `b_0..b_{order-1}` at the previous sample are ever needed as history ( `b_order` feeds no
//! further stage), so [`LatticePredictor`] carries exactly `order` words of state.

/// Fractional bits backing the signed 10-bit `K`-coefficient fixed-point scale (spec §4.E: "each
/// encoded as a signed 10-bit value"). A raw value of `512` (the nearest the 10-bit range gets to
/// it) represents a reflection coefficient of 1.0.
pub const K_FRAC_BITS: u32 = 9;

/// Per-region lattice predictor state. A region always starts with all-zero state (spec §4.E
/// regions are independent segments); [`LatticePredictor::new`] / [`LatticePredictor::reset`]
/// both establish that.
#[derive(Debug, Clone)]
pub struct LatticePredictor {
    /// `state[j]` holds `b_j[n-1]`, the backward residual at stage `j`, from the previous sample.
    state: Vec<i64>,
}

impl LatticePredictor {
    pub fn new(order: usize) -> Self {
        LatticePredictor { state: vec![0i64; order] }
    }

    pub fn order(&self) -> usize {
        self.state.len()
    }

    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|s| *s = 0);
    }

    /// Analysis (encoder) direction: given the true sample, returns the final-stage residual
    /// `e_order` and advances the lattice state.
    pub fn analyze(&mut self, k: &[i32], sample: i32) -> i64 {
        let order = k.len();
        debug_assert_eq!(order, self.state.len());

        let mut e = vec![0i64; order + 1];
        e[0] = i64::from(sample);

        let mut new_state = vec![0i64; order];
        if order > 0 {
            new_state[0] = e[0];
        }

        for m in 1..=order {
            let j = m - 1;
            let kk = i64::from(k[j]);
            let prev_b = self.state[j];
            let contrib_e = (kk * prev_b) >> K_FRAC_BITS;
            e[m] = e[m - 1] - contrib_e;

            if m < order {
                let contrib_b = (kk * e[m - 1]) >> K_FRAC_BITS;
                new_state[m] = prev_b - contrib_b;
            }
        }

        self.state = new_state;
        e[order]
    }

    /// Synthesis (decoder) direction: given the final-stage residual, reconstructs the original
    /// sample and advances the lattice state identically to how [`Self::analyze`] would have for
    /// the same sample (spec §4.E round-trip requirement).
    pub fn synthesize(&mut self, k: &[i32], residual: i64) -> i32 {
        let order = k.len();
        debug_assert_eq!(order, self.state.len());

        let mut e = vec![0i64; order + 1];
        e[order] = residual;

        for m in (1..=order).rev() {
            let j = m - 1;
            let kk = i64::from(k[j]);
            let prev_b = self.state[j];
            let contrib_e = (kk * prev_b) >> K_FRAC_BITS;
            e[m - 1] = e[m] + contrib_e;
        }

        let mut new_state = vec![0i64; order];
        if order > 0 {
            new_state[0] = e[0];
        }
        for m in 1..order {
            let j = m - 1;
            let kk = i64::from(k[j]);
            let contrib_b = (kk * e[m - 1]) >> K_FRAC_BITS;
            new_state[m] = self.state[j] - contrib_b;
        }

        self.state = new_state;
        e[0] as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(order: usize, k: &[i32], samples: &[i32]) {
        let mut enc = LatticePredictor::new(order);
        let residuals: Vec<i64> = samples.iter().map(|&s| enc.analyze(k, s)).collect();

        let mut dec = LatticePredictor::new(order);
        let decoded: Vec<i32> = residuals.iter().map(|&r| dec.synthesize(k, r)).collect();

        assert_eq!(decoded, samples);
    }

    #[test]
    fn verify_order_zero_is_identity() {
        roundtrip(0, &[], &[0, 1, -1, 8_388_607, -8_388_608, 42, -42]);
    }

    #[test]
    fn verify_order_one_roundtrip() {
        roundtrip(1, &[400], &[0, 100, 150, 151, -200, -199, 5000, -5000, 0, 0]);
    }

    #[test]
    fn verify_higher_order_roundtrip() {
        let k = [300, -150, 64, -512, 511];
        let samples: Vec<i32> = (0..64).map(|i| ((i * i) % 4001) - 2000).collect();
        roundtrip(5, &k, &samples);
    }

    #[test]
    fn verify_silence_roundtrips_to_silence() {
        roundtrip(3, &[100, -50, 25], &[0; 16]);
    }

    #[test]
    fn verify_reset_clears_state() {
        let k = [200];
        let mut pred = LatticePredictor::new(1);
        pred.analyze(&k, 12345);
        pred.reset();
        let mut fresh = LatticePredictor::new(1);
        assert_eq!(pred.analyze(&k, 777), fresh.analyze(&k, 777));
    }
}
