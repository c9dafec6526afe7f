// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `util` module is a repository of small, widely used helper functions that do not belong
//! to any single top-level module.

pub mod bits {
    //! Bit manipulation helpers.

    /// Sign extends an arbitrary, 32-bit or less, signed two's complement integer stored within a
    /// u32 to a full width i32.
    #[inline(always)]
    pub fn sign_extend_leq32_to_i32(value: u32, width: u32) -> i32 {
        debug_assert!(width > 0 && width <= 32);
        (value.wrapping_shl(32 - width) as i32).wrapping_shr(32 - width)
    }

    /// Sign extends an arbitrary, 64-bit or less, signed two's complement integer stored within a
    /// u64 to a full width i64.
    #[inline(always)]
    pub fn sign_extend_leq64_to_i64(value: u64, width: u32) -> i64 {
        debug_assert!(width > 0 && width <= 64);
        (value.wrapping_shl(64 - width) as i64).wrapping_shr(64 - width)
    }

    #[test]
    fn verify_sign_extend() {
        assert_eq!(sign_extend_leq32_to_i32(0b1111_1111, 8), -1);
        assert_eq!(sign_extend_leq32_to_i32(0b0111_1111, 8), 127);
        assert_eq!(sign_extend_leq32_to_i32(0b10, 2), -2);
    }
}

pub mod clamp {
    //! Numeric clamping helpers.

    /// Clamps `val` to the inclusive `[lo, hi]` range.
    #[inline]
    pub fn clamp_f32(val: f32, lo: f32, hi: f32) -> f32 {
        if val < lo {
            lo
        }
        else if val > hi {
            hi
        }
        else {
            val
        }
    }

    #[test]
    fn verify_clamp_f32() {
        assert_eq!(clamp_f32(2.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp_f32(-2.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp_f32(0.3, -1.0, 1.0), 0.3);
    }
}
