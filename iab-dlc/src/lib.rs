// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `iab-dlc` implements the ST 2098-2 DLC (Dynamic Lossless Codec): a lattice-form predictor over
//! one or two full-rate layers, with Rice- or PCM-coded residuals, operating on the opaque byte
//! payload an `AudioDataDlc` element carries. This crate has no dependency on `iab-format`; the
//! frame tree hands it payload bytes and gets samples back, and nothing more.

pub mod codec;
pub mod layer;
pub mod predictor;
pub mod residual;

pub use codec::{decode, decode_48k_base_layer, encode};
