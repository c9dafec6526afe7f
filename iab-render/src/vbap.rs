// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector-Base Amplitude Panning: patch lookup, gain computation, zone gain shaping and snap
//! (spec §4.G).

use std::collections::HashMap;

use iab_format::gain::ZoneGain9;
use iab_format::pan::{Position, Snap, Spread};

use crate::config::RendererConfig;
use crate::zone;

/// Number of azimuth samples used to approximate the "circumferential ring at the object's
/// elevation" a 1-D spread value softens into (spec §4.G "Spread").
const SPREAD_RING_SAMPLES: usize = 16;

/// Number of sample directions used to approximate the full-sphere isotropic basis a 3-D
/// (`HiRes3D`) spread value softens into.
const SPREAD_SPHERE_SAMPLES: usize = 24;

/// Tolerance for treating a small negative candidate gain as "covers the direction" (spec §4.G
/// step 2's "within a tolerance").
const COVERAGE_EPS: f32 = 1e-4;

/// Per-speaker VBAP gains, expressed as `(speaker_index, gain)` pairs for exactly the three
/// vertices of the chosen patch. Empty if the configuration has no patches at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchGains {
    pub entries: Vec<(usize, f32)>,
}

/// Runs spec §4.G step 1–2: finds the patch containing `direction`, or falls back to the patch
/// with the largest minimum gain, clamping negatives to zero. Ties in minimum gain are broken by
/// patch declaration order (spec §4.G "Edge policy").
pub fn patch_gains(config: &RendererConfig, direction: [f32; 3]) -> PatchGains {
    if config.patches.is_empty() {
        return PatchGains::default();
    }

    let mut best: Option<(usize, [f32; 3], f32)> = None;
    for (patch_idx, patch) in config.patches.iter().enumerate() {
        let g = patch.inverse.mul_vec(direction);
        let min_g = g[0].min(g[1]).min(g[2]);

        if min_g >= -COVERAGE_EPS {
            return PatchGains { entries: zip_clamped(patch.speakers, g) };
        }

        if best.as_ref().map(|&(_, _, best_min)| min_g > best_min).unwrap_or(true) {
            best = Some((patch_idx, g, min_g));
        }
    }

    let (patch_idx, g, _) = best.expect("config.patches non-empty");
    PatchGains { entries: zip_clamped(config.patches[patch_idx].speakers, g) }
}

fn zip_clamped(speakers: [usize; 3], gains: [f32; 3]) -> Vec<(usize, f32)> {
    speakers.iter().zip(gains.iter()).map(|(&s, &g)| (s, g.max(0.0))).collect()
}

/// Multiplies each speaker's candidate gain by its zone's gain value (spec §4.G "Zone gain
/// extension"), applied before normalisation. A `None` zone (no zone-gain sub-element present)
/// passes every gain through unchanged.
pub fn apply_zone_gain(config: &RendererConfig, gains: &mut PatchGains, zone_gain: Option<&ZoneGain9>) {
    let Some(zone_gain) = zone_gain
    else {
        return;
    };
    for (speaker_idx, gain) in gains.entries.iter_mut() {
        let z = zone::zone_for_speaker(&config.speakers[*speaker_idx]);
        *gain *= zone_gain.gains[z].value();
    }
}

/// Normalises `gains` so the sum of squares is 1 (spec §4.G step 3, energy-preserving pan law).
/// A silent direction (every gain zero, e.g. a fully-zeroed zone gain set) is left at all zeros.
pub fn normalize_energy(gains: &mut PatchGains) {
    let sum_sq: f32 = gains.entries.iter().map(|&(_, g)| g * g).sum();
    if sum_sq <= 0.0 {
        return;
    }
    let norm = sum_sq.sqrt();
    for (_, g) in gains.entries.iter_mut() {
        *g /= norm;
    }
}

/// Finds the configured speaker nearest `direction` and the arc length (radians) to it (spec
/// §4.G "Snap").
pub fn nearest_speaker(config: &RendererConfig, direction: [f32; 3]) -> Option<(usize, f32)> {
    config
        .speakers
        .iter()
        .enumerate()
        .map(|(idx, speaker)| (idx, arc_length(direction, speaker.direction)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn arc_length(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
    dot.acos()
}

/// Runs patch lookup, zone gain shaping and energy normalisation for a single direction,
/// returning a unit-energy `(speaker_index, gain)` vector. The shared inner step of both the
/// plain point-source pan and every spread sample.
fn point_source_gains(config: &RendererConfig, direction: [f32; 3], zone_gain: Option<&ZoneGain9>) -> Vec<(usize, f32)> {
    let mut gains = patch_gains(config, direction);
    apply_zone_gain(config, &mut gains, zone_gain);
    normalize_energy(&mut gains);
    gains.entries
}

/// Samples `count` directions evenly around the full azimuth circle at the same elevation as
/// `direction`, approximating spec §4.G's "circumferential ring at the object's elevation" that
/// a 1-D spread value softens the point source into.
fn azimuth_ring_samples(direction: [f32; 3], count: usize) -> Vec<[f32; 3]> {
    let elevation = direction[2].clamp(-1.0, 1.0).asin();
    let azimuth0 = direction[0].atan2(direction[1]);
    let phi_cos = elevation.cos();
    let phi_sin = elevation.sin();
    (0..count)
        .map(|k| {
            let theta = azimuth0 + std::f32::consts::TAU * (k as f32) / (count as f32);
            [theta.sin() * phi_cos, theta.cos() * phi_cos, phi_sin]
        })
        .collect()
}

/// Samples `count` directions roughly evenly over the whole sphere (a Fibonacci lattice),
/// approximating spec §4.G's "3-axis ellipsoid" in the fully isotropic limit a 3-D spread value
/// softens the point source towards.
fn fibonacci_sphere_samples(count: usize) -> Vec<[f32; 3]> {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let denom = (count.saturating_sub(1)).max(1) as f32;
    (0..count)
        .map(|i| {
            let z = 1.0 - 2.0 * (i as f32) / denom;
            let radius = (1.0 - z * z).max(0.0).sqrt();
            let theta = golden_angle * (i as f32);
            [theta.cos() * radius, theta.sin() * radius, z]
        })
        .collect()
}

/// Averages the energy (sum of squares) of `point_source_gains` over every sample direction, the
/// isotropic basis spec §4.G's spread softening mixes towards. Each sample is independently a
/// unit-energy vector, so the average is unit-energy too regardless of how the samples' patches
/// overlap.
fn spread_basis_gains(config: &RendererConfig, spread_directions: &[[f32; 3]], zone_gain: Option<&ZoneGain9>) -> HashMap<usize, f32> {
    let mut sum_sq: HashMap<usize, f32> = HashMap::new();
    for &sample in spread_directions {
        for (speaker_idx, gain) in point_source_gains(config, sample, zone_gain) {
            *sum_sq.entry(speaker_idx).or_insert(0.0) += gain * gain;
        }
    }
    let n = spread_directions.len().max(1) as f32;
    for gain_sq in sum_sq.values_mut() {
        *gain_sq /= n;
    }
    sum_sq
}

/// Mixes two unit-energy gain vectors by the ratio `t` (0 keeps `point` unchanged, 1 replaces it
/// with `basis`), summing per-speaker energy rather than amplitude so the combination stays on
/// the energy-preserving pan law (spec §4.G step 3).
fn mix_energy(point: Vec<(usize, f32)>, basis: HashMap<usize, f32>, t: f32) -> Vec<(usize, f32)> {
    let mut sum_sq: HashMap<usize, f32> = HashMap::new();
    for (speaker_idx, gain) in point {
        *sum_sq.entry(speaker_idx).or_insert(0.0) += (1.0 - t) * gain * gain;
    }
    for (speaker_idx, gain_sq) in basis {
        *sum_sq.entry(speaker_idx).or_insert(0.0) += t * gain_sq;
    }
    sum_sq.into_iter().map(|(speaker_idx, gain_sq)| (speaker_idx, gain_sq.sqrt())).collect()
}

/// The full spec §4.G pipeline for one pan state: snap override, else VBAP patch lookup + zone
/// gain + energy normalisation, softened by `spread` (spec §4.G "Spread"). Returns
/// `(speaker_index, spatial_gain)` pairs; the caller (the render pipeline) still has to multiply
/// in the pan state's own (non-spatial) `gain` value.
///
/// Spread is realised as an energy-preserving mix between the plain point-source gain vector and
/// an isotropic basis: a ring of directions circling the object's elevation for the 1-D modes,
/// or a full-sphere sample set for `HiRes3D`, matching the spec's "ring"/"ellipsoid" language in
/// the fully-spread (`mix_ratio() == 1`) limit. `HiRes3D`'s three axis values combine into that
/// single mix ratio via [`Spread::mix_ratio`]; snap always takes priority and ignores spread.
pub fn resolve_pan_gains(config: &RendererConfig, position: Position, snap: Snap, zone_gain: Option<&ZoneGain9>, spread: Spread) -> Vec<(usize, f32)> {
    let direction = position.to_unit_direction();
    let direction = [direction.0, direction.1, direction.2];

    if snap.present {
        if let Some((speaker_idx, arc)) = nearest_speaker(config, direction) {
            if arc <= snap.tolerance_radians() {
                return vec![(speaker_idx, 1.0)];
            }
        }
    }

    let point = point_source_gains(config, direction, zone_gain);

    let t = spread.mix_ratio().clamp(0.0, 1.0);
    if t <= 0.0 {
        return point;
    }

    let samples = match spread {
        Spread::LowRes1D(_) | Spread::HiRes1D(_) => azimuth_ring_samples(direction, SPREAD_RING_SAMPLES),
        Spread::HiRes3D { .. } => fibonacci_sphere_samples(SPREAD_SPHERE_SAMPLES),
    };
    let basis = spread_basis_gains(config, &samples, zone_gain);
    mix_energy(point, basis, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    // A purely horizontal ring of speakers gives every 3-speaker patch a coplanar (singular)
    // position matrix, since the z row of the matrix is all zero. Real VBAP patch sets pair floor
    // speakers with a height layer to get non-degenerate triangles, so this fixture does too: L/C/R
    // and LS/RS sit on the horizontal plane, Lh/Rh sit 45 degrees up front-left/front-right.
    fn dome_rig() -> RendererConfig {
        let mut b = ConfigBuilder::new();
        b.add_speaker("L", Some(0), -30.0, 0.0, None).unwrap();
        b.add_speaker("C", Some(1), 0.0, 0.0, None).unwrap();
        b.add_speaker("R", Some(2), 30.0, 0.0, None).unwrap();
        b.add_speaker("LS", Some(3), -110.0, 0.0, None).unwrap();
        b.add_speaker("RS", Some(4), 110.0, 0.0, None).unwrap();
        b.add_speaker("Lh", Some(5), -45.0, 45.0, None).unwrap();
        b.add_speaker("Rh", Some(6), 45.0, 45.0, None).unwrap();
        b.add_patch("L", "C", "Lh").unwrap();
        b.add_patch("C", "R", "Rh").unwrap();
        b.add_patch("L", "Lh", "LS").unwrap();
        b.add_patch("R", "Rh", "RS").unwrap();
        b.build().unwrap()
    }

    #[test]
    fn verify_direction_at_speaker_is_unity_gain() {
        let config = dome_rig();
        let c = config.speaker_by_name("C").unwrap();
        let direction = config.speakers[c].direction;
        let mut gains = patch_gains(&config, direction);
        normalize_energy(&mut gains);
        let g_c = gains.entries.iter().find(|&&(idx, _)| idx == c).map(|&(_, g)| g).unwrap_or(0.0);
        assert!((g_c - 1.0).abs() < 1e-3, "gain at C was {g_c}");
    }

    #[test]
    fn verify_energy_normalisation() {
        let config = dome_rig();
        // Centroid of patch (L, C, Lh)'s vertex directions: lands inside that patch, so this
        // exercises the covering branch rather than the fallback branch.
        let l = config.speakers[config.speaker_by_name("L").unwrap()].direction;
        let c = config.speakers[config.speaker_by_name("C").unwrap()].direction;
        let lh = config.speakers[config.speaker_by_name("Lh").unwrap()].direction;
        let sum = [l[0] + c[0] + lh[0], l[1] + c[1] + lh[1], l[2] + c[2] + lh[2]];
        let norm = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
        let direction = [sum[0] / norm, sum[1] / norm, sum[2] / norm];

        let mut gains = patch_gains(&config, direction);
        normalize_energy(&mut gains);
        let sum_sq: f32 = gains.entries.iter().map(|&(_, g)| g * g).sum();
        assert!((sum_sq - 1.0).abs() < 1e-3);
    }

    #[test]
    fn verify_zone_gain_silences_a_speaker() {
        let config = dome_rig();
        let c = config.speaker_by_name("C").unwrap();
        let direction = config.speakers[c].direction;
        let mut gains = patch_gains(&config, direction);

        let mut zone_gain = ZoneGain9::UNITY;
        let z = crate::zone::zone_for_speaker(&config.speakers[c]);
        zone_gain.gains[z] = iab_format::gain::Gain::SILENCE;

        apply_zone_gain(&config, &mut gains, Some(&zone_gain));
        let g_c = gains.entries.iter().find(|&&(idx, _)| idx == c).map(|&(_, g)| g).unwrap();
        assert_eq!(g_c, 0.0);
    }

    #[test]
    fn verify_snap_routes_to_nearest_speaker() {
        let config = dome_rig();
        let l = config.speaker_by_name("L").unwrap();
        // L sits at azimuth -30 deg, elevation 0: unit direction (-0.5, sqrt(3)/2, 0). Pick a
        // unit-cube position whose (2x-1, 2y-1, 2z-1) remap lands exactly on that direction.
        let position = Position::new(0.25, (1.0 + 3.0_f32.sqrt() / 2.0) / 2.0, 0.5);
        let snap = Snap { present: true, tolerance_code: Some(4095) };
        let result = resolve_pan_gains(&config, position, snap, None, Spread::NONE);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, l);
        assert_eq!(result[0].1, 1.0);
    }

    #[test]
    fn verify_fallback_when_no_patch_covers_direction() {
        let config = dome_rig();
        // Straight down: no patch in this dome rig covers it, so fallback kicks in.
        let direction = [0.0, 0.0, -1.0];
        let gains = patch_gains(&config, direction);
        assert_eq!(gains.entries.len(), 3);
        assert!(gains.entries.iter().all(|&(_, g)| g >= 0.0));
    }

    fn sum_sq(gains: &[(usize, f32)]) -> f32 {
        gains.iter().map(|&(_, g)| g * g).sum()
    }

    #[test]
    fn verify_zero_spread_matches_point_source() {
        let config = dome_rig();
        let c = config.speaker_by_name("C").unwrap();
        let position = Position::CENTER;
        let point = resolve_pan_gains(&config, position, Snap::NONE, None, Spread::NONE);
        let spread = resolve_pan_gains(&config, position, Snap::NONE, None, Spread::LowRes1D(0.0));
        let g_point = point.iter().find(|&&(idx, _)| idx == c).map(|&(_, g)| g).unwrap_or(0.0);
        let g_spread = spread.iter().find(|&&(idx, _)| idx == c).map(|&(_, g)| g).unwrap_or(0.0);
        assert!((g_point - g_spread).abs() < 1e-5);
    }

    #[test]
    fn verify_full_spread_stays_energy_normalised_and_differs_from_point() {
        let config = dome_rig();
        let c = config.speaker_by_name("C").unwrap();
        let position = Position::CENTER;
        let point = resolve_pan_gains(&config, position, Snap::NONE, None, Spread::NONE);
        let spread = resolve_pan_gains(&config, position, Snap::NONE, None, Spread::HiRes1D(1.0));

        assert!((sum_sq(&spread) - 1.0).abs() < 1e-3, "spread gains were not energy-normalised: {spread:?}");

        let g_point = point.iter().find(|&&(idx, _)| idx == c).map(|&(_, g)| g).unwrap_or(0.0);
        let g_spread = spread.iter().find(|&&(idx, _)| idx == c).map(|&(_, g)| g).unwrap_or(0.0);
        assert!(g_spread < g_point, "full ring spread should pull energy away from the point source speaker");
    }

    #[test]
    fn verify_hires_3d_spread_is_energy_normalised() {
        let config = dome_rig();
        let position = Position::CENTER;
        let spread = resolve_pan_gains(&config, position, Snap::NONE, None, Spread::HiRes3D { x: 0.6, y: 0.3, z: 0.9 });
        assert!((sum_sq(&spread) - 1.0).abs() < 1e-3, "spread gains were not energy-normalised: {spread:?}");
    }

    #[test]
    fn verify_snap_ignores_spread() {
        let config = dome_rig();
        let l = config.speaker_by_name("L").unwrap();
        let position = Position::new(0.25, (1.0 + 3.0_f32.sqrt() / 2.0) / 2.0, 0.5);
        let snap = Snap { present: true, tolerance_code: Some(4095) };
        let result = resolve_pan_gains(&config, position, snap, None, Spread::HiRes1D(1.0));
        assert_eq!(result, vec![(l, 1.0)]);
    }
}
