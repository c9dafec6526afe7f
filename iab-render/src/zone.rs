// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 9-zone speaker partition table (spec §4.G "Zone gain extension").
//!
//! Spec §9's open question notes that the exact zone → speaker partition is referenced, not
//! reproduced, by the source material this was distilled from. Absent that table, this partition
//! follows the shape object-based formats typically use for a 9-zone control set: eight 45°
//! horizontal sectors centred on front/front-right/right/rear-right/rear/rear-left/left/front-left,
//! plus a ninth zone for anything sufficiently overhead. Any configured speaker falls into exactly
//! one zone by its azimuth/elevation.

use crate::config::Speaker;

/// Elevation, in degrees, above which a speaker is considered part of the overhead zone rather
/// than one of the eight horizontal sectors.
const OVERHEAD_ELEVATION_DEG: f32 = 45.0;

/// Zone indices match [`crate::config::ZoneGain9`]'s (well, `iab_format::gain::ZoneGain9`'s)
/// `gains` array order: eight horizontal sectors starting at front and proceeding clockwise, then
/// the overhead zone last.
pub const ZONE_FRONT: usize = 0;
pub const ZONE_FRONT_RIGHT: usize = 1;
pub const ZONE_RIGHT: usize = 2;
pub const ZONE_REAR_RIGHT: usize = 3;
pub const ZONE_REAR: usize = 4;
pub const ZONE_REAR_LEFT: usize = 5;
pub const ZONE_LEFT: usize = 6;
pub const ZONE_FRONT_LEFT: usize = 7;
pub const ZONE_OVERHEAD: usize = 8;

/// Maps a speaker's azimuth/elevation to one of the nine zones.
pub fn zone_for_speaker(speaker: &Speaker) -> usize {
    zone_for_az_el(speaker.azimuth_deg, speaker.elevation_deg)
}

fn zone_for_az_el(azimuth_deg: f32, elevation_deg: f32) -> usize {
    if elevation_deg.abs() >= OVERHEAD_ELEVATION_DEG {
        return ZONE_OVERHEAD;
    }

    // Normalise into (-180, 180], then bucket into eight 45°-wide sectors centred on 0, 45, 90,
    // ..., -45.
    let mut az = azimuth_deg % 360.0;
    if az > 180.0 {
        az -= 360.0;
    }
    else if az <= -180.0 {
        az += 360.0;
    }

    let sector = ((az + 22.5).div_euclid(45.0)) as i32;
    match sector.rem_euclid(8) {
        0 => ZONE_FRONT,
        1 => ZONE_FRONT_RIGHT,
        2 => ZONE_RIGHT,
        3 => ZONE_REAR_RIGHT,
        4 => ZONE_REAR,
        5 => ZONE_REAR_LEFT,
        6 => ZONE_LEFT,
        7 => ZONE_FRONT_LEFT,
        _ => unreachable!("rem_euclid(8) is always in 0..8"),
    }
}
