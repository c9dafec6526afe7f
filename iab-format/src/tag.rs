// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element-ID constants for the top-level wire framing (spec §4.D) and for the frame's direct
//! sub-elements. IDs are Plex-8 coded wherever they appear on the wire (spec §4.B).

/// Wraps the opaque preamble block that precedes every IA sub-frame.
pub const PREAMBLE: u32 = 0x0001;
/// Wraps the IA sub-frame (the element tree rooted at the Frame element).
pub const IA_FRAME: u32 = 0x0002;
/// Trailing integrity word, present only on profiles that emit a frame CRC (spec §4.D).
pub const FRAME_CRC: u32 = 0x0003;

/// The Frame element itself: always the first child inside an IA sub-frame (spec §4.D).
pub const FRAME: u32 = 0x0010;
pub const BED_DEFINITION: u32 = 0x0011;
pub const BED_REMAP: u32 = 0x0012;
pub const OBJECT_DEFINITION: u32 = 0x0013;
pub const AUDIO_DATA_DLC: u32 = 0x0014;
pub const AUDIO_DATA_PCM: u32 = 0x0015;
pub const AUTHORING_TOOL_INFO: u32 = 0x0016;
pub const USER_DATA: u32 = 0x0017;

/// `true` if `id` is one this implementation recognises as a direct Frame sub-element.
pub fn is_known_frame_sub_element(id: u32) -> bool {
    matches!(
        id,
        BED_DEFINITION | OBJECT_DEFINITION | AUDIO_DATA_DLC | AUDIO_DATA_PCM | AUTHORING_TOOL_INFO | USER_DATA
    )
}

/// `true` if `id` is one this implementation recognises as a child of a Bed Definition (nested
/// bed remaps and further, multi-layout bed definitions; spec §3 "Bed Definition").
pub fn is_known_bed_sub_element(id: u32) -> bool {
    matches!(id, BED_REMAP | BED_DEFINITION)
}
