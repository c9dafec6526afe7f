// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The closed loudspeaker label table a Bed Channel's `channel_id` is drawn from (spec §3).

use iab_core::errors::{IabError, Result};

/// A loudspeaker label, as carried by a Bed Channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Left,
    Center,
    Right,
    LeftSurround,
    RightSurround,
    Lfe,
    LeftSideSurround,
    RightSideSurround,
    LeftRearSurround,
    RightRearSurround,
    TopSurround,
    LeftTopSurround,
    RightTopSurround,
    LeftHeightFront,
    RightHeightFront,
    CenterHeightFront,
}

impl ChannelId {
    /// Decodes the bed channel's 8-bit `channel_id` field. Unrecognised codes are reported as
    /// `None` so the caller can record [`iab_core::errors::WarningKind::UnknownChannelId`] and
    /// drop the channel, per spec §4.H failure semantics, rather than treating it as fatal.
    pub fn from_code(code: u32) -> Option<Self> {
        use ChannelId::*;
        Some(match code {
            0 => Left,
            1 => Center,
            2 => Right,
            3 => LeftSurround,
            4 => RightSurround,
            5 => Lfe,
            6 => LeftSideSurround,
            7 => RightSideSurround,
            8 => LeftRearSurround,
            9 => RightRearSurround,
            10 => TopSurround,
            11 => LeftTopSurround,
            12 => RightTopSurround,
            13 => LeftHeightFront,
            14 => RightHeightFront,
            15 => CenterHeightFront,
            _ => return None,
        })
    }

    pub fn to_code(self) -> u32 {
        use ChannelId::*;
        match self {
            Left => 0,
            Center => 1,
            Right => 2,
            LeftSurround => 3,
            RightSurround => 4,
            Lfe => 5,
            LeftSideSurround => 6,
            RightSideSurround => 7,
            LeftRearSurround => 8,
            RightRearSurround => 9,
            TopSurround => 10,
            LeftTopSurround => 11,
            RightTopSurround => 12,
            LeftHeightFront => 13,
            RightHeightFront => 14,
            CenterHeightFront => 15,
        }
    }

    /// The short speaker-label text used by the renderer configuration grammar (§6) and by
    /// `RenderSpeaker`'s name matching against a bed channel's label.
    pub fn label(self) -> &'static str {
        use ChannelId::*;
        match self {
            Left => "L",
            Center => "C",
            Right => "R",
            LeftSurround => "LS",
            RightSurround => "RS",
            Lfe => "LFE",
            LeftSideSurround => "LSS",
            RightSideSurround => "RSS",
            LeftRearSurround => "LRS",
            RightRearSurround => "RRS",
            TopSurround => "TS",
            LeftTopSurround => "LTS",
            RightTopSurround => "RTS",
            LeftHeightFront => "LHF",
            RightHeightFront => "RHF",
            CenterHeightFront => "CHF",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        use ChannelId::*;
        Some(match label {
            "L" => Left,
            "C" => Center,
            "R" => Right,
            "LS" => LeftSurround,
            "RS" => RightSurround,
            "LFE" => Lfe,
            "LSS" => LeftSideSurround,
            "RSS" => RightSideSurround,
            "LRS" => LeftRearSurround,
            "RRS" => RightRearSurround,
            "TS" => TopSurround,
            "LTS" => LeftTopSurround,
            "RTS" => RightTopSurround,
            "LHF" => LeftHeightFront,
            "RHF" => RightHeightFront,
            "CHF" => CenterHeightFront,
            _ => return None,
        })
    }

    pub fn is_lfe(self) -> bool {
        matches!(self, ChannelId::Lfe)
    }
}

/// The closed set of bed use-cases (spec §3); `NoUseCase` is the catch-all for a bed with a
/// non-standard channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    Config5_1,
    Config7_1Ds,
    Config9_1Oh,
    NoUseCase,
}

impl UseCase {
    pub fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            0 => UseCase::NoUseCase,
            1 => UseCase::Config5_1,
            2 => UseCase::Config7_1Ds,
            3 => UseCase::Config9_1Oh,
            _ => return Err(IabError::FrameStructure("unrecognised bed use-case code")),
        })
    }

    pub fn to_code(self) -> u32 {
        match self {
            UseCase::NoUseCase => 0,
            UseCase::Config5_1 => 1,
            UseCase::Config7_1Ds => 2,
            UseCase::Config9_1Oh => 3,
        }
    }

    /// Expected channel count for use-cases with a fixed layout, or `None` for `NoUseCase`,
    /// which spec §3 allows any channel set for.
    pub fn expected_channel_count(self) -> Option<usize> {
        match self {
            UseCase::Config5_1 => Some(6),
            UseCase::Config7_1Ds => Some(8),
            UseCase::Config9_1Oh => Some(10),
            UseCase::NoUseCase => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_channel_id_roundtrip() {
        for code in 0..16 {
            let id = ChannelId::from_code(code).unwrap();
            assert_eq!(id.to_code(), code);
            assert_eq!(ChannelId::from_label(id.label()), Some(id));
        }
    }

    #[test]
    fn verify_unknown_channel_code() {
        assert!(ChannelId::from_code(200).is_none());
    }

    #[test]
    fn verify_use_case_channel_counts() {
        assert_eq!(UseCase::Config5_1.expected_channel_count(), Some(6));
        assert_eq!(UseCase::NoUseCase.expected_channel_count(), None);
    }
}
