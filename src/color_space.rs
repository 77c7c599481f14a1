/*
 * // Copyright (c) Radzivon Bartoshyk 10/2026. All rights reserved.
 * //
 * // Redistribution and use in source and binary forms, with or without modification,
 * // are permitted provided that the following conditions are met:
 * //
 * // 1.  Redistributions of source code must retain the above copyright notice, this
 * // list of conditions and the following disclaimer.
 * //
 * // 2.  Redistributions in binary form must reproduce the above copyright notice,
 * // this list of conditions and the following disclaimer in the documentation
 * // and/or other materials provided with the distribution.
 * //
 * // 3.  Neither the name of the copyright holder nor the names of its
 * // contributors may be used to endorse or promote products derived from
 * // this software without specific prior written permission.
 * //
 * // THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
 * // AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
 * // IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
 * // DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
 * // FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
 * // DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
 * // SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
 * // CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
 * // OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
 * // OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
 */
use moxcms::{
    CicpColorPrimaries, ColorProfile, DataColorSpace, ProfileText, TransferCharacteristics,
};
use std::fmt::{Display, Formatter};

/// Canonical color space names an image may be tagged with
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum ColorSpaceName {
    Srgb,
    LinearSrgb,
    ExtendedLinearSrgb,
    DisplayP3,
    ExtendedLinearDisplayP3,
    Itur2020,
    ExtendedLinearItur2020,
    Itur2100Pq,
    Itur2100Hlg,
    GenericGray,
    LinearGray,
}

impl ColorSpaceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorSpaceName::Srgb => "sRGB",
            ColorSpaceName::LinearSrgb => "LinearSRGB",
            ColorSpaceName::ExtendedLinearSrgb => "ExtendedLinearSRGB",
            ColorSpaceName::DisplayP3 => "DisplayP3",
            ColorSpaceName::ExtendedLinearDisplayP3 => "ExtendedLinearDisplayP3",
            ColorSpaceName::Itur2020 => "ITUR_2020",
            ColorSpaceName::ExtendedLinearItur2020 => "ExtendedLinearITUR_2020",
            ColorSpaceName::Itur2100Pq => "ITUR_2100_PQ",
            ColorSpaceName::Itur2100Hlg => "ITUR_2100_HLG",
            ColorSpaceName::GenericGray => "GenericGrayGamma2_2",
            ColorSpaceName::LinearGray => "LinearGray",
        }
    }

    /// Reverse of [`ColorSpaceName::profile_name`] for the descriptions common ICC profiles carry
    pub fn from_profile_name(description: &str) -> Option<ColorSpaceName> {
        match description.trim() {
            "sRGB IEC61966-2.1" | "sRGB" | "sRGB built-in" => Some(ColorSpaceName::Srgb),
            "Display P3" => Some(ColorSpaceName::DisplayP3),
            "Rec. ITU-R BT.2020" | "Rec. ITU-R BT.2020-1" | "ITU-R BT.2020" => {
                Some(ColorSpaceName::Itur2020)
            }
            "Rec. ITU-R BT.2100 PQ" => Some(ColorSpaceName::Itur2100Pq),
            "Rec. ITU-R BT.2100 HLG" => Some(ColorSpaceName::Itur2100Hlg),
            "Generic Gray Gamma 2.2 Profile" => Some(ColorSpaceName::GenericGray),
            _ => None,
        }
    }

    /// Human readable profile name, the value metadata readers report as `ProfileName`
    pub fn profile_name(&self) -> &'static str {
        match self {
            ColorSpaceName::Srgb => "sRGB IEC61966-2.1",
            ColorSpaceName::LinearSrgb | ColorSpaceName::ExtendedLinearSrgb => "Linear sRGB",
            ColorSpaceName::DisplayP3 => "Display P3",
            ColorSpaceName::ExtendedLinearDisplayP3 => "Linear Display P3",
            ColorSpaceName::Itur2020 => "Rec. ITU-R BT.2020",
            ColorSpaceName::ExtendedLinearItur2020 => "Linear Rec. ITU-R BT.2020",
            ColorSpaceName::Itur2100Pq => "Rec. ITU-R BT.2100 PQ",
            ColorSpaceName::Itur2100Hlg => "Rec. ITU-R BT.2100 HLG",
            ColorSpaceName::GenericGray => "Generic Gray Gamma 2.2 Profile",
            ColorSpaceName::LinearGray => "Linear Gray",
        }
    }
}

impl Display for ColorSpaceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color space tag of an image.
///
/// All fields are optional: a gain map carries no color at all and plenty of
/// containers only describe part of their colorimetry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorSpace {
    pub name: Option<ColorSpaceName>,
    pub transfer: Option<TransferCharacteristics>,
    pub primaries: Option<CicpColorPrimaries>,
    /// Free form description, usually the ICC `desc` text
    pub description: Option<String>,
}

impl ColorSpace {
    /// Neutral color space, nothing is known about the values
    pub fn untagged() -> ColorSpace {
        ColorSpace::default()
    }

    pub fn is_untagged(&self) -> bool {
        self.name.is_none()
            && self.transfer.is_none()
            && self.primaries.is_none()
            && self.description.is_none()
    }

    /// Builds a color space from CICP code points.
    ///
    /// `extended_range` marks float storage where values above 1.0 are meaningful.
    /// Reserved and unspecified code points are treated as absent.
    pub fn from_cicp(primaries: u16, transfer: u16, extended_range: bool) -> ColorSpace {
        let primaries = u8::try_from(primaries)
            .ok()
            .and_then(|v| CicpColorPrimaries::try_from(v).ok())
            .filter(|v| {
                !matches!(
                    v,
                    CicpColorPrimaries::Reserved | CicpColorPrimaries::Unspecified
                )
            });
        let transfer = u8::try_from(transfer)
            .ok()
            .and_then(|v| TransferCharacteristics::try_from(v).ok())
            .filter(|v| {
                !matches!(
                    v,
                    TransferCharacteristics::Reserved | TransferCharacteristics::Unspecified
                )
            });
        ColorSpace::from_typed_cicp(primaries, transfer, extended_range)
    }

    pub fn from_typed_cicp(
        primaries: Option<CicpColorPrimaries>,
        transfer: Option<TransferCharacteristics>,
        extended_range: bool,
    ) -> ColorSpace {
        let name = match (primaries, transfer) {
            (Some(CicpColorPrimaries::Bt2020), Some(TransferCharacteristics::Smpte2084)) => {
                Some(ColorSpaceName::Itur2100Pq)
            }
            (Some(CicpColorPrimaries::Bt2020), Some(TransferCharacteristics::Hlg)) => {
                Some(ColorSpaceName::Itur2100Hlg)
            }
            (Some(p), Some(TransferCharacteristics::Linear)) => {
                Some(linear_name(p, extended_range))
            }
            (Some(CicpColorPrimaries::Bt709), Some(TransferCharacteristics::Srgb)) => {
                Some(ColorSpaceName::Srgb)
            }
            (Some(CicpColorPrimaries::Smpte432), Some(TransferCharacteristics::Srgb)) => {
                Some(ColorSpaceName::DisplayP3)
            }
            (
                Some(CicpColorPrimaries::Bt2020),
                Some(
                    TransferCharacteristics::Bt709
                    | TransferCharacteristics::Bt202010bit
                    | TransferCharacteristics::Bt202012bit,
                ),
            ) => Some(ColorSpaceName::Itur2020),
            _ => None,
        };
        ColorSpace {
            name,
            transfer,
            primaries,
            description: None,
        }
    }

    /// Resolves a parsed ICC profile.
    ///
    /// The `cicp` tag wins, then well known description texts. Gray profiles
    /// nobody named become generic gray.
    pub fn from_icc(profile: &ColorProfile, extended_range: bool) -> ColorSpace {
        let description = icc_description(profile);
        let mut color_space = match profile.cicp.as_ref() {
            Some(cicp) => ColorSpace::from_typed_cicp(
                Some(cicp.color_primaries),
                Some(cicp.transfer_characteristics),
                extended_range,
            ),
            None => description
                .as_deref()
                .and_then(ColorSpaceName::from_profile_name)
                .map(ColorSpace::named)
                .unwrap_or_default(),
        };
        if color_space.name.is_none() && profile.color_space == DataColorSpace::Gray {
            color_space.name = Some(ColorSpaceName::GenericGray);
        }
        color_space.description = description;
        color_space
    }

    pub fn named(name: ColorSpaceName) -> ColorSpace {
        let (primaries, transfer) = match name {
            ColorSpaceName::Srgb => (
                Some(CicpColorPrimaries::Bt709),
                Some(TransferCharacteristics::Srgb),
            ),
            ColorSpaceName::LinearSrgb | ColorSpaceName::ExtendedLinearSrgb => (
                Some(CicpColorPrimaries::Bt709),
                Some(TransferCharacteristics::Linear),
            ),
            ColorSpaceName::DisplayP3 => (
                Some(CicpColorPrimaries::Smpte432),
                Some(TransferCharacteristics::Srgb),
            ),
            ColorSpaceName::ExtendedLinearDisplayP3 => (
                Some(CicpColorPrimaries::Smpte432),
                Some(TransferCharacteristics::Linear),
            ),
            ColorSpaceName::Itur2020 => (
                Some(CicpColorPrimaries::Bt2020),
                Some(TransferCharacteristics::Bt709),
            ),
            ColorSpaceName::ExtendedLinearItur2020 => (
                Some(CicpColorPrimaries::Bt2020),
                Some(TransferCharacteristics::Linear),
            ),
            ColorSpaceName::Itur2100Pq => (
                Some(CicpColorPrimaries::Bt2020),
                Some(TransferCharacteristics::Smpte2084),
            ),
            ColorSpaceName::Itur2100Hlg => (
                Some(CicpColorPrimaries::Bt2020),
                Some(TransferCharacteristics::Hlg),
            ),
            ColorSpaceName::GenericGray => (None, None),
            ColorSpaceName::LinearGray => (None, Some(TransferCharacteristics::Linear)),
        };
        ColorSpace {
            name: Some(name),
            transfer,
            primaries,
            description: None,
        }
    }

    /// Name reported as `ProfileName`, description first
    pub fn profile_name(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| self.name.map(|v| v.profile_name()))
    }
}

fn linear_name(primaries: CicpColorPrimaries, extended_range: bool) -> ColorSpaceName {
    match (primaries, extended_range) {
        (CicpColorPrimaries::Smpte432, _) => ColorSpaceName::ExtendedLinearDisplayP3,
        (CicpColorPrimaries::Bt2020, _) => ColorSpaceName::ExtendedLinearItur2020,
        (_, true) => ColorSpaceName::ExtendedLinearSrgb,
        (_, false) => ColorSpaceName::LinearSrgb,
    }
}

/// Profile `desc` text, English first for localized descriptions
pub(crate) fn icc_description(profile: &ColorProfile) -> Option<String> {
    let text = match profile.description.as_ref()? {
        ProfileText::PlainString(v) => v.as_str(),
        ProfileText::Localizable(v) => v
            .iter()
            .find(|s| s.language == "en")
            .or_else(|| v.first())
            .map(|s| s.value.as_str())?,
        ProfileText::Description(v) if !v.ascii_string.trim().is_empty() => v.ascii_string.as_str(),
        ProfileText::Description(v) => v.unicode_string.as_str(),
    };
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    (!text.is_empty()).then(|| text.to_string())
}
