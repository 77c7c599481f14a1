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
//! Independent HDR heuristics.
//!
//! Each predicate looks at one signal and they can disagree on the same
//! image. Nothing here combines them into a single verdict.

use crate::color_space::{ColorSpace, ColorSpaceName};
use crate::gain_image::DecodedImage;
use crate::property::{keys, PropertyBag};
use crate::reader::ImageDescription;
use log::{debug, info};
use moxcms::TransferCharacteristics;
use std::sync::OnceLock;

/// Profile name a PQ image reports
pub const ITUR_2100_PQ_PROFILE_NAME: &str = "Rec. ITU-R BT.2100 PQ";

/// Color information the classifier reads from an image
pub trait ColorInfo {
    fn color_space(&self) -> &ColorSpace;

    fn bits_per_component(&self) -> Option<u8>;

    /// Native high dynamic range flag of the source, if it has one
    fn high_dynamic_range(&self) -> Option<bool>;
}

impl ColorInfo for DecodedImage {
    fn color_space(&self) -> &ColorSpace {
        &self.color_space
    }

    fn bits_per_component(&self) -> Option<u8> {
        Some(self.bits_per_component)
    }

    fn high_dynamic_range(&self) -> Option<bool> {
        self.high_dynamic_range
    }
}

impl ColorInfo for ImageDescription {
    fn color_space(&self) -> &ColorSpace {
        &self.color_space
    }

    fn bits_per_component(&self) -> Option<u8> {
        self.bits_per_component
    }

    fn high_dynamic_range(&self) -> Option<bool> {
        self.high_dynamic_range
    }
}

/// Optional classifier capabilities, fixed at build time
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Capabilities {
    /// The native HDR flag of a decoded image is consulted
    pub native_hdr_flag: bool,
    /// Transfer characteristics are checked for PQ and HLG
    pub itur_2100_tf: bool,
}

static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

impl Capabilities {
    /// Capabilities of this build, evaluated once
    pub fn detect() -> &'static Capabilities {
        CAPABILITIES.get_or_init(|| {
            let capabilities = Capabilities {
                native_hdr_flag: cfg!(feature = "native-hdr-flag"),
                itur_2100_tf: cfg!(feature = "itur-2100-tf"),
            };
            debug!("HDR classifier capabilities: {:?}", capabilities);
            capabilities
        })
    }

    /// Native flag of the image.
    ///
    /// `None` when the source exposes no flag, or when `native_hdr_flag` is off.
    pub fn is_image_hdr(&self, image: &impl ColorInfo) -> Option<bool> {
        if !self.native_hdr_flag {
            return None;
        }
        image.high_dynamic_range()
    }

    /// True for PQ or HLG transfer, always false when `itur_2100_tf` is off
    pub fn uses_itur_2100_tf(&self, color_space: &ColorSpace) -> bool {
        self.itur_2100_tf
            && matches!(
                color_space.transfer,
                Some(TransferCharacteristics::Smpte2084 | TransferCharacteristics::Hlg)
            )
    }

    pub fn is_image_hdr_v2(&self, image: &impl ColorInfo) -> bool {
        self.uses_itur_2100_tf(image.color_space())
    }

    /// Bit depth of the image, `None` when unknown.
    ///
    /// An HDR transfer or an extended range name returns early with the same
    /// value, so the result says nothing about HDR on its own.
    pub fn image_color_depth(&self, image: &impl ColorInfo) -> Option<u8> {
        let bits = image.bits_per_component()?;
        let color_space = image.color_space();
        if self.uses_itur_2100_tf(color_space) {
            debug!("Color depth {} of an ITU-R 2100 image", bits);
            return Some(bits);
        }
        if has_extended_range_name(color_space) {
            debug!("Color depth {} of an extended range image", bits);
            return Some(bits);
        }
        Some(bits)
    }
}

/// See [`Capabilities::is_image_hdr`]
pub fn is_image_hdr(image: &impl ColorInfo) -> Option<bool> {
    Capabilities::detect().is_image_hdr(image)
}

/// See [`Capabilities::uses_itur_2100_tf`]
pub fn uses_itur_2100_tf(color_space: &ColorSpace) -> bool {
    Capabilities::detect().uses_itur_2100_tf(color_space)
}

/// Transfer function check applied to an image
pub fn is_image_hdr_v2(image: &impl ColorInfo) -> bool {
    Capabilities::detect().is_image_hdr_v2(image)
}

/// See [`Capabilities::image_color_depth`]
pub fn image_color_depth(image: &impl ColorInfo) -> Option<u8> {
    Capabilities::detect().image_color_depth(image)
}

/// True when the color space name is an extended range or ITU-R 2100 space
pub fn has_extended_range_name(color_space: &ColorSpace) -> bool {
    matches!(
        color_space.name,
        Some(
            ColorSpaceName::ExtendedLinearSrgb
                | ColorSpaceName::ExtendedLinearDisplayP3
                | ColorSpaceName::ExtendedLinearItur2020
                | ColorSpaceName::Itur2100Pq
                | ColorSpaceName::Itur2100Hlg
        )
    )
}

/// Container metadata check.
///
/// True when `ProfileName` is the BT.2100 PQ profile or when `Headroom` is
/// exactly the integer 1. Headroom is usually a continuous value, so the
/// second rule is fragile, but it is kept as is. Missing keys count as false.
pub fn has_gain_map_hdr(properties: &PropertyBag) -> bool {
    if properties.get_str(keys::PROFILE_NAME) == Some(ITUR_2100_PQ_PROFILE_NAME) {
        return true;
    }
    properties.get_integer(keys::HEADROOM) == Some(1)
}

/// Every verdict side by side, for logging
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HdrReport {
    pub native_flag: Option<bool>,
    pub itur_2100_tf: bool,
    pub extended_range_name: bool,
    pub gain_map_metadata: bool,
    pub color_depth: Option<u8>,
}

impl HdrReport {
    pub fn collect(image: &impl ColorInfo, properties: &PropertyBag) -> HdrReport {
        HdrReport {
            native_flag: is_image_hdr(image),
            itur_2100_tf: is_image_hdr_v2(image),
            extended_range_name: has_extended_range_name(image.color_space()),
            gain_map_metadata: has_gain_map_hdr(properties),
            color_depth: image_color_depth(image),
        }
    }

    pub fn log(&self) {
        match self.native_flag {
            Some(v) => info!("isHDR: {}", v),
            None => info!("isHDR: unavailable"),
        }
        info!("isHDRV2: {}", self.itur_2100_tf);
        info!("extended range color space: {}", self.extended_range_name);
        info!("hasGainMapHDR: {}", self.gain_map_metadata);
        info!("colorDepth: {}", self.color_depth.unwrap_or(0));
    }
}
