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
use crate::err::MismatchedSize;
use crate::gain_image::{DecodedImage, GainImage, RawBufferDescriptor};
use crate::property::{keys, PropertyBag};
use crate::reader::ImageContainer;
use crate::GainMapError;
use log::debug;

/// Auxiliary type of an HDR gain map
pub const HDR_GAIN_MAP_TYPE: &str = "urn:com:apple:photo:2020:aux:hdrgainmap";

/// Extracts the HDR gain map of the first image as a standalone gray bitmap.
///
/// Returns `Ok(None)` when the image has no gain map. The auxiliary
/// description is validated strictly, and a raw buffer shorter than
/// `BytesPerRow * Height` fails with [`GainMapError::TruncatedBuffer`].
/// Row padding never ends up in the bitmap.
pub fn extract_gain_map(container: &ImageContainer) -> Result<Option<DecodedImage>, GainMapError> {
    let Some(entry) = container.auxiliary_data_at(0, HDR_GAIN_MAP_TYPE)? else {
        debug!("No auxiliary data tagged '{}'", HDR_GAIN_MAP_TYPE);
        return Ok(None);
    };

    let descriptor = RawBufferDescriptor::from_description(&entry.description)?;
    let required = descriptor
        .required_len()
        .ok_or(GainMapError::MalformedDescriptor(keys::BYTES_PER_ROW))?;
    if entry.data.len() < required {
        return Err(GainMapError::TruncatedBuffer(MismatchedSize {
            expected: required,
            received: entry.data.len(),
        }));
    }
    debug!(
        "Gain map {}x{}, {} bytes per row, {}",
        descriptor.width, descriptor.height, descriptor.bytes_per_row, descriptor.pixel_format
    );

    let image = GainImage::borrow(&entry.data, &descriptor).to_gray_image()?;
    Ok(Some(DecodedImage::gain_map(image)))
}

/// `AuxiliaryData.HDRGainMapVersion` of an image property bag, when non-empty
pub fn gain_map_version(properties: &PropertyBag) -> Option<&str> {
    properties
        .get_dictionary(keys::AUXILIARY_DATA)?
        .get_str(keys::HDR_GAIN_MAP_VERSION)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_nested() {
        let mut auxiliary = PropertyBag::new();
        auxiliary.insert(keys::HDR_GAIN_MAP_VERSION, "65536");
        let mut bag = PropertyBag::new();
        bag.insert(keys::AUXILIARY_DATA, auxiliary);
        assert_eq!(gain_map_version(&bag), Some("65536"));
    }

    #[test]
    fn version_absent() {
        let mut bag = PropertyBag::new();
        assert_eq!(gain_map_version(&bag), None);
        bag.insert(keys::HDR_GAIN_MAP_VERSION, "65536");
        assert_eq!(gain_map_version(&bag), None);
        let mut auxiliary = PropertyBag::new();
        auxiliary.insert(keys::HDR_GAIN_MAP_VERSION, "");
        bag.insert(keys::AUXILIARY_DATA, auxiliary);
        assert_eq!(gain_map_version(&bag), None);
    }

    #[test]
    fn raster_image_has_no_gain_map() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::GrayImage::new(4, 4)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let container = ImageContainer::from_bytes(png.into_inner()).unwrap();
        assert!(extract_gain_map(&container).unwrap().is_none());
    }
}
