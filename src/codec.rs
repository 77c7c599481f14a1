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
//! Payload decoders turn a stored item into pixels.
//!
//! Coded items (HEVC, AV1) need an external codec: enable the `libheif`
//! feature or register one with [`crate::ImageContainer::with_decoder`].

use crate::gain_image::{GainImage, PixelFormat, RawBufferDescriptor};
use crate::heif::{FourCC, ImageSpatialExtents, ItemProperty};
use crate::GainMapError;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// A stored item handed to a decoder
#[derive(Debug, Clone)]
pub struct PayloadItem<'a> {
    pub item_id: u32,
    pub item_type: FourCC,
    /// MIME type of `mime` items, empty otherwise
    pub content_type: &'a str,
    pub extents: Option<ImageSpatialExtents>,
    /// Properties associated with the item, codec configuration included
    pub properties: Vec<&'a ItemProperty>,
    pub data: &'a [u8],
    /// The whole container, for codecs that parse the file themselves
    pub file: &'a [u8],
}

/// Single 8-bit plane as the codec produced it, rows may be padded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPlane {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
}

impl RawPlane {
    pub fn descriptor(&self) -> RawBufferDescriptor {
        RawBufferDescriptor {
            width: self.width,
            height: self.height,
            bytes_per_row: self.bytes_per_row,
            pixel_format: PixelFormat::OneComponent8,
        }
    }
}

pub trait PayloadDecoder {
    fn supports(&self, item: &PayloadItem<'_>) -> bool;

    /// Decodes the item into a single gray plane, keeping the codec's row padding
    fn decode_gray8(&self, item: &PayloadItem<'_>) -> Result<RawPlane, GainMapError>;

    /// Decodes the item into a bitmap
    fn decode_image(&self, item: &PayloadItem<'_>) -> Result<DynamicImage, GainMapError> {
        let plane = self.decode_gray8(item)?;
        let image = GainImage::borrow(&plane.data, &plane.descriptor()).to_gray_image()?;
        Ok(DynamicImage::ImageLuma8(image))
    }
}

pub type SyncPayloadDecoder = dyn PayloadDecoder + Send + Sync;

/// Decoders every container starts with, libheif included when the feature is on
pub(crate) fn builtin_decoders() -> Vec<Box<SyncPayloadDecoder>> {
    vec![
        Box::new(UncompressedDecoder::default()),
        Box::new(RasterPayloadDecoder::default()),
        #[cfg(feature = "libheif")]
        Box::new(crate::libheif::HeifPayloadDecoder::default()),
    ]
}

/// ISO/IEC 23001-17 `unci` items holding one 8-bit gray component
#[derive(Debug, Copy, Clone, Default)]
pub struct UncompressedDecoder {}

impl PayloadDecoder for UncompressedDecoder {
    fn supports(&self, item: &PayloadItem<'_>) -> bool {
        item.item_type == FourCC::UNCI
    }

    fn decode_gray8(&self, item: &PayloadItem<'_>) -> Result<RawPlane, GainMapError> {
        let extents = item
            .extents
            .ok_or(GainMapError::UnreadableContainer("uncompressed item without ispe"))?;
        let config = item
            .properties
            .iter()
            .find_map(|p| match p {
                ItemProperty::Uncompressed(v) => Some(v),
                _ => None,
            })
            .ok_or(GainMapError::UnreadableContainer("uncompressed item without uncC"))?;
        let components = item.properties.iter().find_map(|p| match p {
            ItemProperty::Components(v) => Some(v),
            _ => None,
        });
        let bytes_per_row = config.gray8_bytes_per_row(extents.width, components)?;
        Ok(RawPlane {
            data: item.data.to_vec(),
            width: extents.width,
            height: extents.height,
            bytes_per_row,
        })
    }
}

/// `jpeg` items and `mime` items with raster content the `image` crate reads
#[derive(Debug, Copy, Clone, Default)]
pub struct RasterPayloadDecoder {}

impl RasterPayloadDecoder {
    fn decode(&self, item: &PayloadItem<'_>) -> Result<DynamicImage, GainMapError> {
        let reader = ImageReader::new(Cursor::new(item.data)).with_guessed_format()?;
        if reader.format().is_none() {
            return Err(GainMapError::UnsupportedFormat(format!(
                "unrecognized payload of item {}",
                item.item_id
            )));
        }
        Ok(reader.decode()?)
    }
}

impl PayloadDecoder for RasterPayloadDecoder {
    fn supports(&self, item: &PayloadItem<'_>) -> bool {
        item.item_type == FourCC::JPEG
            || (item.item_type == FourCC::MIME
                && matches!(item.content_type, "image/jpeg" | "image/png"))
    }

    fn decode_gray8(&self, item: &PayloadItem<'_>) -> Result<RawPlane, GainMapError> {
        let gray = self.decode(item)?.into_luma8();
        let (width, height) = gray.dimensions();
        Ok(RawPlane {
            data: gray.into_raw(),
            width,
            height,
            bytes_per_row: width as usize,
        })
    }

    fn decode_image(&self, item: &PayloadItem<'_>) -> Result<DynamicImage, GainMapError> {
        self.decode(item)
    }
}
