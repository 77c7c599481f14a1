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
//! HEVC and AV1 coded items through the system libheif.

use crate::codec::{PayloadDecoder, PayloadItem, RawPlane};
use crate::heif::FourCC;
use crate::{GainMapError, MismatchedSize};
use image::{DynamicImage, RgbImage};
use libheif_rs::{
    AuxiliaryImagesFilter, ColorSpace, HeifContext, Image, ImageHandle, LibHeif, RgbChroma,
};
use log::debug;

/// Decodes `hvc1` and `av01` items with libheif.
///
/// libheif reads the whole file, so items are found again by their id, either
/// as a top-level image or as an auxiliary image of one.
#[derive(Debug, Copy, Clone, Default)]
pub struct HeifPayloadDecoder {}

fn codec_error(err: libheif_rs::HeifError) -> GainMapError {
    GainMapError::Codec(err.to_string())
}

fn find_handle(context: &HeifContext<'_>, item_id: u32) -> Result<ImageHandle, GainMapError> {
    for handle in context.top_level_image_handles() {
        if handle.item_id() == item_id {
            return Ok(handle);
        }
        if let Some(aux) = handle
            .auxiliary_images(AuxiliaryImagesFilter::empty())
            .into_iter()
            .find(|v| v.item_id() == item_id)
        {
            return Ok(aux);
        }
    }
    Err(GainMapError::Codec(format!("libheif does not expose item {}", item_id)))
}

fn decode(item: &PayloadItem<'_>, color_space: ColorSpace) -> Result<Image, GainMapError> {
    let lib = LibHeif::new();
    let context = HeifContext::read_from_bytes(item.file).map_err(codec_error)?;
    let handle = find_handle(&context, item.item_id)?;
    lib.decode(&handle, color_space, None).map_err(codec_error)
}

impl PayloadDecoder for HeifPayloadDecoder {
    fn supports(&self, item: &PayloadItem<'_>) -> bool {
        item.item_type == FourCC::HVC1 || item.item_type == FourCC::AV01
    }

    fn decode_gray8(&self, item: &PayloadItem<'_>) -> Result<RawPlane, GainMapError> {
        let image = decode(item, ColorSpace::Monochrome)?;
        let planes = image.planes();
        let plane = planes
            .y
            .ok_or_else(|| GainMapError::Codec("decoded image has no gray plane".to_string()))?;
        if plane.storage_bits_per_pixel != 8 {
            return Err(GainMapError::UnsupportedFormat(format!(
                "{}-bit coded gain map",
                plane.bits_per_pixel
            )));
        }
        debug!(
            "libheif decoded item {} as {}x{}, stride {}",
            item.item_id, plane.width, plane.height, plane.stride
        );
        let used = plane.stride * plane.height as usize;
        Ok(RawPlane {
            data: plane.data[..used.min(plane.data.len())].to_vec(),
            width: plane.width,
            height: plane.height,
            bytes_per_row: plane.stride,
        })
    }

    fn decode_image(&self, item: &PayloadItem<'_>) -> Result<DynamicImage, GainMapError> {
        let image = decode(item, ColorSpace::Rgb(RgbChroma::Rgb))?;
        let planes = image.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| GainMapError::Codec("decoded image has no RGB plane".to_string()))?;
        let row_len = plane.width as usize * 3;
        let expected = row_len * plane.height as usize;
        let mut rgb = Vec::with_capacity(expected);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            rgb.extend_from_slice(&row[..row_len.min(row.len())]);
        }
        let received = rgb.len();
        RgbImage::from_raw(plane.width, plane.height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or(GainMapError::TruncatedBuffer(MismatchedSize { expected, received }))
    }
}
