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
use crate::codec::{builtin_decoders, PayloadItem, SyncPayloadDecoder};
use crate::color_space::{icc_description, ColorSpace, ColorSpaceName};
use crate::extract::HDR_GAIN_MAP_TYPE;
use crate::gain_image::{bits_per_component, DecodedImage};
use crate::heif::{self, ColorInfo, FourCC, HeifContainer};
use crate::property::{keys, PropertyBag};
use crate::xmp::{is_xmp_content_type, read_xmp, XmpFields};
use crate::GainMapError;
use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};
use log::{debug, warn};
use moxcms::{ColorProfile, TransferCharacteristics};
use std::io::Cursor;
use std::path::Path;

/// Geometry and color of an image, known without decoding it
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescription {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: Option<u8>,
    pub color_space: ColorSpace,
    /// Native high dynamic range flag, `None` when the format has no such notion
    pub high_dynamic_range: Option<bool>,
}

/// Auxiliary payload attached to an image
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryDataEntry {
    pub type_tag: String,
    /// Raw pixel bytes, rows are `BytesPerRow` apart
    pub data: Vec<u8>,
    /// `Width`, `Height`, `BytesPerRow` and `PixelFormat`
    pub description: PropertyBag,
    /// Values from metadata attached to the auxiliary image
    pub metadata: PropertyBag,
}

struct RasterSource {
    data: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
    color_type: ColorType,
    icc_profile: Option<Vec<u8>>,
}

enum Source {
    Heif(HeifContainer),
    Raster(RasterSource),
}

/// Opened image container, read only
pub struct ImageContainer {
    source: Source,
    decoders: Vec<Box<SyncPayloadDecoder>>,
}

impl std::fmt::Debug for ImageContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.source {
            Source::Heif(heif) => format!("HEIF '{}'", heif.brand),
            Source::Raster(raster) => format!("{:?}", raster.format),
        };
        f.debug_struct("ImageContainer")
            .field("source", &kind)
            .field("images", &self.image_count())
            .field("decoders", &self.decoders.len())
            .finish()
    }
}

impl ImageContainer {
    pub fn open(path: impl AsRef<Path>) -> Result<ImageContainer, GainMapError> {
        let path = path.as_ref();
        debug!("Opening {}", path.display());
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Opens an in-memory container, HEIF or any raster format the `image` crate sniffs
    pub fn from_bytes(data: Vec<u8>) -> Result<ImageContainer, GainMapError> {
        let source = if heif::is_isobmff(&data) {
            Source::Heif(heif::parse(data)?)
        } else {
            Source::Raster(open_raster(data)?)
        };
        Ok(ImageContainer {
            source,
            decoders: builtin_decoders(),
        })
    }

    /// Registers a decoder, tried before the built-in ones
    pub fn with_decoder(mut self, decoder: Box<SyncPayloadDecoder>) -> ImageContainer {
        self.decoders.insert(0, decoder);
        self
    }

    pub fn image_count(&self) -> usize {
        match &self.source {
            Source::Heif(heif) => heif.top_level_images().len(),
            Source::Raster(_) => 1,
        }
    }

    fn check_index(&self, index: usize) -> Result<(), GainMapError> {
        let count = self.image_count();
        if index >= count {
            return Err(GainMapError::IndexOutOfRange { index, count });
        }
        Ok(())
    }

    fn heif_image_id(heif: &HeifContainer, index: usize) -> Result<u32, GainMapError> {
        let images = heif.top_level_images();
        images
            .get(index)
            .copied()
            .ok_or(GainMapError::IndexOutOfRange {
                index,
                count: images.len(),
            })
    }

    /// Container metadata of an image.
    ///
    /// Keys are only present when the container states the value.
    pub fn properties_at(&self, index: usize) -> Result<PropertyBag, GainMapError> {
        self.check_index(index)?;
        let mut bag = PropertyBag::new();
        match &self.source {
            Source::Heif(heif) => {
                let item_id = Self::heif_image_id(heif, index)?;
                if let Some(extents) = heif.extents(item_id) {
                    bag.insert(keys::PIXEL_WIDTH, extents.width);
                    bag.insert(keys::PIXEL_HEIGHT, extents.height);
                }
                if let Some(depth) = heif.bit_depth(item_id) {
                    bag.insert(keys::DEPTH, depth as i64);
                }
                if let Some(name) = heif_color_space(heif, item_id).profile_name() {
                    bag.insert(keys::PROFILE_NAME, name);
                }
                if let Some(headroom) = item_xmp(heif, item_id).headroom {
                    bag.insert(keys::HEADROOM, headroom);
                }
                let mut auxiliary = PropertyBag::new();
                for aux_id in heif.auxiliary_items(item_id) {
                    auxiliary.merge(item_xmp(heif, aux_id).gain_map);
                }
                if !auxiliary.is_empty() {
                    bag.insert(keys::AUXILIARY_DATA, auxiliary);
                }
            }
            Source::Raster(raster) => {
                bag.insert(keys::PIXEL_WIDTH, raster.width);
                bag.insert(keys::PIXEL_HEIGHT, raster.height);
                bag.insert(keys::DEPTH, color_type_depth(raster.color_type) as i64);
                if let Some(name) = raster
                    .icc_profile
                    .as_deref()
                    .and_then(parse_icc)
                    .and_then(|v| icc_description(&v))
                {
                    bag.insert(keys::PROFILE_NAME, name);
                }
            }
        }
        debug!("Properties of image {}: {}", index, bag);
        Ok(bag)
    }

    /// Auxiliary data of the given type attached to an image.
    ///
    /// `Ok(None)` when the image has no such entry, which is the usual case.
    pub fn auxiliary_data_at(
        &self,
        index: usize,
        type_tag: &str,
    ) -> Result<Option<AuxiliaryDataEntry>, GainMapError> {
        self.check_index(index)?;
        let heif = match &self.source {
            Source::Heif(heif) => heif,
            Source::Raster(_) => return Ok(None),
        };
        let item_id = Self::heif_image_id(heif, index)?;
        let Some(aux_id) = find_auxiliary(heif, item_id, type_tag) else {
            return Ok(None);
        };
        debug!(
            "Auxiliary item {} of image item {} is '{}'",
            aux_id, item_id, type_tag
        );

        let data = heif.item_data(aux_id)?;
        let item = payload_item(heif, aux_id, &data)?;
        let plane = self.decoder_for(&item)?.decode_gray8(&item)?;

        let mut metadata = PropertyBag::new();
        let xmp = item_xmp(heif, aux_id);
        metadata.merge(xmp.gain_map);
        if let Some(headroom) = xmp.headroom {
            metadata.insert(keys::HEADROOM, headroom);
        }

        Ok(Some(AuxiliaryDataEntry {
            type_tag: type_tag.to_string(),
            description: plane.descriptor().to_description(),
            data: plane.data,
            metadata,
        }))
    }

    /// Describes an image without decoding its pixels
    pub fn describe_at(&self, index: usize) -> Result<ImageDescription, GainMapError> {
        self.check_index(index)?;
        match &self.source {
            Source::Heif(heif) => {
                let item_id = Self::heif_image_id(heif, index)?;
                let extents = heif
                    .extents(item_id)
                    .ok_or(GainMapError::UnreadableContainer("image item without ispe"))?;
                let color_space = heif_color_space(heif, item_id);
                let has_gain_map = find_auxiliary(heif, item_id, HDR_GAIN_MAP_TYPE).is_some();
                let has_hdr_transfer = matches!(
                    color_space.transfer,
                    Some(TransferCharacteristics::Smpte2084 | TransferCharacteristics::Hlg)
                );
                Ok(ImageDescription {
                    width: extents.width,
                    height: extents.height,
                    bits_per_component: heif.bit_depth(item_id),
                    color_space,
                    high_dynamic_range: Some(has_gain_map || has_hdr_transfer),
                })
            }
            Source::Raster(raster) => Ok(ImageDescription {
                width: raster.width,
                height: raster.height,
                bits_per_component: Some(color_type_depth(raster.color_type)),
                color_space: raster_color_space(raster),
                high_dynamic_range: None,
            }),
        }
    }

    /// Decodes an image.
    ///
    /// Coded HEIF items fail with [`GainMapError::UnsupportedFormat`] unless a
    /// decoder for them was registered.
    pub fn decode_at(&self, index: usize) -> Result<DecodedImage, GainMapError> {
        let description = self.describe_at(index)?;
        let image = match &self.source {
            Source::Heif(heif) => {
                let item_id = Self::heif_image_id(heif, index)?;
                let data = heif.item_data(item_id)?;
                let item = payload_item(heif, item_id, &data)?;
                self.decoder_for(&item)?.decode_image(&item)?
            }
            Source::Raster(raster) => {
                ImageReader::with_format(Cursor::new(&raster.data), raster.format).decode()?
            }
        };
        let bits_per_component = description
            .bits_per_component
            .unwrap_or_else(|| bits_per_component(&image));
        Ok(DecodedImage {
            image,
            color_space: description.color_space,
            bits_per_component,
            high_dynamic_range: description.high_dynamic_range,
        })
    }

    fn decoder_for(&self, item: &PayloadItem<'_>) -> Result<&SyncPayloadDecoder, GainMapError> {
        self.decoders
            .iter()
            .find(|d| d.supports(item))
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                GainMapError::UnsupportedFormat(format!(
                    "no decoder for '{}' item {}",
                    item.item_type, item.item_id
                ))
            })
    }
}

fn open_raster(data: Vec<u8>) -> Result<RasterSource, GainMapError> {
    let format = image::guess_format(&data)
        .map_err(|_| GainMapError::UnreadableContainer("unrecognized image format"))?;
    let mut decoder = ImageReader::with_format(Cursor::new(&data), format)
        .into_decoder()
        .map_err(|err| {
            warn!("Can't read {:?} header: {}", format, err);
            GainMapError::UnreadableContainer("undecodable image header")
        })?;
    let (width, height) = decoder.dimensions();
    let color_type = decoder.color_type();
    let icc_profile = decoder.icc_profile().unwrap_or_else(|err| {
        warn!("Can't read embedded ICC profile: {}", err);
        None
    });
    debug!(
        "{:?} image {}x{}, {:?}, ICC profile: {}",
        format,
        width,
        height,
        color_type,
        icc_profile.is_some()
    );
    drop(decoder);
    Ok(RasterSource {
        data,
        format,
        width,
        height,
        color_type,
        icc_profile,
    })
}

fn color_type_depth(color_type: ColorType) -> u8 {
    let channels = color_type.channel_count().max(1) as u16;
    (color_type.bits_per_pixel() / channels) as u8
}

fn parse_icc(profile: &[u8]) -> Option<ColorProfile> {
    match ColorProfile::new_from_slice(profile) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!("Ignoring embedded ICC profile: {}", err);
            None
        }
    }
}

fn raster_color_space(raster: &RasterSource) -> ColorSpace {
    let extended_range = matches!(raster.color_type, ColorType::Rgb32F | ColorType::Rgba32F);
    if let Some(profile) = raster.icc_profile.as_deref().and_then(parse_icc) {
        return ColorSpace::from_icc(&profile, extended_range);
    }
    let name = if extended_range {
        ColorSpaceName::ExtendedLinearSrgb
    } else if raster.color_type.has_color() {
        ColorSpaceName::Srgb
    } else {
        ColorSpaceName::GenericGray
    };
    ColorSpace::named(name)
}

fn heif_color_space(heif: &HeifContainer, item_id: u32) -> ColorSpace {
    match heif.color_info(item_id) {
        Some(ColorInfo::Nclx {
            color_primaries,
            transfer_characteristics,
            ..
        }) => ColorSpace::from_cicp(*color_primaries, *transfer_characteristics, false),
        Some(ColorInfo::IccProfile(profile)) => parse_icc(profile)
            .map(|v| ColorSpace::from_icc(&v, false))
            .unwrap_or_default(),
        None => ColorSpace::untagged(),
    }
}

fn find_auxiliary(heif: &HeifContainer, item_id: u32, type_tag: &str) -> Option<u32> {
    heif.auxiliary_items(item_id)
        .into_iter()
        .find(|&aux_id| {
            heif.auxiliary_type(aux_id)
                .is_some_and(|t| t.urn == type_tag)
        })
}

/// XMP items describing `item_id` through `cdsc`
fn item_xmp(heif: &HeifContainer, item_id: u32) -> XmpFields {
    let mut fields = XmpFields::default();
    for metadata_id in heif.references_to(item_id, FourCC::CDSC) {
        let Some(info) = heif.info(metadata_id) else {
            continue;
        };
        if info.item_type != FourCC::MIME || !is_xmp_content_type(&info.content_type) {
            continue;
        }
        match heif.item_data(metadata_id) {
            Ok(data) => {
                let found = read_xmp(&data);
                if found.is_empty() {
                    debug!("XMP item {} holds no gain map values", metadata_id);
                    continue;
                }
                fields.gain_map.merge(found.gain_map);
                if fields.headroom.is_none() {
                    fields.headroom = found.headroom;
                }
            }
            Err(err) => warn!("Skipping XMP item {}: {}", metadata_id, err),
        }
    }
    fields
}

fn payload_item<'a>(
    heif: &'a HeifContainer,
    item_id: u32,
    data: &'a [u8],
) -> Result<PayloadItem<'a>, GainMapError> {
    let info = heif
        .info(item_id)
        .ok_or(GainMapError::UnreadableContainer("item is not declared"))?;
    Ok(PayloadItem {
        item_id,
        item_type: info.item_type,
        content_type: &info.content_type,
        extents: heif.extents(item_id),
        properties: heif.item_properties(item_id).collect(),
        data,
        file: heif.bytes(),
    })
}

