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
use crate::color_space::ColorSpace;
use crate::err::MismatchedSize;
use crate::property::{keys, PropertyBag};
use crate::GainMapError;
use image::{DynamicImage, GrayImage};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// Raw pixel layouts a description record may name
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// One unsigned 8-bit component, four character code `L008`
    OneComponent8,
}

impl PixelFormat {
    pub const fn fourcc(self) -> u32 {
        match self {
            PixelFormat::OneComponent8 => u32::from_be_bytes(*b"L008"),
        }
    }

    pub const fn bytes_per_component(self) -> usize {
        match self {
            PixelFormat::OneComponent8 => 1,
        }
    }

    pub const fn components(self) -> usize {
        match self {
            PixelFormat::OneComponent8 => 1,
        }
    }

    pub fn from_fourcc(code: i64) -> Option<PixelFormat> {
        if code == PixelFormat::OneComponent8.fourcc() as i64 {
            Some(PixelFormat::OneComponent8)
        } else {
            None
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let code = self.fourcc().to_be_bytes();
        f.write_str(&String::from_utf8_lossy(&code))
    }
}

/// Typed form of an auxiliary image description record
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawBufferDescriptor {
    pub width: u32,
    pub height: u32,
    /// Distance in bytes between the starts of two rows
    pub bytes_per_row: usize,
    pub pixel_format: PixelFormat,
}

fn positive_u32(description: &PropertyBag, key: &'static str) -> Result<u32, GainMapError> {
    description
        .get_integer(key)
        .filter(|&v| v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(GainMapError::MalformedDescriptor(key))
}

impl RawBufferDescriptor {
    /// Parses a description record.
    ///
    /// `Width`, `Height` and `BytesPerRow` must be positive integers.
    /// `PixelFormat` may be absent, which means one 8-bit component, but
    /// any other format than `L008` is rejected. A row stride narrower
    /// than a row of pixels is rejected as well.
    pub fn from_description(description: &PropertyBag) -> Result<Self, GainMapError> {
        let width = positive_u32(description, keys::WIDTH)?;
        let height = positive_u32(description, keys::HEIGHT)?;
        let bytes_per_row = positive_u32(description, keys::BYTES_PER_ROW)? as usize;
        let pixel_format = match description.get(keys::PIXEL_FORMAT) {
            None => PixelFormat::OneComponent8,
            Some(value) => value
                .as_integer()
                .and_then(PixelFormat::from_fourcc)
                .ok_or(GainMapError::MalformedDescriptor(keys::PIXEL_FORMAT))?,
        };
        let descriptor = RawBufferDescriptor {
            width,
            height,
            bytes_per_row,
            pixel_format,
        };
        if descriptor.bytes_per_row < descriptor.row_bytes() {
            return Err(GainMapError::MalformedDescriptor(keys::BYTES_PER_ROW));
        }
        Ok(descriptor)
    }

    /// Description record for this layout
    pub fn to_description(&self) -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.insert(keys::WIDTH, self.width);
        bag.insert(keys::HEIGHT, self.height);
        bag.insert(keys::BYTES_PER_ROW, self.bytes_per_row as i64);
        bag.insert(keys::PIXEL_FORMAT, self.pixel_format.fourcc() as i64);
        bag
    }

    /// Bytes of actual pixel data in one row
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize
            * self.pixel_format.components()
            * self.pixel_format.bytes_per_component()
    }

    /// Minimum buffer length, every row including the last takes a full stride
    #[inline]
    pub fn required_len(&self) -> Option<usize> {
        self.bytes_per_row.checked_mul(self.height as usize)
    }
}

/// Borrowed view over a row padded 8-bit plane
pub struct GainImage<'a> {
    pub data: Cow<'a, [u8]>,
    pub width: usize,
    pub height: usize,
    /// Image stride, bytes per row
    pub stride: usize,
}

impl<'a> GainImage<'a> {
    /// Borrows existing data with the layout of a descriptor
    pub fn borrow(arr: &'a [u8], descriptor: &RawBufferDescriptor) -> Self {
        Self {
            data: Cow::Borrowed(arr),
            width: descriptor.row_bytes(),
            height: descriptor.height as usize,
            stride: descriptor.bytes_per_row,
        }
    }

    /// Checks that the stride holds a row and that the buffer holds every row
    #[inline]
    pub fn check_layout(&self) -> Result<(), GainMapError> {
        if self.width == 0 || self.height == 0 {
            return Err(GainMapError::MalformedDescriptor("zero sized image"));
        }
        if self.stride < self.width {
            return Err(GainMapError::MalformedDescriptor(keys::BYTES_PER_ROW));
        }
        let expected = self
            .stride
            .checked_mul(self.height)
            .ok_or(GainMapError::MalformedDescriptor(keys::BYTES_PER_ROW))?;
        if self.data.len() < expected {
            return Err(GainMapError::TruncatedBuffer(MismatchedSize {
                expected,
                received: self.data.len(),
            }));
        }
        Ok(())
    }

    /// Copies the pixels into a tightly packed gray image, row padding is dropped
    pub fn to_gray_image(&self) -> Result<GrayImage, GainMapError> {
        self.check_layout()?;
        let mut packed = vec![0u8; self.width * self.height];
        for (src, dst) in self
            .data
            .as_ref()
            .chunks_exact(self.stride)
            .take(self.height)
            .zip(packed.chunks_exact_mut(self.width))
        {
            dst.copy_from_slice(&src[..self.width]);
        }
        let width = u32::try_from(self.width)
            .map_err(|_| GainMapError::MalformedDescriptor(keys::WIDTH))?;
        let height = u32::try_from(self.height)
            .map_err(|_| GainMapError::MalformedDescriptor(keys::HEIGHT))?;
        // packed is exactly width * height, from_raw can't reject it
        let received = packed.len();
        GrayImage::from_raw(width, height, packed).ok_or(GainMapError::TruncatedBuffer(
            MismatchedSize {
                expected: self.width * self.height,
                received,
            },
        ))
    }
}

/// Bitmap with its color information
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub color_space: ColorSpace,
    pub bits_per_component: u8,
    /// Native high dynamic range flag, `None` when the source exposes none
    pub high_dynamic_range: Option<bool>,
}

impl DecodedImage {
    /// Gain map bitmap, it has no color so the color space is untagged
    pub fn gain_map(image: GrayImage) -> DecodedImage {
        DecodedImage {
            image: DynamicImage::ImageLuma8(image),
            color_space: ColorSpace::untagged(),
            bits_per_component: 8,
            high_dynamic_range: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Bits per component of a decoded buffer
pub(crate) fn bits_per_component(image: &DynamicImage) -> u8 {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => 8,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => 32,
        _ => 16,
    }
}
