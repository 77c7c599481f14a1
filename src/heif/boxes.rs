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
//! ISOBMFF box definitions and parsing

use crate::heif::uncompressed::{ComponentDefinition, UncompressedConfig};
use crate::GainMapError;

/// Four-character code identifying a box or item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const META: Self = Self(*b"meta");
    pub const PITM: Self = Self(*b"pitm");
    pub const ILOC: Self = Self(*b"iloc");
    pub const IINF: Self = Self(*b"iinf");
    pub const INFE: Self = Self(*b"infe");
    pub const IPRP: Self = Self(*b"iprp");
    pub const IPCO: Self = Self(*b"ipco");
    pub const IPMA: Self = Self(*b"ipma");
    pub const IREF: Self = Self(*b"iref");
    pub const IDAT: Self = Self(*b"idat");
    pub const ISPE: Self = Self(*b"ispe");
    pub const PIXI: Self = Self(*b"pixi");
    pub const COLR: Self = Self(*b"colr");
    pub const AUXC: Self = Self(*b"auxC");
    pub const HVCC: Self = Self(*b"hvcC");
    pub const AV1C: Self = Self(*b"av1C");
    pub const UNCC: Self = Self(*b"uncC");
    pub const CMPD: Self = Self(*b"cmpd");
    /// Auxiliary image reference
    pub const AUXL: Self = Self(*b"auxl");
    /// Content description reference, metadata item -> described item
    pub const CDSC: Self = Self(*b"cdsc");
    /// Thumbnail reference
    pub const THMB: Self = Self(*b"thmb");
    /// Derived image reference
    pub const DIMG: Self = Self(*b"dimg");

    pub const HVC1: Self = Self(*b"hvc1");
    pub const AV01: Self = Self(*b"av01");
    pub const UNCI: Self = Self(*b"unci");
    pub const JPEG: Self = Self(*b"jpeg");
    pub const GRID: Self = Self(*b"grid");
    pub const IDEN: Self = Self(*b"iden");
    pub const IOVL: Self = Self(*b"iovl");
    pub const MIME: Self = Self(*b"mime");
    pub const EXIF: Self = Self(*b"Exif");

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 4 {
            Some(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// The code as a big endian integer, the form pixel formats are reported in
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Item types holding a coded or raw image rather than metadata
    pub fn is_image_item(&self) -> bool {
        matches!(
            *self,
            FourCC::HVC1
                | FourCC::AV01
                | FourCC::UNCI
                | FourCC::JPEG
                | FourCC::GRID
                | FourCC::IDEN
                | FourCC::IOVL
        )
    }
}

impl core::fmt::Display for FourCC {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[inline]
pub(crate) fn read_u8(arr: &[u8], pos: &mut usize) -> Result<u8, GainMapError> {
    let v = *arr
        .get(*pos)
        .ok_or(GainMapError::UnreadableContainer("box data too short"))?;
    *pos += 1;
    Ok(v)
}

#[inline]
pub(crate) fn read_u16(arr: &[u8], pos: &mut usize) -> Result<u16, GainMapError> {
    let s = arr
        .get(*pos..*pos + 2)
        .ok_or(GainMapError::UnreadableContainer("box data too short"))?;
    *pos += 2;
    Ok(u16::from_be_bytes([s[0], s[1]]))
}

#[inline]
pub(crate) fn read_u32(arr: &[u8], pos: &mut usize) -> Result<u32, GainMapError> {
    let s = arr
        .get(*pos..*pos + 4)
        .ok_or(GainMapError::UnreadableContainer("box data too short"))?;
    *pos += 4;
    Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
}

/// Reads a big endian integer stored in `size` bytes, 0 bytes reads as 0
#[inline]
pub(crate) fn read_sized(arr: &[u8], pos: &mut usize, size: usize) -> Result<u64, GainMapError> {
    if size > 8 {
        return Err(GainMapError::UnreadableContainer("integer field too wide"));
    }
    let s = arr
        .get(*pos..*pos + size)
        .ok_or(GainMapError::UnreadableContainer("box data too short"))?;
    *pos += size;
    Ok(s.iter().fold(0u64, |acc, &v| (acc << 8) | v as u64))
}

#[inline]
pub(crate) fn read_fourcc(arr: &[u8], pos: &mut usize) -> Result<FourCC, GainMapError> {
    let v = read_u32(arr, pos)?;
    Ok(FourCC(v.to_be_bytes()))
}

/// Reads a null terminated UTF-8 string, a missing terminator ends at the slice end
pub(crate) fn read_cstring(arr: &[u8], pos: &mut usize) -> String {
    let rest = arr.get(*pos..).unwrap_or(&[]);
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let value = String::from_utf8_lossy(&rest[..end]).into_owned();
    *pos += (end + 1).min(rest.len());
    value
}

/// Raw box header
#[derive(Debug, Clone, Copy)]
pub struct BoxHeader {
    pub box_type: FourCC,
    /// Total box size including header
    pub size: u64,
    /// Offset of the content, relative to the slice being iterated
    pub content_offset: usize,
}

#[derive(Debug)]
pub struct IsoBox<'a> {
    pub header: BoxHeader,
    /// Box content, header excluded
    pub content: &'a [u8],
}

impl IsoBox<'_> {
    pub fn box_type(&self) -> FourCC {
        self.header.box_type
    }

    /// Full box version and flags
    pub fn version_flags(&self) -> Result<(u8, u32), GainMapError> {
        if self.content.len() < 4 {
            return Err(GainMapError::UnreadableContainer("full box too short"));
        }
        let version = self.content[0];
        let flags = u32::from_be_bytes([0, self.content[1], self.content[2], self.content[3]]);
        Ok((version, flags))
    }
}

/// Iterates sibling boxes; stops at the first box that doesn't fit
pub struct BoxIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BoxIterator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl<'a> Iterator for BoxIterator<'a> {
    type Item = IsoBox<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset + 8 > self.data.len() {
            return None;
        }

        let data = &self.data[self.offset..];
        let size_32 = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let box_type = FourCC::from_bytes(&data[4..8])?;

        let (size, header_size): (u64, usize) = if size_32 == 1 {
            if data.len() < 16 {
                return None;
            }
            let ext_size = u64::from_be_bytes([
                data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
            ]);
            (ext_size, 16)
        } else if size_32 == 0 {
            // runs to the end of the enclosing data
            (data.len() as u64, 8)
        } else {
            (size_32 as u64, 8)
        };

        let size_usize = usize::try_from(size).ok()?;
        if size_usize < header_size || size_usize > data.len() {
            return None;
        }

        let item = IsoBox {
            header: BoxHeader {
                box_type,
                size,
                content_offset: self.offset + header_size,
            },
            content: &data[header_size..size_usize],
        };
        self.offset += size_usize;
        Some(item)
    }
}

#[derive(Debug, Clone)]
pub struct ItemLocation {
    pub item_id: u32,
    /// 0 = file offsets, 1 = idat offsets, 2 = item offsets
    pub construction_method: u8,
    pub base_offset: u64,
    /// (offset, length) pairs
    pub extents: Vec<(u64, u64)>,
}

#[derive(Debug, Clone)]
pub struct ItemInfo {
    pub item_id: u32,
    pub item_type: FourCC,
    pub item_name: String,
    /// MIME type of `mime` items
    pub content_type: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSpatialExtents {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorInfo {
    IccProfile(Vec<u8>),
    Nclx {
        color_primaries: u16,
        transfer_characteristics: u16,
        matrix_coefficients: u16,
        full_range: bool,
    },
}

/// Auxiliary image type from `auxC`
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryType {
    pub urn: String,
    pub subtype: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum ItemProperty {
    ImageExtents(ImageSpatialExtents),
    /// Bits per channel from `pixi`
    PixelInformation(Vec<u8>),
    ColorInfo(ColorInfo),
    AuxiliaryType(AuxiliaryType),
    /// Decoder configuration record (`hvcC`, `av1C`) kept verbatim
    CodecConfig {
        kind: FourCC,
        bit_depth: Option<u8>,
        data: Vec<u8>,
    },
    Uncompressed(UncompressedConfig),
    Components(ComponentDefinition),
    Unknown(FourCC),
}

#[derive(Debug, Clone)]
pub struct PropertyAssociation {
    pub item_id: u32,
    /// 1-based property indices with the essential flag
    pub properties: Vec<(u16, bool)>,
}

#[derive(Debug, Clone)]
pub struct ItemReference {
    pub reference_type: FourCC,
    pub from_item_id: u32,
    pub to_item_ids: Vec<u32>,
}
