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
//! Uncompressed image items, ISO/IEC 23001-17

use crate::heif::boxes::{read_cstring, read_u16, read_u32, read_u8, FourCC};
use crate::GainMapError;

/// One entry of the `uncC` component list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UncompressedComponent {
    /// Index into the `cmpd` component types
    pub index: u16,
    pub bit_depth: u16,
    /// 0 = unsigned integer, 1 = float, 2 = complex
    pub format: u8,
    pub align_size: u8,
}

/// Frame layout from `uncC`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncompressedConfig {
    pub version: u8,
    pub profile: FourCC,
    pub components: Vec<UncompressedComponent>,
    pub sampling_type: u8,
    pub interleave_type: u8,
    pub block_size: u8,
    pub components_little_endian: bool,
    pub pixel_size: u32,
    /// Rows are padded to a multiple of this many bytes, 0 disables padding
    pub row_align_size: u32,
    pub tile_align_size: u32,
    pub num_tile_cols: u32,
    pub num_tile_rows: u32,
}

/// Component types from `cmpd`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDefinition {
    pub types: Vec<u16>,
}

const COMPONENT_MONOCHROME: u16 = 0;
const COMPONENT_LUMA: u16 = 1;

pub(crate) fn parse_uncc(content: &[u8]) -> Result<UncompressedConfig, GainMapError> {
    let mut pos = 0usize;
    let version = read_u8(content, &mut pos)?;
    pos += 3;
    let profile = FourCC(read_u32(content, &mut pos)?.to_be_bytes());
    if version != 0 {
        // profile-only form, no explicit component layout
        return Ok(UncompressedConfig {
            version,
            profile,
            components: Vec::new(),
            sampling_type: 0,
            interleave_type: 0,
            block_size: 0,
            components_little_endian: false,
            pixel_size: 0,
            row_align_size: 0,
            tile_align_size: 0,
            num_tile_cols: 1,
            num_tile_rows: 1,
        });
    }
    let component_count = read_u32(content, &mut pos)? as usize;
    if component_count > content.len() / 5 {
        return Err(GainMapError::UnreadableContainer("uncC component count too large"));
    }
    let mut components = Vec::with_capacity(component_count);
    for _ in 0..component_count {
        let index = read_u16(content, &mut pos)?;
        let bit_depth = read_u8(content, &mut pos)? as u16 + 1;
        let format = read_u8(content, &mut pos)?;
        let align_size = read_u8(content, &mut pos)?;
        components.push(UncompressedComponent {
            index,
            bit_depth,
            format,
            align_size,
        });
    }
    let sampling_type = read_u8(content, &mut pos)?;
    let interleave_type = read_u8(content, &mut pos)?;
    let block_size = read_u8(content, &mut pos)?;
    let flags = read_u8(content, &mut pos)?;
    let pixel_size = read_u32(content, &mut pos)?;
    let row_align_size = read_u32(content, &mut pos)?;
    let tile_align_size = read_u32(content, &mut pos)?;
    let num_tile_cols = read_u32(content, &mut pos)?.saturating_add(1);
    let num_tile_rows = read_u32(content, &mut pos)?.saturating_add(1);
    Ok(UncompressedConfig {
        version,
        profile,
        components,
        sampling_type,
        interleave_type,
        block_size,
        components_little_endian: flags & 0x80 != 0,
        pixel_size,
        row_align_size,
        tile_align_size,
        num_tile_cols,
        num_tile_rows,
    })
}

pub(crate) fn parse_cmpd(content: &[u8]) -> Result<ComponentDefinition, GainMapError> {
    let mut pos = 0usize;
    let count = read_u32(content, &mut pos)? as usize;
    if count > content.len() / 2 {
        return Err(GainMapError::UnreadableContainer("cmpd component count too large"));
    }
    let mut types = Vec::with_capacity(count);
    for _ in 0..count {
        let component_type = read_u16(content, &mut pos)?;
        if component_type >= 0x8000 {
            // user defined component carries a URI we don't need
            let _ = read_cstring(content, &mut pos);
        }
        types.push(component_type);
    }
    Ok(ComponentDefinition { types })
}

impl UncompressedConfig {
    /// Row stride of a single 8-bit gray plane stored with this layout.
    ///
    /// Fails for anything but one unsigned 8-bit monochrome component in a
    /// single tile.
    pub fn gray8_bytes_per_row(
        &self,
        width: u32,
        components: Option<&ComponentDefinition>,
    ) -> Result<usize, GainMapError> {
        if self.version != 0 || self.components.len() != 1 {
            return Err(GainMapError::UnsupportedFormat(format!(
                "uncompressed profile '{}' is not single channel",
                self.profile
            )));
        }
        let component = self.components[0];
        if component.bit_depth != 8 || component.format != 0 {
            return Err(GainMapError::UnsupportedFormat(format!(
                "uncompressed component of {} bits, format {}",
                component.bit_depth, component.format
            )));
        }
        if let Some(definition) = components {
            let kind = definition
                .types
                .get(component.index as usize)
                .copied()
                .ok_or(GainMapError::UnreadableContainer("uncC component index out of cmpd"))?;
            if kind != COMPONENT_MONOCHROME && kind != COMPONENT_LUMA {
                return Err(GainMapError::UnsupportedFormat(format!(
                    "uncompressed component type {} is not gray",
                    kind
                )));
            }
        }
        if self.num_tile_cols != 1 || self.num_tile_rows != 1 {
            return Err(GainMapError::UnsupportedFormat(
                "tiled uncompressed images".to_string(),
            ));
        }
        if self.sampling_type != 0 || self.block_size != 0 {
            return Err(GainMapError::UnsupportedFormat(
                "subsampled or blocked uncompressed images".to_string(),
            ));
        }
        let bytes_per_pixel = if self.pixel_size == 0 {
            1usize
        } else {
            self.pixel_size as usize
        };
        let row = (width as usize)
            .checked_mul(bytes_per_pixel)
            .ok_or(GainMapError::UnreadableContainer("uncompressed row size overflow"))?;
        let align = self.row_align_size as usize;
        if align <= 1 {
            return Ok(row);
        }
        row.div_ceil(align)
            .checked_mul(align)
            .ok_or(GainMapError::UnreadableContainer("uncompressed row size overflow"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_uncc(row_align: u32) -> Vec<u8> {
        let mut v = vec![0, 0, 0, 0];
        v.extend_from_slice(b"gray");
        v.extend_from_slice(&1u32.to_be_bytes());
        v.extend_from_slice(&0u16.to_be_bytes());
        v.extend_from_slice(&[7, 0, 0]);
        v.extend_from_slice(&[0, 0, 0, 0]);
        v.extend_from_slice(&0u32.to_be_bytes());
        v.extend_from_slice(&row_align.to_be_bytes());
        v.extend_from_slice(&0u32.to_be_bytes());
        v.extend_from_slice(&0u32.to_be_bytes());
        v.extend_from_slice(&0u32.to_be_bytes());
        v
    }

    #[test]
    fn row_alignment_pads_stride() {
        let config = parse_uncc(&gray_uncc(8)).unwrap();
        assert_eq!(config.components[0].bit_depth, 8);
        assert_eq!(config.gray8_bytes_per_row(100, None).unwrap(), 104);
        assert_eq!(config.gray8_bytes_per_row(96, None).unwrap(), 96);
    }

    #[test]
    fn no_alignment_is_tight() {
        let config = parse_uncc(&gray_uncc(0)).unwrap();
        assert_eq!(config.gray8_bytes_per_row(33, None).unwrap(), 33);
    }

    #[test]
    fn rejects_color_components() {
        let config = parse_uncc(&gray_uncc(0)).unwrap();
        let cmpd = ComponentDefinition { types: vec![4] };
        assert!(matches!(
            config.gray8_bytes_per_row(10, Some(&cmpd)),
            Err(GainMapError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn truncated_uncc_fails() {
        let data = gray_uncc(0);
        assert!(parse_uncc(&data[..20]).is_err());
    }

    #[test]
    fn parses_cmpd() {
        let mut data = 2u32.to_be_bytes().to_vec();
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0x8000u16.to_be_bytes());
        data.extend_from_slice(b"urn:x\0");
        let cmpd = parse_cmpd(&data).unwrap();
        assert_eq!(cmpd.types, vec![0, 0x8000]);
    }
}
