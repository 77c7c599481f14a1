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
//! HEIF container parser

use crate::heif::boxes::{
    read_cstring, read_fourcc, read_sized, read_u16, read_u32, read_u8, AuxiliaryType, BoxIterator,
    ColorInfo, FourCC, ImageSpatialExtents, IsoBox, ItemInfo, ItemLocation, ItemProperty,
    ItemReference, PropertyAssociation,
};
use crate::heif::uncompressed::{parse_cmpd, parse_uncc};
use crate::GainMapError;
use log::{debug, warn};

const HEIF_BRANDS: [FourCC; 7] = [
    FourCC(*b"heic"),
    FourCC(*b"heix"),
    FourCC(*b"hevc"),
    FourCC(*b"hevx"),
    FourCC(*b"mif1"),
    FourCC(*b"msf1"),
    FourCC(*b"avif"),
];

/// Parsed HEIF container, owns the file bytes
#[derive(Debug)]
pub struct HeifContainer {
    data: Vec<u8>,
    pub brand: FourCC,
    pub compatible_brands: Vec<FourCC>,
    pub primary_item_id: u32,
    pub item_locations: Vec<ItemLocation>,
    pub item_infos: Vec<ItemInfo>,
    /// `ipco` properties in order, `ipma` indices are 1-based into this
    pub properties: Vec<ItemProperty>,
    pub property_associations: Vec<PropertyAssociation>,
    pub item_references: Vec<ItemReference>,
    /// Absolute offset and length of the `idat` payload
    idat: Option<(usize, usize)>,
}

/// Returns true when the bytes start with an `ftyp` box
pub fn is_isobmff(data: &[u8]) -> bool {
    data.len() >= 12 && &data[4..8] == b"ftyp"
}

pub fn parse(data: Vec<u8>) -> Result<HeifContainer, GainMapError> {
    let mut container = HeifContainer {
        data: Vec::new(),
        brand: FourCC(*b"    "),
        compatible_brands: Vec::new(),
        primary_item_id: 0,
        item_locations: Vec::new(),
        item_infos: Vec::new(),
        properties: Vec::new(),
        property_associations: Vec::new(),
        item_references: Vec::new(),
        idat: None,
    };

    let mut has_meta = false;
    for top_box in BoxIterator::new(&data) {
        match top_box.box_type() {
            FourCC::FTYP => parse_ftyp(&top_box, &mut container)?,
            FourCC::META => {
                parse_meta(&top_box, &mut container)?;
                has_meta = true;
            }
            other => debug!("Skipping '{}' box of {} bytes", other, top_box.header.size),
        }
    }

    if container.brand.0 == *b"    " {
        return Err(GainMapError::UnreadableContainer("missing ftyp box"));
    }
    if !has_meta {
        return Err(GainMapError::UnreadableContainer("missing meta box"));
    }
    if container.info(container.primary_item_id).is_none() {
        return Err(GainMapError::UnreadableContainer("primary item is not declared"));
    }

    debug!(
        "HEIF brand '{}', {} items, {} properties, {} references",
        container.brand,
        container.item_infos.len(),
        container.properties.len(),
        container.item_references.len()
    );

    container.data = data;
    Ok(container)
}

impl HeifContainer {
    /// The file the container was parsed from
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn info(&self, item_id: u32) -> Option<&ItemInfo> {
        self.item_infos.iter().find(|i| i.item_id == item_id)
    }

    /// Properties associated with an item, in association order
    pub fn item_properties(&self, item_id: u32) -> impl Iterator<Item = &ItemProperty> {
        self.property_associations
            .iter()
            .filter(move |a| a.item_id == item_id)
            .flat_map(|a| a.properties.iter())
            .filter_map(move |&(index, _)| {
                // index 0 means "no property"
                (index as usize)
                    .checked_sub(1)
                    .and_then(|i| self.properties.get(i))
            })
    }

    pub fn extents(&self, item_id: u32) -> Option<ImageSpatialExtents> {
        self.item_properties(item_id).find_map(|p| match p {
            ItemProperty::ImageExtents(v) => Some(*v),
            _ => None,
        })
    }

    pub fn color_info(&self, item_id: u32) -> Option<&ColorInfo> {
        self.item_properties(item_id).find_map(|p| match p {
            ItemProperty::ColorInfo(v) => Some(v),
            _ => None,
        })
    }

    pub fn auxiliary_type(&self, item_id: u32) -> Option<&AuxiliaryType> {
        self.item_properties(item_id).find_map(|p| match p {
            ItemProperty::AuxiliaryType(v) => Some(v),
            _ => None,
        })
    }

    /// Bit depth of the first channel, from `pixi`, the codec config or `uncC`
    pub fn bit_depth(&self, item_id: u32) -> Option<u8> {
        let mut fallback = None;
        for property in self.item_properties(item_id) {
            match property {
                ItemProperty::PixelInformation(bits) => {
                    if let Some(&first) = bits.first() {
                        return Some(first);
                    }
                }
                ItemProperty::CodecConfig { bit_depth, .. } => {
                    fallback = fallback.or(*bit_depth);
                }
                ItemProperty::Uncompressed(config) => {
                    fallback = fallback.or(config
                        .components
                        .first()
                        .and_then(|c| u8::try_from(c.bit_depth).ok()));
                }
                _ => {}
            }
        }
        fallback
    }

    /// Items `from` points at with the given reference type
    pub fn references_from(&self, from_item_id: u32, reference_type: FourCC) -> Vec<u32> {
        self.item_references
            .iter()
            .filter(|r| r.from_item_id == from_item_id && r.reference_type == reference_type)
            .flat_map(|r| r.to_item_ids.iter().copied())
            .collect()
    }

    /// Items holding a reference of the given type to `to_item_id`
    pub fn references_to(&self, to_item_id: u32, reference_type: FourCC) -> Vec<u32> {
        self.item_references
            .iter()
            .filter(|r| r.reference_type == reference_type && r.to_item_ids.contains(&to_item_id))
            .map(|r| r.from_item_id)
            .collect()
    }

    /// Top level images: primary first, then other visible images that are
    /// neither auxiliary images, thumbnails nor derivation inputs
    pub fn top_level_images(&self) -> Vec<u32> {
        let mut images = vec![self.primary_item_id];
        for info in self.item_infos.iter() {
            if info.item_id == self.primary_item_id
                || info.hidden
                || !info.item_type.is_image_item()
            {
                continue;
            }
            let is_dependent = self
                .item_references
                .iter()
                .any(|r| is_dependent_reference(r, info.item_id));
            if !is_dependent {
                images.push(info.item_id);
            }
        }
        images
    }

    /// Auxiliary images attached to an image through `auxl`
    pub fn auxiliary_items(&self, image_item_id: u32) -> Vec<u32> {
        self.references_to(image_item_id, FourCC::AUXL)
    }

    /// Item payload, extents concatenated
    pub fn item_data(&self, item_id: u32) -> Result<Vec<u8>, GainMapError> {
        let loc = self
            .item_locations
            .iter()
            .find(|l| l.item_id == item_id)
            .ok_or(GainMapError::UnreadableContainer("item has no location"))?;

        let base = match loc.construction_method {
            0 => 0usize,
            1 => match self.idat {
                Some((offset, _)) => offset,
                None => return Err(GainMapError::UnreadableContainer("missing idat box")),
            },
            method => {
                return Err(GainMapError::UnsupportedFormat(format!(
                    "item construction method {}",
                    method
                )));
            }
        };
        let limit = match loc.construction_method {
            1 => self.idat.map(|(offset, len)| offset + len).unwrap_or(0),
            _ => self.data.len(),
        };

        let mut result = Vec::new();
        for &(offset, length) in loc.extents.iter() {
            let start = loc
                .base_offset
                .checked_add(offset)
                .and_then(|v| usize::try_from(v).ok())
                .and_then(|v| v.checked_add(base))
                .ok_or(GainMapError::UnreadableContainer("item extent overflow"))?;
            // zero length extent on a single extent item spans the rest of the data
            let length = if length == 0 && loc.extents.len() == 1 {
                limit.saturating_sub(start)
            } else {
                usize::try_from(length)
                    .map_err(|_| GainMapError::UnreadableContainer("item extent overflow"))?
            };
            let end = start
                .checked_add(length)
                .ok_or(GainMapError::UnreadableContainer("item extent overflow"))?;
            if end > limit {
                return Err(GainMapError::UnreadableContainer("item extent past end of data"));
            }
            result.extend_from_slice(&self.data[start..end]);
        }
        Ok(result)
    }
}

/// True when `reference` makes `item_id` depend on another image
fn is_dependent_reference(reference: &ItemReference, item_id: u32) -> bool {
    match reference.reference_type {
        FourCC::AUXL | FourCC::THMB => reference.from_item_id == item_id,
        FourCC::DIMG => reference.to_item_ids.contains(&item_id),
        _ => false,
    }
}

fn parse_ftyp(ftyp: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    let content = ftyp.content;
    if content.len() < 8 {
        return Err(GainMapError::UnreadableContainer("ftyp too short"));
    }
    let mut pos = 0;
    container.brand = read_fourcc(content, &mut pos)?;
    // minor version
    pos += 4;
    while pos + 4 <= content.len() {
        let brand = read_fourcc(content, &mut pos)?;
        container.compatible_brands.push(brand);
    }

    let is_heif = HEIF_BRANDS.contains(&container.brand)
        || container
            .compatible_brands
            .iter()
            .any(|b| HEIF_BRANDS.contains(b));
    if !is_heif {
        return Err(GainMapError::UnreadableContainer("not a HEIF file"));
    }
    Ok(())
}

fn parse_meta(meta: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    if meta.content.len() < 4 {
        return Err(GainMapError::UnreadableContainer("meta box too short"));
    }
    let content = &meta.content[4..];
    let content_base = meta.header.content_offset + 4;

    for child in BoxIterator::new(content) {
        match child.box_type() {
            FourCC::PITM => parse_pitm(&child, container)?,
            FourCC::ILOC => parse_iloc(&child, container)?,
            FourCC::IINF => parse_iinf(&child, container)?,
            FourCC::IPRP => parse_iprp(&child, container)?,
            FourCC::IREF => parse_iref(&child, container)?,
            FourCC::IDAT => {
                container.idat = Some((
                    content_base + child.header.content_offset,
                    child.content.len(),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_pitm(pitm: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    let (version, _) = pitm.version_flags()?;
    let mut pos = 4;
    container.primary_item_id = if version == 0 {
        read_u16(pitm.content, &mut pos)? as u32
    } else {
        read_u32(pitm.content, &mut pos)?
    };
    Ok(())
}

fn parse_iloc(iloc: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    let content = iloc.content;
    let (version, _) = iloc.version_flags()?;
    let mut pos = 4;
    let sizes = read_u8(content, &mut pos)?;
    let offset_size = (sizes >> 4) as usize;
    let length_size = (sizes & 0xF) as usize;
    let sizes = read_u8(content, &mut pos)?;
    let base_offset_size = (sizes >> 4) as usize;
    let index_size = if version >= 1 {
        (sizes & 0xF) as usize
    } else {
        0
    };

    let item_count = if version < 2 {
        read_u16(content, &mut pos)? as u32
    } else {
        read_u32(content, &mut pos)?
    };

    for _ in 0..item_count {
        let item_id = if version < 2 {
            read_u16(content, &mut pos)? as u32
        } else {
            read_u32(content, &mut pos)?
        };
        let construction_method = if version >= 1 {
            (read_u16(content, &mut pos)? & 0xF) as u8
        } else {
            0
        };
        // data reference index
        let _ = read_u16(content, &mut pos)?;
        let base_offset = read_sized(content, &mut pos, base_offset_size)?;
        let extent_count = read_u16(content, &mut pos)?;

        let mut extents = Vec::with_capacity(extent_count as usize);
        for _ in 0..extent_count {
            if index_size > 0 {
                let _ = read_sized(content, &mut pos, index_size)?;
            }
            let extent_offset = read_sized(content, &mut pos, offset_size)?;
            let extent_length = read_sized(content, &mut pos, length_size)?;
            extents.push((extent_offset, extent_length));
        }

        container.item_locations.push(ItemLocation {
            item_id,
            construction_method,
            base_offset,
            extents,
        });
    }
    Ok(())
}

fn parse_iinf(iinf: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    let (version, _) = iinf.version_flags()?;
    let mut pos = 4;
    let entry_count = if version == 0 {
        read_u16(iinf.content, &mut pos)? as u32
    } else {
        read_u32(iinf.content, &mut pos)?
    };

    let mut infe_count = 0;
    for child in BoxIterator::new(&iinf.content[pos..]) {
        if infe_count >= entry_count {
            break;
        }
        if child.box_type() != FourCC::INFE {
            continue;
        }
        match parse_infe(&child) {
            Ok(info) => {
                container.item_infos.push(info);
                infe_count += 1;
            }
            Err(err) => warn!("Skipping malformed infe box: {}", err),
        }
    }
    Ok(())
}

fn parse_infe(infe: &IsoBox<'_>) -> Result<ItemInfo, GainMapError> {
    let content = infe.content;
    let (version, flags) = infe.version_flags()?;
    if version < 2 {
        return Err(GainMapError::UnsupportedFormat(format!(
            "infe version {}",
            version
        )));
    }
    let mut pos = 4;
    let item_id = if version == 2 {
        read_u16(content, &mut pos)? as u32
    } else {
        read_u32(content, &mut pos)?
    };
    // item protection index
    let _ = read_u16(content, &mut pos)?;
    let item_type = read_fourcc(content, &mut pos)?;
    let item_name = read_cstring(content, &mut pos);
    let content_type = if item_type == FourCC::MIME {
        read_cstring(content, &mut pos)
    } else {
        String::new()
    };

    Ok(ItemInfo {
        item_id,
        item_type,
        item_name,
        content_type,
        hidden: flags & 1 != 0,
    })
}

fn parse_iprp(iprp: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    for child in BoxIterator::new(iprp.content) {
        match child.box_type() {
            FourCC::IPCO => parse_ipco(&child, container),
            FourCC::IPMA => parse_ipma(&child, container)?,
            _ => {}
        }
    }
    Ok(())
}

fn parse_ipco(ipco: &IsoBox<'_>, container: &mut HeifContainer) {
    // index is implicit, every child keeps its slot even when unreadable
    for child in BoxIterator::new(ipco.content) {
        let box_type = child.box_type();
        let parsed = match box_type {
            FourCC::ISPE => parse_ispe(&child).map(ItemProperty::ImageExtents),
            FourCC::PIXI => parse_pixi(&child).map(ItemProperty::PixelInformation),
            FourCC::COLR => parse_colr(&child).map(ItemProperty::ColorInfo),
            FourCC::AUXC => parse_auxc(&child).map(ItemProperty::AuxiliaryType),
            FourCC::HVCC => Ok(ItemProperty::CodecConfig {
                kind: box_type,
                bit_depth: child.content.get(17).map(|v| (v & 0x7) + 8),
                data: child.content.to_vec(),
            }),
            FourCC::AV1C => Ok(ItemProperty::CodecConfig {
                kind: box_type,
                bit_depth: child.content.get(2).map(|v| {
                    let high_bitdepth = v & 0x40 != 0;
                    let twelve_bit = v & 0x20 != 0;
                    match (high_bitdepth, twelve_bit) {
                        (true, true) => 12,
                        (true, false) => 10,
                        _ => 8,
                    }
                }),
                data: child.content.to_vec(),
            }),
            FourCC::UNCC => parse_uncc(child.content).map(ItemProperty::Uncompressed),
            FourCC::CMPD => parse_cmpd(child.content).map(ItemProperty::Components),
            _ => Ok(ItemProperty::Unknown(box_type)),
        };
        let property = parsed.unwrap_or_else(|err| {
            warn!("Unreadable '{}' property: {}", box_type, err);
            ItemProperty::Unknown(box_type)
        });
        container.properties.push(property);
    }
}

fn parse_ispe(ispe: &IsoBox<'_>) -> Result<ImageSpatialExtents, GainMapError> {
    let mut pos = 4;
    let width = read_u32(ispe.content, &mut pos)?;
    let height = read_u32(ispe.content, &mut pos)?;
    Ok(ImageSpatialExtents { width, height })
}

fn parse_pixi(pixi: &IsoBox<'_>) -> Result<Vec<u8>, GainMapError> {
    let mut pos = 4;
    let channels = read_u8(pixi.content, &mut pos)? as usize;
    let bits = pixi
        .content
        .get(pos..pos + channels)
        .ok_or(GainMapError::UnreadableContainer("pixi too short"))?;
    Ok(bits.to_vec())
}

fn parse_colr(colr: &IsoBox<'_>) -> Result<ColorInfo, GainMapError> {
    let content = colr.content;
    let mut pos = 0;
    let color_type = read_fourcc(content, &mut pos)?;
    match &color_type.0 {
        b"nclx" => {
            let color_primaries = read_u16(content, &mut pos)?;
            let transfer_characteristics = read_u16(content, &mut pos)?;
            let matrix_coefficients = read_u16(content, &mut pos)?;
            let full_range = read_u8(content, &mut pos)? >> 7 != 0;
            Ok(ColorInfo::Nclx {
                color_primaries,
                transfer_characteristics,
                matrix_coefficients,
                full_range,
            })
        }
        b"prof" | b"rICC" => Ok(ColorInfo::IccProfile(content[4..].to_vec())),
        _ => Err(GainMapError::UnsupportedFormat(format!(
            "colr type '{}'",
            color_type
        ))),
    }
}

fn parse_auxc(auxc: &IsoBox<'_>) -> Result<AuxiliaryType, GainMapError> {
    let _ = auxc.version_flags()?;
    let mut pos = 4;
    let urn = read_cstring(auxc.content, &mut pos);
    let subtype = auxc.content.get(pos..).unwrap_or(&[]).to_vec();
    Ok(AuxiliaryType { urn, subtype })
}

fn parse_ipma(ipma: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    let content = ipma.content;
    let (version, flags) = ipma.version_flags()?;
    let mut pos = 4;
    let entry_count = read_u32(content, &mut pos)?;

    for _ in 0..entry_count {
        let item_id = if version < 1 {
            read_u16(content, &mut pos)? as u32
        } else {
            read_u32(content, &mut pos)?
        };
        let assoc_count = read_u8(content, &mut pos)?;
        let mut properties = Vec::with_capacity(assoc_count as usize);
        for _ in 0..assoc_count {
            if flags & 1 != 0 {
                let val = read_u16(content, &mut pos)?;
                properties.push((val & 0x7FFF, val >> 15 != 0));
            } else {
                let val = read_u8(content, &mut pos)?;
                properties.push(((val & 0x7F) as u16, val >> 7 != 0));
            }
        }
        container.property_associations.push(PropertyAssociation {
            item_id,
            properties,
        });
    }
    Ok(())
}

fn parse_iref(iref: &IsoBox<'_>, container: &mut HeifContainer) -> Result<(), GainMapError> {
    let (version, _) = iref.version_flags()?;
    for reference in BoxIterator::new(&iref.content[4..]) {
        let content = reference.content;
        let mut pos = 0;
        let from_item_id = if version == 0 {
            read_u16(content, &mut pos)? as u32
        } else {
            read_u32(content, &mut pos)?
        };
        let count = read_u16(content, &mut pos)?;
        let mut to_item_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = if version == 0 {
                read_u16(content, &mut pos)? as u32
            } else {
                read_u32(content, &mut pos)?
            };
            to_item_ids.push(id);
        }
        container.item_references.push(ItemReference {
            reference_type: reference.box_type(),
            from_item_id,
            to_item_ids,
        });
    }
    Ok(())
}
