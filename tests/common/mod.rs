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
#![allow(dead_code)]
//! Builds small HEIF files box by box

pub const XMP_CONTENT_TYPE: &str = "application/rdf+xml";
pub const GAIN_MAP_URN: &str = "urn:com:apple:photo:2020:aux:hdrgainmap";
pub const ALPHA_URN: &str = "urn:mpeg:mpegB:cicp:systems:auxiliary:alpha";
pub const PAD: u8 = 0xEE;

pub fn make_box(box_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(content.len() + 8);
    v.extend_from_slice(&((content.len() + 8) as u32).to_be_bytes());
    v.extend_from_slice(box_type);
    v.extend_from_slice(content);
    v
}

pub fn full_box(box_type: &[u8; 4], version: u8, flags: u32, content: &[u8]) -> Vec<u8> {
    let mut v = vec![version];
    v.extend_from_slice(&flags.to_be_bytes()[1..]);
    v.extend_from_slice(content);
    make_box(box_type, &v)
}

pub fn ispe(width: u32, height: u32) -> Vec<u8> {
    let mut v = width.to_be_bytes().to_vec();
    v.extend_from_slice(&height.to_be_bytes());
    full_box(b"ispe", 0, 0, &v)
}

pub fn pixi(bits: u8) -> Vec<u8> {
    full_box(b"pixi", 0, 0, &[1, bits])
}

pub fn nclx(primaries: u16, transfer: u16, matrix: u16) -> Vec<u8> {
    let mut v = b"nclx".to_vec();
    v.extend_from_slice(&primaries.to_be_bytes());
    v.extend_from_slice(&transfer.to_be_bytes());
    v.extend_from_slice(&matrix.to_be_bytes());
    v.push(0x80);
    make_box(b"colr", &v)
}

pub fn colr_icc(profile: &[u8]) -> Vec<u8> {
    let mut v = b"prof".to_vec();
    v.extend_from_slice(profile);
    make_box(b"colr", &v)
}

pub fn auxc(urn: &str) -> Vec<u8> {
    let mut v = urn.as_bytes().to_vec();
    v.push(0);
    full_box(b"auxC", 0, 0, &v)
}

/// One 8-bit monochrome component in a single tile
pub fn uncc_gray(row_align: u32) -> Vec<u8> {
    let mut v = b"gray".to_vec();
    v.extend_from_slice(&1u32.to_be_bytes());
    v.extend_from_slice(&0u16.to_be_bytes());
    v.extend_from_slice(&[7, 0, 0]);
    v.extend_from_slice(&[0, 0, 0, 0]);
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(&row_align.to_be_bytes());
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(&0u32.to_be_bytes());
    full_box(b"uncC", 0, 0, &v)
}

pub fn cmpd_mono() -> Vec<u8> {
    let mut v = 1u32.to_be_bytes().to_vec();
    v.extend_from_slice(&0u16.to_be_bytes());
    make_box(b"cmpd", &v)
}

/// Gray plane with `stride` bytes per row, padding filled with [`PAD`]
pub fn padded_plane(
    width: u32,
    height: u32,
    stride: usize,
    pixel: impl Fn(u32, u32) -> u8,
) -> Vec<u8> {
    let mut v = Vec::with_capacity(stride * height as usize);
    for y in 0..height {
        for x in 0..width {
            v.push(pixel(x, y));
        }
        v.resize(v.len() + stride - width as usize, PAD);
    }
    v
}

pub fn gain_map_pixel(x: u32, y: u32) -> u8 {
    ((x * 2 + y * 3) % 200) as u8
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: u16,
    pub item_type: [u8; 4],
    pub content_type: Option<String>,
    pub hidden: bool,
    pub data: Vec<u8>,
    pub properties: Vec<Vec<u8>>,
}

impl Item {
    pub fn new(id: u16, item_type: &[u8; 4], data: Vec<u8>) -> Item {
        Item {
            id,
            item_type: *item_type,
            content_type: None,
            hidden: false,
            data,
            properties: Vec::new(),
        }
    }

    pub fn xmp(id: u16, xmp: &str) -> Item {
        Item {
            content_type: Some(XMP_CONTENT_TYPE.to_string()),
            hidden: true,
            ..Item::new(id, b"mime", xmp.as_bytes().to_vec())
        }
    }

    pub fn hidden(mut self) -> Item {
        self.hidden = true;
        self
    }

    pub fn property(mut self, property: Vec<u8>) -> Item {
        self.properties.push(property);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeifBuilder {
    primary: u16,
    items: Vec<Item>,
    references: Vec<([u8; 4], u16, u16)>,
}

impl HeifBuilder {
    pub fn new(primary: u16) -> HeifBuilder {
        HeifBuilder {
            primary,
            ..Default::default()
        }
    }

    pub fn item(mut self, item: Item) -> HeifBuilder {
        self.items.push(item);
        self
    }

    pub fn reference(mut self, kind: &[u8; 4], from: u16, to: u16) -> HeifBuilder {
        self.references.push((*kind, from, to));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut ftyp = b"heic".to_vec();
        ftyp.extend_from_slice(&0u32.to_be_bytes());
        ftyp.extend_from_slice(b"mif1heic");

        let mut hdlr = 0u32.to_be_bytes().to_vec();
        hdlr.extend_from_slice(b"pict");
        hdlr.extend_from_slice(&[0u8; 12]);
        hdlr.push(0);

        let mut meta = full_box(b"hdlr", 0, 0, &hdlr);
        meta.extend(full_box(b"pitm", 0, 0, &self.primary.to_be_bytes()));
        meta.extend(self.iinf());
        meta.extend(self.iloc());
        meta.extend(self.iprp());
        meta.extend(self.iref());
        let idat: Vec<u8> = self
            .items
            .iter()
            .flat_map(|i| i.data.iter().copied())
            .collect();
        meta.extend(make_box(b"idat", &idat));

        let mut file = make_box(b"ftyp", &ftyp);
        file.extend(full_box(b"meta", 0, 0, &meta));
        file
    }

    fn iinf(&self) -> Vec<u8> {
        let mut v = (self.items.len() as u16).to_be_bytes().to_vec();
        for item in self.items.iter() {
            let mut infe = item.id.to_be_bytes().to_vec();
            infe.extend_from_slice(&0u16.to_be_bytes());
            infe.extend_from_slice(&item.item_type);
            infe.push(0);
            if let Some(content_type) = item.content_type.as_deref() {
                infe.extend_from_slice(content_type.as_bytes());
                infe.push(0);
            }
            v.extend(full_box(b"infe", 2, item.hidden as u32, &infe));
        }
        full_box(b"iinf", 0, 0, &v)
    }

    fn iloc(&self) -> Vec<u8> {
        let mut v = vec![0x44, 0x00];
        v.extend_from_slice(&(self.items.len() as u16).to_be_bytes());
        let mut offset = 0u32;
        for item in self.items.iter() {
            v.extend_from_slice(&item.id.to_be_bytes());
            v.extend_from_slice(&1u16.to_be_bytes());
            v.extend_from_slice(&0u16.to_be_bytes());
            v.extend_from_slice(&1u16.to_be_bytes());
            v.extend_from_slice(&offset.to_be_bytes());
            v.extend_from_slice(&(item.data.len() as u32).to_be_bytes());
            offset += item.data.len() as u32;
        }
        full_box(b"iloc", 1, 0, &v)
    }

    fn iprp(&self) -> Vec<u8> {
        let mut ipco = Vec::new();
        let mut ipma = Vec::new();
        let mut index = 1u8;
        let with_properties = self.items.iter().filter(|i| !i.properties.is_empty());
        let mut entries = 0u32;
        for item in with_properties {
            entries += 1;
            ipma.extend_from_slice(&item.id.to_be_bytes());
            ipma.push(item.properties.len() as u8);
            for property in item.properties.iter() {
                ipco.extend_from_slice(property);
                ipma.push(0x80 | index);
                index += 1;
            }
        }
        let mut ipma_content = entries.to_be_bytes().to_vec();
        ipma_content.extend(ipma);

        let mut iprp = make_box(b"ipco", &ipco);
        iprp.extend(full_box(b"ipma", 0, 0, &ipma_content));
        make_box(b"iprp", &iprp)
    }

    fn iref(&self) -> Vec<u8> {
        let mut v = Vec::new();
        for (kind, from, to) in self.references.iter() {
            let mut content = from.to_be_bytes().to_vec();
            content.extend_from_slice(&1u16.to_be_bytes());
            content.extend_from_slice(&to.to_be_bytes());
            v.extend(make_box(kind, &content));
        }
        full_box(b"iref", 0, 0, &v)
    }
}

pub fn gain_map_xmp(version: &str) -> String {
    format!(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:HDRGainMap="http://ns.apple.com/HDRGainMap/1.0/" HDRGainMap:HDRGainMapVersion="{}" HDRGainMap:HDRGainMapHeadroom="3.5"/></rdf:RDF></x:xmpmeta>"#,
        version
    )
}

pub fn headroom_xmp(headroom: &str) -> String {
    format!(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:HDRToneMap="http://ns.apple.com/HDRToneMap/1.0/"><HDRToneMap:Headroom>{}</HDRToneMap:Headroom></rdf:Description></rdf:RDF></x:xmpmeta>"#,
        headroom
    )
}

/// 4x4 gray PQ primary image, item 1
pub fn primary_item() -> Item {
    Item::new(1, b"unci", (0..16u8).collect())
        .property(ispe(4, 4))
        .property(pixi(8))
        .property(nclx(9, 16, 9))
        .property(uncc_gray(0))
        .property(cmpd_mono())
}

/// Uncompressed gain map, item 2, rows aligned to `row_align` bytes
pub fn gain_map_item(width: u32, height: u32, row_align: u32) -> Item {
    let stride = if row_align > 1 {
        (width as usize).div_ceil(row_align as usize) * row_align as usize
    } else {
        width as usize
    };
    let plane = padded_plane(width, height, stride, gain_map_pixel);
    Item::new(2, b"unci", plane)
        .hidden()
        .property(ispe(width, height))
        .property(uncc_gray(row_align))
        .property(cmpd_mono())
        .property(auxc(GAIN_MAP_URN))
}

/// Primary image with a gain map and XMP on both images
pub fn gain_map_heif(width: u32, height: u32, row_align: u32) -> HeifBuilder {
    HeifBuilder::new(1)
        .item(primary_item())
        .item(gain_map_item(width, height, row_align))
        .item(Item::xmp(3, &gain_map_xmp("65536")))
        .item(Item::xmp(4, &headroom_xmp("1")))
        .reference(b"auxl", 2, 1)
        .reference(b"cdsc", 3, 2)
        .reference(b"cdsc", 4, 1)
}
