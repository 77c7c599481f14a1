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
mod common;

use common::*;
use gainmap_tool::{
    extract_gain_map, has_gain_map_hdr, keys, write, write_to, ColorSpaceName, GainMapError,
    ImageContainer, MismatchedSize, OutputFormat, PayloadDecoder, PayloadItem, PropertyBag,
    RawBufferDescriptor, RawPlane, HDR_GAIN_MAP_TYPE,
};
use image::ImageFormat;
use moxcms::ColorProfile;
use std::io::Cursor;

fn open(builder: &HeifBuilder) -> ImageContainer {
    ImageContainer::from_bytes(builder.build()).unwrap()
}

#[test]
fn padded_gain_map_end_to_end() {
    let container = open(&gain_map_heif(100, 50, 8));
    assert_eq!(container.image_count(), 1);

    let entry = container
        .auxiliary_data_at(0, HDR_GAIN_MAP_TYPE)
        .unwrap()
        .unwrap();
    assert_eq!(entry.type_tag, HDR_GAIN_MAP_TYPE);
    assert_eq!(entry.description.get_integer(keys::WIDTH), Some(100));
    assert_eq!(entry.description.get_integer(keys::HEIGHT), Some(50));
    assert_eq!(
        entry.description.get_integer(keys::BYTES_PER_ROW),
        Some(104)
    );
    assert_eq!(entry.data.len(), 104 * 50);

    let gain_map = extract_gain_map(&container).unwrap().unwrap();
    assert!(gain_map.color_space.is_untagged());
    assert_eq!(gain_map.bits_per_component, 8);
    let gray = gain_map.image.as_luma8().unwrap();
    assert_eq!(gray.dimensions(), (100, 50));
    for (x, y, pixel) in gray.enumerate_pixels() {
        assert_eq!(pixel.0[0], gain_map_pixel(x, y), "pixel at {}x{}", x, y);
    }
    assert!(!gray.as_raw().contains(&PAD));

    let path = std::env::temp_dir().join(format!("gain-map-e2e-{}.bmp", std::process::id()));
    write(&gain_map, &path, OutputFormat::Bmp).unwrap();
    let written = image::open(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!((written.width(), written.height()), (100, 50));
    assert_eq!(written.to_luma8().as_raw(), gray.as_raw());
}

#[test]
fn unpadded_rows_map_directly() {
    let container = open(&gain_map_heif(40, 30, 0));
    let entry = container
        .auxiliary_data_at(0, HDR_GAIN_MAP_TYPE)
        .unwrap()
        .unwrap();
    let gain_map = extract_gain_map(&container).unwrap().unwrap();
    let gray = gain_map.image.as_luma8().unwrap();
    for y in 0..30u32 {
        for x in 0..40u32 {
            assert_eq!(gray.get_pixel(x, y).0[0], entry.data[(y * 40 + x) as usize]);
        }
    }
}

#[test]
fn round_trip_through_png() {
    let container = open(&gain_map_heif(33, 7, 4));
    let gain_map = extract_gain_map(&container).unwrap().unwrap();
    let mut cursor = Cursor::new(Vec::new());
    write_to(&gain_map, &mut cursor, OutputFormat::Png).unwrap();
    let decoded = image::load_from_memory_with_format(cursor.get_ref(), ImageFormat::Png)
        .unwrap()
        .to_luma8();
    assert_eq!(
        decoded.as_raw(),
        gain_map.image.as_luma8().unwrap().as_raw()
    );
}

#[test]
fn image_without_gain_map() {
    let plain = HeifBuilder::new(1).item(primary_item());
    let container = open(&plain);
    assert!(container
        .auxiliary_data_at(0, HDR_GAIN_MAP_TYPE)
        .unwrap()
        .is_none());
    assert!(extract_gain_map(&container).unwrap().is_none());
}

#[test]
fn other_auxiliary_types_are_ignored() {
    let mut alpha = gain_map_item(8, 8, 0);
    alpha.properties.pop();
    let alpha = alpha.property(auxc(ALPHA_URN));
    let builder = HeifBuilder::new(1)
        .item(primary_item())
        .item(alpha)
        .reference(b"auxl", 2, 1);
    let container = open(&builder);
    assert!(extract_gain_map(&container).unwrap().is_none());
    assert!(container.auxiliary_data_at(0, ALPHA_URN).unwrap().is_some());
}

#[test]
fn description_without_height_is_malformed() {
    let container = open(&gain_map_heif(100, 50, 8));
    let entry = container
        .auxiliary_data_at(0, HDR_GAIN_MAP_TYPE)
        .unwrap()
        .unwrap();
    let mut description = PropertyBag::new();
    for (key, value) in entry.description.iter() {
        if key != keys::HEIGHT {
            description.insert(key, value.clone());
        }
    }
    assert!(matches!(
        RawBufferDescriptor::from_description(&description),
        Err(GainMapError::MalformedDescriptor("Height"))
    ));
}

#[test]
fn zero_height_gain_map_is_malformed() {
    let container = open(&gain_map_heif(16, 0, 0));
    assert!(matches!(
        extract_gain_map(&container),
        Err(GainMapError::MalformedDescriptor("Height"))
    ));
}

#[test]
fn truncated_gain_map() {
    let mut gain_map = gain_map_item(100, 50, 8);
    gain_map.data.pop();
    let builder = HeifBuilder::new(1)
        .item(primary_item())
        .item(gain_map)
        .reference(b"auxl", 2, 1);
    let container = open(&builder);
    assert!(matches!(
        extract_gain_map(&container),
        Err(GainMapError::TruncatedBuffer(MismatchedSize {
            expected: 5200,
            received: 5199,
        }))
    ));
}

#[test]
fn bad_frame_index() {
    let container = open(&gain_map_heif(8, 8, 0));
    assert!(matches!(
        container.properties_at(3),
        Err(GainMapError::IndexOutOfRange { index: 3, count: 1 })
    ));
    assert!(matches!(
        container.auxiliary_data_at(1, HDR_GAIN_MAP_TYPE),
        Err(GainMapError::IndexOutOfRange { index: 1, count: 1 })
    ));
    assert!(matches!(
        container.describe_at(1),
        Err(GainMapError::IndexOutOfRange { .. })
    ));
}

#[test]
fn primary_properties() {
    let container = open(&gain_map_heif(8, 8, 0));
    let properties = container.properties_at(0).unwrap();
    assert_eq!(properties.get_integer(keys::PIXEL_WIDTH), Some(4));
    assert_eq!(properties.get_integer(keys::PIXEL_HEIGHT), Some(4));
    assert_eq!(properties.get_integer(keys::DEPTH), Some(8));
    assert_eq!(
        properties.get_str(keys::PROFILE_NAME),
        Some("Rec. ITU-R BT.2100 PQ")
    );
    assert!(has_gain_map_hdr(&properties));
}

#[cfg(feature = "xmp")]
#[test]
fn xmp_metadata() {
    let container = open(&gain_map_heif(8, 8, 0));
    let properties = container.properties_at(0).unwrap();
    assert_eq!(properties.get_integer(keys::HEADROOM), Some(1));
    assert_eq!(gainmap_tool::gain_map_version(&properties), Some("65536"));

    let entry = container
        .auxiliary_data_at(0, HDR_GAIN_MAP_TYPE)
        .unwrap()
        .unwrap();
    assert_eq!(
        entry.metadata.get_str(keys::HDR_GAIN_MAP_VERSION),
        Some("65536")
    );
}

#[test]
fn describe_and_decode_primary() {
    let container = open(&gain_map_heif(8, 8, 0));
    let description = container.describe_at(0).unwrap();
    assert_eq!((description.width, description.height), (4, 4));
    assert_eq!(description.high_dynamic_range, Some(true));
    assert!(gainmap_tool::uses_itur_2100_tf(&description.color_space));

    let decoded = container.decode_at(0).unwrap();
    assert_eq!(
        decoded.image.as_luma8().unwrap().as_raw(),
        &(0..16u8).collect::<Vec<_>>()
    );
    assert_eq!(decoded.high_dynamic_range, Some(true));
}

#[test]
fn icc_tagged_primary() {
    let icc = ColorProfile::new_bt2020_pq().encode().unwrap();
    let primary = Item::new(1, b"unci", (0..16u8).collect())
        .property(ispe(4, 4))
        .property(pixi(8))
        .property(colr_icc(&icc))
        .property(uncc_gray(0))
        .property(cmpd_mono());
    let container = open(&HeifBuilder::new(1).item(primary));
    let description = container.describe_at(0).unwrap();
    assert_eq!(
        description.color_space.name,
        Some(ColorSpaceName::Itur2100Pq)
    );
    assert_eq!(description.high_dynamic_range, Some(true));
    let properties = container.properties_at(0).unwrap();
    assert_eq!(properties.get_str(keys::PROFILE_NAME), Some("Rec.2020 PQ"));

    let gray = ColorProfile::new_gray_with_gamma(2.2).encode().unwrap();
    let primary = Item::new(1, b"unci", (0..16u8).collect())
        .property(ispe(4, 4))
        .property(colr_icc(&gray))
        .property(uncc_gray(0))
        .property(cmpd_mono());
    let container = open(&HeifBuilder::new(1).item(primary));
    let description = container.describe_at(0).unwrap();
    assert_eq!(
        description.color_space.name,
        Some(ColorSpaceName::GenericGray)
    );
}

struct FlatDecoder;

impl PayloadDecoder for FlatDecoder {
    fn supports(&self, item: &PayloadItem<'_>) -> bool {
        item.item_type.0 == *b"hvc1"
    }

    fn decode_gray8(&self, item: &PayloadItem<'_>) -> Result<RawPlane, GainMapError> {
        let extents = item.extents.unwrap();
        Ok(RawPlane {
            data: vec![128; (extents.width * extents.height) as usize],
            width: extents.width,
            height: extents.height,
            bytes_per_row: extents.width as usize,
        })
    }
}

#[test]
fn coded_gain_map_needs_a_decoder() {
    let coded = Item::new(2, b"hvc1", vec![0, 0, 0, 1])
        .hidden()
        .property(ispe(6, 3))
        .property(auxc(GAIN_MAP_URN));
    let builder = HeifBuilder::new(1)
        .item(primary_item())
        .item(coded)
        .reference(b"auxl", 2, 1);

    let container = open(&builder);
    let result = extract_gain_map(&container);
    if cfg!(feature = "libheif") {
        assert!(matches!(result, Err(GainMapError::Codec(_))));
    } else {
        assert!(matches!(result, Err(GainMapError::UnsupportedFormat(_))));
    }

    let container = open(&builder).with_decoder(Box::new(FlatDecoder));
    let gain_map = extract_gain_map(&container).unwrap().unwrap();
    assert_eq!(gain_map.image.as_luma8().unwrap().dimensions(), (6, 3));
}

#[test]
fn unreadable_inputs() {
    assert!(matches!(
        ImageContainer::from_bytes(b"definitely not an image".to_vec()),
        Err(GainMapError::UnreadableContainer(_))
    ));

    let mut ftyp = b"isom".to_vec();
    ftyp.extend_from_slice(&0u32.to_be_bytes());
    ftyp.extend_from_slice(b"isomiso2");
    assert!(matches!(
        ImageContainer::from_bytes(make_box(b"ftyp", &ftyp)),
        Err(GainMapError::UnreadableContainer(_))
    ));

    let mut truncated = gain_map_heif(8, 8, 0).build();
    truncated.truncate(40);
    assert!(ImageContainer::from_bytes(truncated).is_err());
}

#[test]
fn missing_file_is_io_error() {
    assert!(matches!(
        ImageContainer::open("/nonexistent/IMG_0000.heic"),
        Err(GainMapError::Io(_))
    ));
}
