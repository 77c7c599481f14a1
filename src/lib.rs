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
mod codec;
mod color_space;
mod err;
mod extract;
mod gain_image;
pub mod hdr;
pub mod heif;
#[cfg(feature = "libheif")]
mod libheif;
pub mod pipeline;
mod property;
mod reader;
mod writer;
mod xmp;

pub use codec::{
    PayloadDecoder, PayloadItem, RasterPayloadDecoder, RawPlane, SyncPayloadDecoder,
    UncompressedDecoder,
};
pub use color_space::{ColorSpace, ColorSpaceName};
pub use err::{GainMapError, MismatchedSize};
pub use extract::{extract_gain_map, gain_map_version, HDR_GAIN_MAP_TYPE};
pub use gain_image::{DecodedImage, GainImage, PixelFormat, RawBufferDescriptor};
pub use hdr::{
    has_extended_range_name, has_gain_map_hdr, image_color_depth, is_image_hdr, is_image_hdr_v2,
    uses_itur_2100_tf, Capabilities, ColorInfo, HdrReport,
};
#[cfg(feature = "libheif")]
pub use libheif::HeifPayloadDecoder;
pub use pipeline::{PipelineConfig, PipelineReport};
pub use property::{keys, PropertyBag, PropertyValue};
pub use reader::{AuxiliaryDataEntry, ImageContainer, ImageDescription};
pub use writer::{gain_map_file_name, write, write_to, OutputFormat};
