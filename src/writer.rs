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
use crate::gain_image::DecodedImage;
use crate::GainMapError;
use image::{ColorType, ImageFormat};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

/// Raster formats a decoded image can be written to
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Bmp,
    Png,
    Tiff,
    /// Radiance RGBE, RGB float only
    Hdr,
}

impl OutputFormat {
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Hdr => ImageFormat::Hdr,
        }
    }

    /// Upper case file extension
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Bmp => "BMP",
            OutputFormat::Png => "PNG",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Hdr => "HDR",
        }
    }

    /// Whether the format stores this pixel layout as is
    pub fn supports(self, color_type: ColorType) -> bool {
        match self {
            OutputFormat::Bmp => matches!(
                color_type,
                ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
            ),
            OutputFormat::Png => matches!(
                color_type,
                ColorType::L8
                    | ColorType::La8
                    | ColorType::Rgb8
                    | ColorType::Rgba8
                    | ColorType::L16
                    | ColorType::La16
                    | ColorType::Rgb16
                    | ColorType::Rgba16
            ),
            OutputFormat::Tiff => matches!(
                color_type,
                ColorType::L8
                    | ColorType::L16
                    | ColorType::Rgb8
                    | ColorType::Rgba8
                    | ColorType::Rgb16
                    | ColorType::Rgba16
                    | ColorType::Rgb32F
                    | ColorType::Rgba32F
            ),
            OutputFormat::Hdr => color_type == ColorType::Rgb32F,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = GainMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bmp" => Ok(OutputFormat::Bmp),
            "png" => Ok(OutputFormat::Png),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "hdr" => Ok(OutputFormat::Hdr),
            _ => Err(GainMapError::UnsupportedFormat(format!(
                "unknown output format '{}'",
                s
            ))),
        }
    }
}

/// `<stem>.GAIN_MAP.<EXT>` for a source path
pub fn gain_map_file_name(source: &Path, format: OutputFormat) -> String {
    let stem = source
        .file_stem()
        .map(|v| v.to_string_lossy())
        .unwrap_or_else(|| "image".into());
    format!("{}.GAIN_MAP.{}", stem, format.extension())
}

/// Encodes a single frame, nothing else is attached
pub fn write_to<W: Write + Seek>(
    image: &DecodedImage,
    writer: &mut W,
    format: OutputFormat,
) -> Result<(), GainMapError> {
    check_layout(image, format)?;
    image.image.write_to(writer, format.image_format())?;
    Ok(())
}

fn check_layout(image: &DecodedImage, format: OutputFormat) -> Result<(), GainMapError> {
    let color_type = image.image.color();
    if !format.supports(color_type) {
        return Err(GainMapError::UnsupportedFormat(format!(
            "{} can't store {:?} pixels",
            format.extension(),
            color_type
        )));
    }
    Ok(())
}

/// Writes the image to a file, replacing an existing one
pub fn write(
    image: &DecodedImage,
    path: impl AsRef<Path>,
    format: OutputFormat,
) -> Result<(), GainMapError> {
    let path = path.as_ref();
    check_layout(image, format)?;
    write_file(path, |writer| write_to(image, writer, format))?;
    info!(
        "Wrote {}x{} image to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// Creates `path` and runs `encode` on it, the file is removed again when encoding fails
fn write_file<F>(path: &Path, encode: F) -> Result<(), GainMapError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), GainMapError>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let result = encode(&mut writer).and_then(|_| writer.flush().map_err(GainMapError::from));
    if result.is_err() {
        drop(writer);
        if let Err(err) = std::fs::remove_file(path) {
            warn!("Can't remove partial file {}: {}", path.display(), err);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::io::Cursor;

    fn gradient() -> DecodedImage {
        DecodedImage::gain_map(GrayImage::from_fn(17, 9, |x, y| Luma([(x * 13 + y * 7) as u8])))
    }

    #[test]
    fn lossless_round_trip() {
        let source = gradient();
        for format in [OutputFormat::Bmp, OutputFormat::Png, OutputFormat::Tiff] {
            let mut cursor = Cursor::new(Vec::new());
            write_to(&source, &mut cursor, format).unwrap();
            let decoded =
                image::load_from_memory_with_format(cursor.get_ref(), format.image_format())
                    .unwrap()
                    .to_luma8();
            assert_eq!(decoded.dimensions(), (17, 9), "{:?}", format);
            assert_eq!(
                decoded.as_raw(),
                source.image.as_luma8().unwrap().as_raw(),
                "{:?}",
                format
            );
        }
    }

    #[test]
    fn hdr_rejects_gray() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(matches!(
            write_to(&gradient(), &mut cursor, OutputFormat::Hdr),
            Err(GainMapError::UnsupportedFormat(_))
        ));
        assert!(cursor.get_ref().is_empty());
    }

    #[test]
    fn file_name() {
        assert_eq!(
            gain_map_file_name(Path::new("/photos/IMG_3659.heic"), OutputFormat::Bmp),
            "IMG_3659.GAIN_MAP.BMP"
        );
        assert_eq!(
            gain_map_file_name(Path::new("shot"), OutputFormat::Png),
            "shot.GAIN_MAP.PNG"
        );
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("BMP".parse::<OutputFormat>().unwrap(), OutputFormat::Bmp);
        assert_eq!("tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn writes_file() {
        let path = std::env::temp_dir().join(format!("writer-test-{}.bmp", std::process::id()));
        write(&gradient(), &path, OutputFormat::Bmp).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (17, 9));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_encoding_leaves_no_file() {
        let path = std::env::temp_dir().join(format!("writer-fail-{}.bmp", std::process::id()));
        let result = write_file(&path, |writer| {
            writer.write_all(b"BM")?;
            Err(GainMapError::Codec("encoder gave up".to_string()))
        });
        assert!(matches!(result, Err(GainMapError::Codec(_))));
        assert!(!path.exists());
    }
}
