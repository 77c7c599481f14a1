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
use std::error::Error;
use std::fmt::Display;

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
/// Shows size mismatching
pub struct MismatchedSize {
    pub expected: usize,
    pub received: usize,
}

#[derive(Debug)]
pub enum GainMapError {
    /// Bytes are not a container format we can open
    UnreadableContainer(&'static str),
    /// Frame index past the last image in the container
    IndexOutOfRange {
        index: usize,
        count: usize,
    },
    /// Auxiliary description record is missing or has an invalid field
    MalformedDescriptor(&'static str),
    /// Raw buffer is shorter than `bytes_per_row * height`
    TruncatedBuffer(MismatchedSize),
    /// Pixel layout or codec can't be handled by the requested format
    UnsupportedFormat(String),
    /// Encoder or decoder failure reported by the image codec
    Codec(String),
    Io(std::io::Error),
}

impl Display for GainMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainMapError::UnreadableContainer(msg) => write!(f, "Unreadable container: {}", msg),
            GainMapError::IndexOutOfRange { index, count } => f.write_fmt(format_args!(
                "Image index {} is out of range, container has {} images",
                index, count
            )),
            GainMapError::MalformedDescriptor(field) => {
                write!(f, "Malformed auxiliary data description: {}", field)
            }
            GainMapError::TruncatedBuffer(size) => f.write_fmt(format_args!(
                "Auxiliary buffer is truncated: expected at least {} bytes, received {}",
                size.expected, size.received
            )),
            GainMapError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            GainMapError::Codec(msg) => write!(f, "Codec failure: {}", msg),
            GainMapError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for GainMapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GainMapError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GainMapError {
    fn from(value: std::io::Error) -> Self {
        GainMapError::Io(value)
    }
}

impl From<image::ImageError> for GainMapError {
    fn from(value: image::ImageError) -> Self {
        match value {
            image::ImageError::IoError(err) => GainMapError::Io(err),
            image::ImageError::Unsupported(err) => GainMapError::UnsupportedFormat(err.to_string()),
            other => GainMapError::Codec(other.to_string()),
        }
    }
}
