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
use crate::extract::{extract_gain_map, gain_map_version};
use crate::hdr::HdrReport;
use crate::reader::ImageContainer;
use crate::writer::{gain_map_file_name, write, OutputFormat};
use crate::GainMapError;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input: PathBuf,
    /// Directory the gain map is written to
    pub output_dir: PathBuf,
    pub format: OutputFormat,
}

impl PipelineConfig {
    /// Writes BMP files into the process temp directory
    pub fn new(input: impl Into<PathBuf>) -> PipelineConfig {
        PipelineConfig {
            input: input.into(),
            output_dir: std::env::temp_dir(),
            format: OutputFormat::Bmp,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> PipelineConfig {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> PipelineConfig {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub hdr: HdrReport,
    pub gain_map_version: Option<String>,
    /// `None` when the image carries no gain map
    pub gain_map_path: Option<PathBuf>,
}

/// Classifies the first image, then extracts and writes its gain map
pub fn run(config: &PipelineConfig) -> Result<PipelineReport, GainMapError> {
    info!("image: {}", config.input.display());
    let container = ImageContainer::open(&config.input)?;

    let properties = container.properties_at(0)?;
    let description = container.describe_at(0)?;
    let hdr = HdrReport::collect(&description, &properties);
    hdr.log();

    let version = gain_map_version(&properties).map(|v| v.to_string());
    if let Some(version) = version.as_deref() {
        info!("GainMap Version is {}", version);
    }

    let Some(gain_map) = extract_gain_map(&container)? else {
        warn!("{} has no HDR gain map", config.input.display());
        return Ok(PipelineReport {
            hdr,
            gain_map_version: version,
            gain_map_path: None,
        });
    };

    let output = config
        .output_dir
        .join(gain_map_file_name(&config.input, config.format));
    write(&gain_map, &output, config.format)?;

    Ok(PipelineReport {
        hdr,
        gain_map_version: version,
        gain_map_path: Some(output),
    })
}
