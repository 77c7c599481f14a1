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
use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Keys produced by the metadata reader. Matching is exact, keys are never
/// case folded.
pub mod keys {
    pub const PIXEL_WIDTH: &str = "PixelWidth";
    pub const PIXEL_HEIGHT: &str = "PixelHeight";
    pub const DEPTH: &str = "Depth";
    pub const PROFILE_NAME: &str = "ProfileName";
    pub const HEADROOM: &str = "Headroom";
    pub const AUXILIARY_DATA: &str = "AuxiliaryData";
    pub const HDR_GAIN_MAP_VERSION: &str = "HDRGainMapVersion";
    pub const HDR_GAIN_MAP_HEADROOM: &str = "HDRGainMapHeadroom";

    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const BYTES_PER_ROW: &str = "BytesPerRow";
    pub const PIXEL_FORMAT: &str = "PixelFormat";
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Dictionary(PropertyBag),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Integer view of the value.
    ///
    /// Floats without a fractional part are accepted, matching how numeric
    /// metadata bridges to integers. Strings never convert.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(v) => Some(*v),
            PropertyValue::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 {
                    v.to_i64()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(v) => v.to_f64(),
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&PropertyBag> {
        match self {
            PropertyValue::Dictionary(v) => Some(v),
            _ => None,
        }
    }

    /// Parses textual metadata, integers first then floats, falling back to a string
    pub fn from_text(text: &str) -> PropertyValue {
        let trimmed = text.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            PropertyValue::Integer(v)
        } else if let Ok(v) = trimmed.parse::<f64>() {
            PropertyValue::Float(v)
        } else {
            PropertyValue::String(trimmed.to_string())
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<PropertyBag> for PropertyValue {
    fn from(value: PropertyBag) -> Self {
        PropertyValue::Dictionary(value)
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::String(v) => write!(f, "\"{}\"", v),
            PropertyValue::Integer(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Dictionary(v) => write!(f, "{}", v),
        }
    }
}

/// Snapshot of string keyed metadata taken when a container is opened
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(PropertyValue::as_integer)
    }

    pub fn get_dictionary(&self, key: &str) -> Option<&PropertyBag> {
        self.get(key).and_then(PropertyValue::as_dictionary)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies every entry of `other` over this bag
    pub fn merge(&mut self, other: PropertyBag) {
        self.entries.extend(other.entries);
    }
}

impl Display for PropertyBag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_view_accepts_integral_floats_only() {
        assert_eq!(PropertyValue::Integer(1).as_integer(), Some(1));
        assert_eq!(PropertyValue::Float(1.0).as_integer(), Some(1));
        assert_eq!(PropertyValue::Float(1.5).as_integer(), None);
        assert_eq!(PropertyValue::from("1").as_integer(), None);
    }

    #[test]
    fn text_parsing_prefers_integers() {
        assert_eq!(
            PropertyValue::from_text(" 65536 "),
            PropertyValue::Integer(65536)
        );
        assert_eq!(PropertyValue::from_text("2.5"), PropertyValue::Float(2.5));
        assert_eq!(
            PropertyValue::from_text("1.0.0"),
            PropertyValue::String("1.0.0".to_string())
        );
    }

    #[test]
    fn keys_are_matched_exactly() {
        let mut bag = PropertyBag::new();
        bag.insert(keys::PROFILE_NAME, "Display P3");
        assert_eq!(bag.get_str("ProfileName"), Some("Display P3"));
        assert!(bag.get("profilename").is_none());
    }

    #[test]
    fn nested_dictionaries_are_reachable() {
        let mut aux = PropertyBag::new();
        aux.insert(keys::HDR_GAIN_MAP_VERSION, "65536");
        let mut bag = PropertyBag::new();
        bag.insert(keys::AUXILIARY_DATA, aux);
        let version = bag
            .get_dictionary(keys::AUXILIARY_DATA)
            .and_then(|v| v.get_str(keys::HDR_GAIN_MAP_VERSION));
        assert_eq!(version, Some("65536"));
    }
}
