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
use crate::property::{keys, PropertyBag, PropertyValue};

/// Values picked out of an XMP packet
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct XmpFields {
    /// `HDRGainMapVersion` and `HDRGainMapHeadroom` when present
    pub(crate) gain_map: PropertyBag,
    pub(crate) headroom: Option<PropertyValue>,
}

#[cfg_attr(not(feature = "xmp"), allow(dead_code))]
impl XmpFields {
    pub(crate) fn is_empty(&self) -> bool {
        self.gain_map.is_empty() && self.headroom.is_none()
    }

    fn accept(&mut self, local_name: &[u8], value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match local_name {
            b"HDRGainMapVersion" => {
                self.gain_map.insert(
                    keys::HDR_GAIN_MAP_VERSION,
                    PropertyValue::String(value.to_string()),
                );
            }
            b"HDRGainMapHeadroom" => {
                self.gain_map
                    .insert(keys::HDR_GAIN_MAP_HEADROOM, PropertyValue::from_text(value));
            }
            b"Headroom" => {
                if self.headroom.is_none() {
                    self.headroom = Some(PropertyValue::from_text(value));
                }
            }
            _ => {}
        }
    }
}

/// Scans an XMP packet, values may be attributes or element text.
///
/// Unparsable packets are logged and yield whatever was read before the error.
#[cfg(feature = "xmp")]
pub(crate) fn read_xmp(data: &[u8]) -> XmpFields {
    use log::warn;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut fields = XmpFields::default();
    let data = match data.iter().rposition(|&b| b != 0) {
        Some(last) => &data[..=last],
        None => return fields,
    };
    let text = match std::str::from_utf8(data) {
        Ok(text) => text,
        Err(err) => {
            warn!("XMP packet is not UTF-8: {}", err);
            return fields;
        }
    };

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                for attribute in e.attributes().flatten() {
                    if let Ok(value) = attribute.unescape_value() {
                        fields.accept(attribute.key.local_name().as_ref(), &value);
                    }
                }
                current = Some(e.local_name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                for attribute in e.attributes().flatten() {
                    if let Ok(value) = attribute.unescape_value() {
                        fields.accept(attribute.key.local_name().as_ref(), &value);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(name) = current.as_deref() {
                    match t.unescape() {
                        Ok(value) => fields.accept(name, &value),
                        Err(err) => warn!("Bad XMP text: {}", err),
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(
                    "Unparsable XMP at position {}: {}",
                    reader.error_position(),
                    err
                );
                break;
            }
        }
    }
    fields
}

#[cfg(not(feature = "xmp"))]
pub(crate) fn read_xmp(_: &[u8]) -> XmpFields {
    XmpFields::default()
}

/// True when a metadata item looks like XMP
pub(crate) fn is_xmp_content_type(content_type: &str) -> bool {
    content_type.eq_ignore_ascii_case("application/rdf+xml")
}

#[cfg(all(test, feature = "xmp"))]
mod tests {
    use super::*;

    const GAIN_MAP_XMP: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:HDRGainMap="http://ns.apple.com/HDRGainMap/1.0/"
    HDRGainMap:HDRGainMapVersion="65536">
   <HDRGainMap:HDRGainMapHeadroom>3.5</HDRGainMap:HDRGainMapHeadroom>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    #[test]
    fn reads_attributes_and_elements() {
        let fields = read_xmp(GAIN_MAP_XMP.as_bytes());
        assert_eq!(
            fields.gain_map.get_str(keys::HDR_GAIN_MAP_VERSION),
            Some("65536")
        );
        assert_eq!(
            fields.gain_map.get(keys::HDR_GAIN_MAP_HEADROOM),
            Some(&PropertyValue::Float(3.5))
        );
        assert!(fields.headroom.is_none());
    }

    #[test]
    fn headroom_integer_text() {
        let xmp = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description xmlns:apple="http://ns.apple.com/" apple:Headroom="1"/></rdf:RDF></x:xmpmeta>"#;
        let fields = read_xmp(xmp.as_bytes());
        assert_eq!(fields.headroom, Some(PropertyValue::Integer(1)));
        assert!(fields.gain_map.is_empty());
    }

    #[test]
    fn trailing_padding_ignored() {
        let mut data = GAIN_MAP_XMP.as_bytes().to_vec();
        data.extend_from_slice(&[0u8; 16]);
        let fields = read_xmp(&data);
        assert!(!fields.is_empty());
    }

    #[test]
    fn broken_packet_keeps_partial_result() {
        let xmp = r#"<a HDRGainMapVersion="1"><b></c>"#;
        let fields = read_xmp(xmp.as_bytes());
        assert_eq!(
            fields.gain_map.get_str(keys::HDR_GAIN_MAP_VERSION),
            Some("1")
        );
    }

    #[test]
    fn not_utf8() {
        let fields = read_xmp(&[0xff, 0xfe, 0x3c]);
        assert!(fields.is_empty());
    }
}
