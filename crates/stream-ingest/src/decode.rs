//! Text decoding with an ordered encoding fallback chain.

use encoding_rs::{SHIFT_JIS, WINDOWS_1252};
use stream_model::TextEncoding;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Decoded report text and the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

impl DecodedText {
    /// Try each encoding in order and keep the first clean decode.
    ///
    /// A UTF-8 byte order mark is stripped before the UTF-8 attempt.
    pub fn decode(bytes: &[u8], chain: &[TextEncoding]) -> Result<Self> {
        for encoding in chain {
            if let Some(text) = decode_with(bytes, *encoding) {
                debug!(encoding = %encoding, "Decoded report text");
                return Ok(Self {
                    text,
                    encoding: *encoding,
                });
            }
            debug!(encoding = %encoding, "Encoding rejected");
        }
        Err(IngestError::Undecodable {
            tried: chain.to_vec(),
        })
    }
}

fn decode_with(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf8 => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            std::str::from_utf8(bytes).ok().map(str::to_string)
        }
        TextEncoding::Windows1252 => WINDOWS_1252
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned()),
        TextEncoding::ShiftJis => SHIFT_JIS
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned()),
        TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_CHAIN: [TextEncoding; 3] = TextEncoding::FALLBACK_CHAIN;

    #[test]
    fn utf8_with_bom_is_stripped() {
        let decoded = DecodedText::decode(b"\xEF\xBB\xBFartist\ttrack", &DEFAULT_CHAIN).unwrap();
        assert_eq!(decoded.text, "artist\ttrack");
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn cp1252_bytes_fall_back() {
        // "Beyoncé" with é as 0xE9
        let decoded = DecodedText::decode(b"Beyonc\xE9", &DEFAULT_CHAIN).unwrap();
        assert_eq!(decoded.text, "Beyoncé");
        assert_eq!(decoded.encoding, TextEncoding::Windows1252);
    }

    #[test]
    fn cp1252_maps_smart_quotes() {
        let decoded = DecodedText::decode(b"\x93hit\x94", &DEFAULT_CHAIN).unwrap();
        assert_eq!(decoded.text, "\u{201c}hit\u{201d}");
    }

    #[test]
    fn shift_jis_hint_is_tried_before_cp1252() {
        // "音楽" in Shift_JIS
        let bytes = b"\x89\xb9\x8a\x79";
        let chain = [
            TextEncoding::Utf8,
            TextEncoding::ShiftJis,
            TextEncoding::Windows1252,
        ];
        let decoded = DecodedText::decode(bytes, &chain).unwrap();
        assert_eq!(decoded.text, "音楽");
        assert_eq!(decoded.encoding, TextEncoding::ShiftJis);
    }

    #[test]
    fn latin1_decodes_every_byte() {
        let decoded = DecodedText::decode(b"\xFF\xFE", &[TextEncoding::Latin1]).unwrap();
        assert_eq!(decoded.text, "\u{ff}\u{fe}");
    }

    #[test]
    fn exhausted_chain_is_an_error() {
        let err = DecodedText::decode(b"\xFF\xFE\xFD", &[TextEncoding::Utf8]).unwrap_err();
        assert!(matches!(err, IngestError::Undecodable { .. }));
    }
}
