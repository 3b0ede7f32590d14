//! Base64 encoding for the image and audio payloads
//!
//! Images go out on the standard alphabet with padding and no line wrapping.
//! Audio coming back is decoded leniently: embedded whitespace and missing
//! padding are accepted, anything else outside the alphabet is rejected.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;

use crate::{Error, Result};

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode raw JPEG bytes for an [`ImageRequest`](crate::protocol::ImageRequest)
#[must_use]
pub fn encode_image(jpeg: &[u8]) -> String {
    STANDARD.encode(jpeg)
}

/// Decode the `audio` field of an [`ImageResponse`](crate::protocol::ImageResponse)
///
/// # Errors
///
/// Returns [`Error::Decode`] if the input is not valid Base64
pub fn decode_audio(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    LENIENT
        .decode(compact.as_bytes())
        .map_err(|e| Error::Decode(format!("invalid base64 audio: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_bytes() {
        let samples: [&[u8]; 4] = [b"", b"f", b"\xff\xd8\xff\xe0jpeg", &[0u8; 1024]];
        for bytes in samples {
            assert_eq!(decode_audio(&encode_image(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn encoded_image_has_no_line_breaks() {
        let encoded = encode_image(&[7u8; 4096]);
        assert!(!encoded.contains('\n'));
        assert!(!encoded.contains('\r'));
    }

    #[test]
    fn decode_accepts_wrapped_lines() {
        assert_eq!(decode_audio("SGVs\nbG8=\r\n").unwrap(), b"Hello");
    }

    #[test]
    fn decode_accepts_missing_padding() {
        assert_eq!(decode_audio("SGVsbG8").unwrap(), b"Hello");
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_audio("not-valid-base64!!").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn decode_of_empty_string_is_empty() {
        assert!(decode_audio("").unwrap().is_empty());
    }
}
