/// Content codec: raw bytes and UTF-8 text to and from the base64 transfer encoding.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result};

/// Encode a byte payload for a contents write.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 payload as returned by the remote.
///
/// The remote wraps long payloads with newlines, so ASCII whitespace is
/// stripped before decoding.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::Malformed(format!("invalid base64 payload: {e}")))
}

/// Encode UTF-8 text. Operates on the UTF-8 bytes, never on UTF-16 units.
pub fn encode_text(text: &str) -> String {
    encode(text.as_bytes())
}

/// Decode the payload of the file at `path` and validate it as UTF-8.
pub fn decode_text(encoded: &str, path: &str) -> Result<String> {
    let bytes = decode(encoded)?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidText {
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_outside_bmp_survives() {
        let text = "héllo 世界 🦀𝄞 done";
        let encoded = encode_text(text);
        assert_eq!(decode_text(&encoded, "notes.md").unwrap(), text);
    }

    #[test]
    fn every_byte_value_survives() {
        let bytes: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
        assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn empty_payload() {
        assert_eq!(encode(b""), "");
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn encoding_is_deterministic() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        assert_eq!(encode(&png_header), encode(&png_header));
        assert_eq!(encode(&png_header), "iVBORw0KGgo=");
    }

    #[test]
    fn wrapped_payload_from_remote() {
        let wrapped = "aGVsbG8g\nd29ybGQ=\n";
        assert_eq!(decode_text(wrapped, "hello.txt").unwrap(), "hello world");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let encoded = encode(&[0xff, 0xfe, 0x00]);
        let err = decode_text(&encoded, "img/logo.png").unwrap_err();
        assert!(matches!(err, Error::InvalidText { ref path } if path == "img/logo.png"));
        assert_eq!(err.to_string(), "content of img/logo.png is not valid UTF-8");
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(decode("not base64!"), Err(Error::Malformed(_))));
    }
}
