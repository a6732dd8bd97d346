//! Base64 text encoding for key material and ciphertext.
//!
//! Encoding is canonical (standard alphabet, padded). Decoding is lenient so
//! that values written by hand into configuration still load: ASCII
//! whitespace anywhere in the text is ignored (line-wrapped values decode),
//! `=` padding is optional and its count is not checked, and non-zero
//! trailing bits are accepted. Text made only of padding is rejected.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
        DecodePaddingMode,
    },
    DecodeError, Engine as _,
};

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Encode bytes as padded standard Base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode Base64 text, tolerating missing or surplus `=` padding.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the text contains characters outside the
/// standard alphabet, has an impossible length, or holds nothing but `=`.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let symbols = compact.trim_end_matches('=');
    if symbols.is_empty() && !compact.is_empty() {
        return Err(DecodeError::InvalidPadding);
    }
    LENIENT.decode(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_canonical_key() {
        assert_eq!(
            decode("rigeU7mR2zA=").unwrap(),
            [174, 40, 30, 83, 185, 145, 219, 48]
        );
    }

    #[test]
    fn tolerates_short_padding() {
        // 26 significant characters need two `=`; only one is present.
        let bytes = decode("5ffasfasg4w/stkaYXm/+Mi4Aw=").unwrap();
        assert_eq!(bytes.len(), 19);
        assert_eq!(bytes[..3], [229, 247, 218]);
    }

    #[test]
    fn tolerates_missing_padding_and_whitespace() {
        assert_eq!(decode("  aGk ").unwrap(), b"hi");
        assert_eq!(decode("aGk").unwrap(), decode("aGk=").unwrap());
    }

    #[test]
    fn blank_decodes_to_nothing() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("   ").unwrap().is_empty());
    }

    #[test]
    fn ignores_interior_whitespace() {
        assert_eq!(
            decode("4+xz0sKZ\r\nYMUEF7bU\n6tZ20A==").unwrap(),
            decode("4+xz0sKZYMUEF7bU6tZ20A==").unwrap()
        );
        assert_eq!(decode("aG\tk =").unwrap(), b"hi");
    }

    #[test]
    fn rejects_padding_only() {
        for text in ["=", "==", " = ", "===="] {
            assert!(
                matches!(decode(text), Err(DecodeError::InvalidPadding)),
                "text {text:?}"
            );
        }
    }

    #[test]
    fn rejects_foreign_characters() {
        assert!(decode("not-valid-base64!!").is_err());
    }

    #[test]
    fn rejects_impossible_length() {
        assert!(decode("abcde").is_err());
    }

    #[test]
    fn encode_is_padded() {
        assert_eq!(encode(b"hi"), "aGk=");
    }
}
