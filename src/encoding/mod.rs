//! Encoding detection and transcoding of input files.
//!
//! Formatting works on UTF-8 text. Files are decoded by sniffing a Byte
//! Order Mark and, failing that, the `encoding` pseudo-attribute of the XML
//! declaration (XML 1.0 Appendix F), and written back in the encoding they
//! were read in, BOM included.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::error::EncodingError;

/// Text decoded from bytes, with what is needed to encode it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The decoded text, without BOM.
    pub text: String,
    /// The encoding the bytes were in.
    pub encoding: &'static Encoding,
    /// Whether the bytes started with a BOM.
    pub bom: bool,
}

/// Detects the encoding announced by a Byte Order Mark.
///
/// Returns the encoding and the length of the BOM.
///
/// # Examples
///
/// ```
/// use xmlfmt::encoding::detect_bom;
///
/// let (encoding, skip) = detect_bom(b"\xEF\xBB\xBF<a/>").unwrap();
/// assert_eq!(encoding.name(), "UTF-8");
/// assert_eq!(skip, 3);
/// assert!(detect_bom(b"<a/>").is_none());
/// ```
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    Encoding::for_bom(bytes)
}

/// Decodes XML bytes to UTF-8.
///
/// A BOM wins over everything else. Without one, the bytes are read as
/// UTF-8 unless the XML declaration names another encoding.
///
/// # Errors
///
/// Returns `EncodingError` if the declared encoding is unknown or the bytes
/// are malformed for the chosen encoding.
///
/// # Examples
///
/// ```
/// use xmlfmt::encoding::decode;
///
/// let decoded = decode(b"<?xml version='1.0' encoding='ISO-8859-1'?><a>caf\xE9</a>").unwrap();
/// assert_eq!(decoded.encoding.name(), "windows-1252");
/// assert!(decoded.text.ends_with("<a>caf\u{e9}</a>"));
/// ```
pub fn decode(bytes: &[u8]) -> Result<Decoded, EncodingError> {
    if let Some((encoding, skip)) = detect_bom(bytes) {
        let text = decode_with(encoding, &bytes[skip..])?;
        return Ok(Decoded {
            text,
            encoding,
            bom: true,
        });
    }
    let encoding = match declared_encoding(bytes) {
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| EncodingError::Unsupported(label.clone()))?,
        None => UTF_8,
    };
    // a UTF-16 declaration without a BOM is read as UTF-8
    let encoding = if encoding == UTF_16LE || encoding == UTF_16BE {
        UTF_8
    } else {
        encoding
    };
    Ok(Decoded {
        text: decode_with(encoding, bytes)?,
        encoding,
        bom: false,
    })
}

/// Encodes `text` back into the encoding of `original`.
///
/// # Errors
///
/// Returns `EncodingError::Unmappable` if `text` holds characters the
/// encoding cannot represent.
pub fn encode(text: &str, original: &Decoded) -> Result<Vec<u8>, EncodingError> {
    let encoding = original.encoding;
    let mut out = Vec::with_capacity(text.len() + 3);
    if encoding == UTF_16LE || encoding == UTF_16BE {
        let little = encoding == UTF_16LE;
        if original.bom {
            out.extend_from_slice(if little { &[0xFF, 0xFE] } else { &[0xFE, 0xFF] });
        }
        for unit in text.encode_utf16() {
            out.extend_from_slice(&if little { unit.to_le_bytes() } else { unit.to_be_bytes() });
        }
        return Ok(out);
    }
    if original.bom {
        out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
    }
    let (bytes, _, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(EncodingError::Unmappable(encoding.name()));
    }
    out.extend_from_slice(&bytes);
    Ok(out)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, EncodingError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::Malformed(encoding.name()));
    }
    Ok(text.into_owned())
}

/// Reads the `encoding` pseudo-attribute of a leading XML declaration,
/// treating the bytes as ASCII.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = head.windows(2).position(|w| w == b"?>")?;
    let decl = &head[..decl_end];
    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = skip_whitespace(&decl[at + 8..]);
    let rest = skip_whitespace(rest.strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = rest.iter().position(|&b| b == quote)?;
    let label = &rest[..end];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_plain_utf8() {
        let decoded = decode(b"<a>h\xC3\xA9</a>").unwrap();
        assert_eq!(decoded.text, "<a>h\u{e9}</a>");
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.bom);
    }

    #[test]
    fn test_decode_utf8_bom() {
        let decoded = decode(b"\xEF\xBB\xBF<a/>").unwrap();
        assert_eq!(decoded.text, "<a/>");
        assert!(decoded.bom);
    }

    #[test]
    fn test_decode_utf16le_bom() {
        let decoded = decode(b"\xFF\xFE<\x00a\x00/\x00>\x00").unwrap();
        assert_eq!(decoded.text, "<a/>");
        assert_eq!(decoded.encoding, UTF_16LE);
    }

    #[test]
    fn test_declared_encoding_single_quotes() {
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding = 'ISO-8859-1'?><a/>"),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(declared_encoding(b"<?xml version='1.0'?><a/>"), None);
        assert_eq!(declared_encoding(b"<a/>"), None);
    }

    #[test]
    fn test_unknown_declared_encoding() {
        let err = decode(b"<?xml version='1.0' encoding='X-NOPE'?><a/>").unwrap_err();
        assert_eq!(err, EncodingError::Unsupported("X-NOPE".to_string()));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(decode(&[0x80, 0x81, 0x82]), Err(EncodingError::Malformed(_))));
    }

    #[test]
    fn test_encode_restores_original_bytes() {
        for bytes in [
            &b"\xEF\xBB\xBF<a>x</a>"[..],
            &b"\xFE\xFF\x00<\x00a\x00/\x00>"[..],
            &b"<?xml version='1.0' encoding='ISO-8859-1'?><a>caf\xE9</a>"[..],
        ] {
            let decoded = decode(bytes).unwrap();
            assert_eq!(encode(&decoded.text, &decoded).unwrap(), bytes);
        }
    }
}
