//! Layer payload decoding: csv or base64 text, optionally compressed, into
//! a flat sequence of raw cells.

use std::io::Read;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::MapError;
use crate::gid::Gid;

/// How a data payload's text is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Comma/whitespace separated decimal cell values. The default when the
    /// document declares no encoding.
    Csv,
    /// Base64 text wrapping little-endian 32-bit cells.
    Base64,
}

impl Encoding {
    pub(crate) fn from_attr(value: Option<&str>) -> Result<Self, MapError> {
        match value {
            None | Some("csv") => Ok(Encoding::Csv),
            Some("base64") => Ok(Encoding::Base64),
            Some(other) => Err(MapError::MalformedDocument {
                element: "data".into(),
                attribute: "encoding".into(),
                detail: format!("unknown encoding '{}'", other),
            }),
        }
    }
}

/// Compression applied to a base64 payload before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zlib,
    Gzip,
}

impl Compression {
    pub(crate) fn from_attr(value: Option<&str>) -> Result<Self, MapError> {
        match value {
            None => Ok(Compression::None),
            Some("zlib") => Ok(Compression::Zlib),
            Some("gzip") => Ok(Compression::Gzip),
            Some(other) => Err(MapError::UnsupportedCompression {
                value: other.into(),
                detail: "unknown compression scheme".into(),
            }),
        }
    }
}

/// Decode one payload into exactly `expected` cells.
///
/// The cell count is checked against `expected` and a mismatch is an error;
/// the decoder never pads or truncates to make a payload fit.
pub fn decode_cells(
    encoding: Encoding,
    compression: Compression,
    text: &str,
    expected: usize,
) -> Result<Vec<Gid>, MapError> {
    let cells = match encoding {
        Encoding::Csv => {
            if compression != Compression::None {
                let scheme = if compression == Compression::Zlib { "zlib" } else { "gzip" };
                return Err(MapError::UnsupportedCompression {
                    value: scheme.into(),
                    detail: "csv payloads cannot be compressed".into(),
                });
            }
            decode_csv(text)?
        }
        Encoding::Base64 => {
            let raw = BASE64
                .decode(text.trim())
                .map_err(|e| MapError::MalformedPayload { detail: format!("bad base64: {}", e) })?;
            let raw = match compression {
                Compression::None => raw,
                Compression::Zlib => inflate(ZlibDecoder::new(&raw[..]), "zlib")?,
                Compression::Gzip => inflate(GzDecoder::new(&raw[..]), "gzip")?,
            };
            cells_from_le_bytes(&raw)?
        }
    };

    if cells.len() != expected {
        return Err(MapError::CellCountMismatch { expected, actual: cells.len() });
    }
    Ok(cells)
}

fn decode_csv(text: &str) -> Result<Vec<Gid>, MapError> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u32>()
                .map(Gid)
                .map_err(|_| MapError::MalformedPayload {
                    detail: format!("invalid cell value '{}'", token),
                })
        })
        .collect()
}

fn inflate<R: Read>(mut decoder: R, scheme: &str) -> Result<Vec<u8>, MapError> {
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| MapError::UnsupportedCompression {
            value: scheme.into(),
            detail: e.to_string(),
        })?;
    Ok(out)
}

fn cells_from_le_bytes(raw: &[u8]) -> Result<Vec<Gid>, MapError> {
    if raw.len() % 4 != 0 {
        return Err(MapError::MalformedPayload {
            detail: format!("{} data bytes is not a whole number of cells", raw.len()),
        });
    }
    Ok(raw
        .chunks_exact(4)
        .map(|c| Gid(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // [1, 2, 3, 4] as little-endian u32s, in each wire form
    const PLAIN: &str = "AQAAAAIAAAADAAAABAAAAA==";
    const ZLIB: &str = "eJxjZGBgYAJiZiBmAWIAAGAACw==";
    const GZIP: &str = "H4sIAAAAAAACA2NkYGBgAmJmIGYBYgDv1AWvEAAAAA==";

    fn ids(cells: &[Gid]) -> Vec<u32> {
        cells.iter().map(|c| c.raw()).collect()
    }

    #[test]
    fn decodes_csv_with_newlines() {
        let cells = decode_cells(Encoding::Csv, Compression::None, "1, 2,\n3,4", 4).unwrap();
        assert_eq!(ids(&cells), [1, 2, 3, 4]);
    }

    #[test]
    fn csv_rejects_non_numeric_tokens() {
        let err = decode_cells(Encoding::Csv, Compression::None, "1,x,3", 3).unwrap_err();
        assert!(matches!(err, MapError::MalformedPayload { .. }));
    }

    #[test]
    fn decodes_base64_little_endian() {
        let cells = decode_cells(Encoding::Base64, Compression::None, PLAIN, 4).unwrap();
        assert_eq!(ids(&cells), [1, 2, 3, 4]);
    }

    #[test]
    fn decodes_zlib_and_gzip_payloads() {
        let z = decode_cells(Encoding::Base64, Compression::Zlib, ZLIB, 4).unwrap();
        let g = decode_cells(Encoding::Base64, Compression::Gzip, GZIP, 4).unwrap();
        assert_eq!(ids(&z), [1, 2, 3, 4]);
        assert_eq!(ids(&g), [1, 2, 3, 4]);
    }

    #[test]
    fn same_blob_decodes_identically_twice() {
        let first = decode_cells(Encoding::Base64, Compression::Zlib, ZLIB, 4).unwrap();
        let second = decode_cells(Encoding::Base64, Compression::Zlib, ZLIB, 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cell_count_mismatch_names_both_counts() {
        let err = decode_cells(Encoding::Csv, Compression::None, "1,2,3", 4).unwrap_err();
        assert_eq!(err, MapError::CellCountMismatch { expected: 4, actual: 3 });
    }

    #[test]
    fn truncated_zlib_stream_reports_the_scheme() {
        // the first few bytes of a valid stream, cut short
        let err = decode_cells(Encoding::Base64, Compression::Zlib, "eJxjZGA=", 4).unwrap_err();
        match err {
            MapError::UnsupportedCompression { value, .. } => assert_eq!(value, "zlib"),
            other => panic!("expected UnsupportedCompression, got {:?}", other),
        }
    }

    #[test]
    fn ragged_byte_count_is_rejected() {
        // 6 bytes, not a multiple of 4
        let err = decode_cells(Encoding::Base64, Compression::None, "AQAAAAIA", 2).unwrap_err();
        assert!(matches!(err, MapError::MalformedPayload { .. }));
    }
}
