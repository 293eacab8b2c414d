//! Encoding detection and UTF-8+LF normalization.
//!
//! Detection pipeline (first match wins): NUL byte in the first 8 KiB marks
//! the file binary; a byte-order mark identifies UTF-8-BOM/UTF-16LE/BE;
//! otherwise a full-file UTF-8 validity check; otherwise a heuristic
//! Japanese-encoding scorer picks Shift_JIS or EUC-JP.

use crate::error::CoreError;

const DETECTION_SNIFF_LEN: usize = 8 * 1024;

/// The encoding a load detected, preserved for a faithful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    ShiftJis,
    EucJp,
    /// NUL byte found in the first 8 KiB: treated as binary.
    Unknown,
}

/// Line-ending convention detected in a loaded file, preserved for save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Crlf,
    Cr,
}

impl LineEnding {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::Crlf => b"\r\n",
            LineEnding::Cr => b"\r",
        }
    }
}

/// Runs the detection pipeline of spec.md §4.5 over raw file bytes.
pub fn detect_encoding(bytes: &[u8]) -> Encoding {
    let sniff = &bytes[..bytes.len().min(DETECTION_SNIFF_LEN)];
    if sniff.contains(&0u8) {
        return Encoding::Unknown;
    }

    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Encoding::Utf8Bom;
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Encoding::Utf16Le;
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Encoding::Utf16Be;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return Encoding::Utf8;
    }

    japanese_heuristic(bytes)
}

/// Scores byte pairs against Shift_JIS- and EUC-JP-specific lead-byte
/// ranges; ties default to Shift_JIS, as spec.md §4.5 specifies.
fn japanese_heuristic(bytes: &[u8]) -> Encoding {
    let mut sjis_score: i64 = 0;
    let mut euc_score: i64 = 0;

    let mut i = 0;
    while i < bytes.len() {
        let b1 = bytes[i];
        let b2 = bytes.get(i + 1).copied();

        match b1 {
            0x8E | 0x8F => {
                // EUC-JP half-width-kana / JIS X 0212 prefix: no SJIS analog.
                euc_score += 3;
                i += 2;
                continue;
            }
            0xA1..=0xFE => {
                if let Some(b2) = b2 {
                    if (0xA1..=0xFE).contains(&b2) {
                        euc_score += 2;
                        i += 2;
                        continue;
                    }
                }
            }
            0x81..=0x9F | 0xE0..=0xEF => {
                if let Some(b2) = b2 {
                    if (0x40..=0x7E).contains(&b2) || (0x80..=0xFC).contains(&b2) {
                        sjis_score += 1;
                        i += 2;
                        continue;
                    }
                }
            }
            0xF0..=0xFC => {
                // Only valid as a Shift_JIS lead byte (user-defined area).
                if let Some(b2) = b2 {
                    if (0x40..=0x7E).contains(&b2) || (0x80..=0xFC).contains(&b2) {
                        sjis_score += 2;
                        i += 2;
                        continue;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    if euc_score > sjis_score {
        Encoding::EucJp
    } else {
        Encoding::ShiftJis
    }
}

/// Detects the line-ending convention in raw bytes: CRLF beats LF beats CR.
pub fn detect_line_ending(bytes: &[u8]) -> LineEnding {
    if bytes.windows(2).any(|w| w == b"\r\n") {
        LineEnding::Crlf
    } else if bytes.contains(&b'\n') {
        LineEnding::Lf
    } else if bytes.contains(&b'\r') {
        LineEnding::Cr
    } else {
        LineEnding::Lf
    }
}

/// Decodes raw file bytes into UTF-8 text with LF-only line endings,
/// returning the detected encoding and line ending alongside the text.
pub fn normalize_to_utf8_lf(bytes: &[u8]) -> Result<(String, Encoding, LineEnding), CoreError> {
    let encoding = detect_encoding(bytes);
    if encoding == Encoding::Unknown {
        return Err(CoreError::UnsupportedEncoding("binary (NUL byte)".into()));
    }

    let (decoded, ending) = match encoding {
        Encoding::Utf8 => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| CoreError::UnsupportedEncoding("UTF-8".into()))?
                .to_string();
            let ending = detect_line_ending(bytes);
            (text, ending)
        }
        Encoding::Utf8Bom => {
            let rest = &bytes[3..];
            let text = std::str::from_utf8(rest)
                .map_err(|_| CoreError::UnsupportedEncoding("UTF-8-BOM".into()))?
                .to_string();
            let ending = detect_line_ending(rest);
            (text, ending)
        }
        Encoding::Utf16Le => {
            let text = decode_utf16(&bytes[2..], true)?;
            let ending = detect_line_ending(text.as_bytes());
            (text, ending)
        }
        Encoding::Utf16Be => {
            let text = decode_utf16(&bytes[2..], false)?;
            let ending = detect_line_ending(text.as_bytes());
            (text, ending)
        }
        Encoding::ShiftJis => {
            let text = charset::decode_shift_jis(bytes);
            let ending = detect_line_ending(text.as_bytes());
            (text, ending)
        }
        Encoding::EucJp => {
            let text = charset::decode_euc_jp(bytes);
            let ending = detect_line_ending(text.as_bytes());
            (text, ending)
        }
        Encoding::Unknown => unreachable!("handled above"),
    };

    let normalized = match ending {
        LineEnding::Lf => decoded,
        LineEnding::Crlf => decoded.replace("\r\n", "\n"),
        LineEnding::Cr => decoded.replace('\r', "\n"),
    };

    Ok((normalized, encoding, ending))
}

fn decode_utf16(bytes: &[u8], little_endian: bool) -> Result<String, CoreError> {
    if bytes.len() % 2 != 0 {
        return Err(CoreError::InvalidUtf16 {
            pos: bytes.len() as u64 - 1,
        });
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| {
            if little_endian {
                u16::from_le_bytes([c[0], c[1]])
            } else {
                u16::from_be_bytes([c[0], c[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|_| {
        let pos = units
            .iter()
            .position(|&u| (0xD800..=0xDFFF).contains(&u))
            .unwrap_or(0) as u64
            * 2;
        CoreError::InvalidUtf16 { pos }
    })
}

/// Converts normalized UTF-8+LF content back to the bytes that should be
/// written to disk, applying the detected line ending and encoding.
pub fn denormalize_for_save(
    text: &str,
    encoding: Encoding,
    line_ending: LineEnding,
) -> Result<Vec<u8>, CoreError> {
    let with_endings = if line_ending == LineEnding::Lf {
        text.to_string()
    } else {
        text.replace('\n', std::str::from_utf8(line_ending.as_bytes()).unwrap())
    };

    match encoding {
        Encoding::Utf8 => Ok(with_endings.into_bytes()),
        Encoding::Utf8Bom => {
            let mut out = Vec::with_capacity(with_endings.len() + 3);
            out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
            out.extend_from_slice(with_endings.as_bytes());
            Ok(out)
        }
        Encoding::Utf16Le | Encoding::Utf16Be => {
            let little_endian = encoding == Encoding::Utf16Le;
            let mut out = Vec::with_capacity(with_endings.len() * 2 + 2);
            if little_endian {
                out.extend_from_slice(&[0xFF, 0xFE]);
            } else {
                out.extend_from_slice(&[0xFE, 0xFF]);
            }
            for unit in with_endings.encode_utf16() {
                let b = if little_endian {
                    unit.to_le_bytes()
                } else {
                    unit.to_be_bytes()
                };
                out.extend_from_slice(&b);
            }
            Ok(out)
        }
        Encoding::ShiftJis => Err(CoreError::UnsupportedEncoding("Shift_JIS (save)".into())),
        Encoding::EucJp => Err(CoreError::UnsupportedEncoding("EUC-JP (save)".into())),
        Encoding::Unknown => Err(CoreError::UnsupportedEncoding("binary".into())),
    }
}

pub mod charset;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utf8_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'a', 0x0D, 0x0A, b'b'];
        assert_eq!(detect_encoding(&bytes), Encoding::Utf8Bom);
    }

    #[test]
    fn detects_plain_utf8() {
        assert_eq!(detect_encoding("hello".as_bytes()), Encoding::Utf8);
    }

    #[test]
    fn detects_binary_from_nul() {
        let bytes = [b'a', 0x00, b'b'];
        assert_eq!(detect_encoding(&bytes), Encoding::Unknown);
    }

    #[test]
    fn line_ending_precedence() {
        assert_eq!(detect_line_ending(b"a\r\nb\nc"), LineEnding::Crlf);
        assert_eq!(detect_line_ending(b"a\nb"), LineEnding::Lf);
        assert_eq!(detect_line_ending(b"a\rb"), LineEnding::Cr);
    }

    #[test]
    fn normalize_utf8_bom_crlf_roundtrips() {
        let bytes = [0xEF, 0xBB, 0xBF, b'a', 0x0D, 0x0A, b'b'];
        let (text, enc, ending) = normalize_to_utf8_lf(&bytes).unwrap();
        assert_eq!(text, "a\nb");
        assert_eq!(enc, Encoding::Utf8Bom);
        assert_eq!(ending, LineEnding::Crlf);

        let saved = denormalize_for_save(&text, enc, ending).unwrap();
        assert_eq!(saved, bytes);
    }

    #[test]
    fn utf16le_roundtrips() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hi\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, enc, ending) = normalize_to_utf8_lf(&bytes).unwrap();
        assert_eq!(text, "hi\n");
        assert_eq!(enc, Encoding::Utf16Le);
        assert_eq!(ending, LineEnding::Lf);
        let saved = denormalize_for_save(&text, enc, ending).unwrap();
        assert_eq!(saved, bytes);
    }

    #[test]
    fn lone_surrogate_is_invalid_utf16() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend_from_slice(&0xD800u16.to_le_bytes()); // lone high surrogate
        let err = normalize_to_utf8_lf(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::InvalidUtf16 { .. }));
    }

    #[test]
    fn shift_jis_save_is_unsupported() {
        let err = denormalize_for_save("x", Encoding::ShiftJis, LineEnding::Lf).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedEncoding(_)));
    }
}
