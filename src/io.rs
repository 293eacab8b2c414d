//! File I/O gateway: `load` (mmap fast path for already-UTF-8+LF files,
//! buffered decode-and-normalize fallback otherwise) and `save` (atomic
//! write via a sibling temp file, fsync, rename).

use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;

use crate::core::piece_table::{Buffer, OriginalData};
use crate::encoding::{self, Encoding, LineEnding};
use crate::error::{CoreError, CoreResult};

/// Loads `path` into a fresh [`Buffer`].
///
/// Tries a read-only `mmap` first. If the mapped bytes are already UTF-8
/// with LF-only line endings, the mapping is kept as the buffer's
/// `original` container with no copy. Otherwise the bytes are decoded and
/// normalized to UTF-8+LF and stored as an owned allocation. A NUL byte in
/// the first 8 KiB is treated as binary and rejected outright.
pub fn load(path: &Path) -> CoreResult<Buffer> {
    if !path.exists() {
        return Err(CoreError::FileNotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let metadata = file.metadata()?;

    if metadata.len() == 0 {
        return Ok(Buffer::empty());
    }

    match unsafe { memmap2::Mmap::map(&file) } {
        Ok(mmap) => {
            if let Some(bin) = binary_check(&mmap, path) {
                return Err(bin);
            }
            let detected = encoding::detect_encoding(&mmap);
            let line_ending = encoding::detect_line_ending(&mmap);
            if detected == Encoding::Utf8 && line_ending == LineEnding::Lf {
                return Ok(Buffer::from_original(
                    OriginalData::Mapped(mmap),
                    detected,
                    line_ending,
                ));
            }
            let (text, detected_encoding, detected_line_ending) =
                encoding::normalize_to_utf8_lf(&mmap)?;
            Ok(Buffer::from_original(
                OriginalData::Owned(text.into_bytes()),
                detected_encoding,
                detected_line_ending,
            ))
        }
        Err(_) => {
            let bytes = fs::read(path)?;
            load_owned(bytes, path)
        }
    }
}

fn binary_check(bytes: &[u8], path: &Path) -> Option<CoreError> {
    if bytes[..bytes.len().min(8192)].contains(&0) {
        Some(CoreError::BinaryFile(path.to_path_buf()))
    } else {
        None
    }
}

fn load_owned(bytes: Vec<u8>, path: &Path) -> CoreResult<Buffer> {
    if let Some(bin) = binary_check(&bytes, path) {
        return Err(bin);
    }

    let detected = encoding::detect_encoding(&bytes);
    let line_ending = encoding::detect_line_ending(&bytes);
    if detected == Encoding::Utf8 && line_ending == LineEnding::Lf {
        return Ok(Buffer::from_original(
            OriginalData::Owned(bytes),
            detected,
            line_ending,
        ));
    }

    let (text, detected_encoding, detected_line_ending) = encoding::normalize_to_utf8_lf(&bytes)?;
    Ok(Buffer::from_original(
        OriginalData::Owned(text.into_bytes()),
        detected_encoding,
        detected_line_ending,
    ))
}

/// Writes `buffer`'s content to `path` atomically: encode to the buffer's
/// detected encoding/line-ending, write to a sibling `.tmp` file, `fsync`,
/// then rename over `path`. The original file's permissions are preserved
/// if it already exists. On any failure the `.tmp` file is removed and
/// `path` is left untouched.
pub fn save(buffer: &Buffer, path: &Path) -> CoreResult<()> {
    let text = String::from_utf8(buffer.to_vec())
        .expect("buffer content is always well-formed UTF-8");
    let bytes =
        encoding::denormalize_for_save(&text, buffer.detected_encoding, buffer.detected_line_ending)?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;

    let result = (|| -> CoreResult<()> {
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        if let Ok(existing) = fs::metadata(path) {
            fs::set_permissions(tmp.path(), existing.permissions())?;
        }
        tmp.persist(path)
            .map_err(|e| CoreError::Io(e.error))?;
        Ok(())
    })();

    result
}
