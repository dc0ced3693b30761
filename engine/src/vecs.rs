//! fvecs / ivecs codec
//!
//! The standard ANN corpus layout (SIFT, GIST, ...). A file is a bare sequence
//! of records with no header and no separators:
//!
//! ```text
//! [dim: i32 LE][dim x 4-byte component LE] [dim: i32 LE][...] ...
//! ```
//!
//! `.fvecs` components are `f32`, `.ivecs` components are `i32` (ground-truth
//! neighbor ids). Sequential reads trust each record's own dimension field.
//!
//! # Range reads
//!
//! [`read_range`] seeks straight to the first wanted record using a stride of
//! `4 + 4 * dim` where `dim` comes from the FIRST record in the file. On a file
//! whose records have different dimensions the computed offset is wrong and the
//! decoded records are garbage or a decode error. Use [`read_all`] for such
//! files.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{BenchError, Result};

/// Query vector.
pub type Vector = Vec<f32>;
/// Ground-truth neighbor id list.
pub type IndexVector = Vec<i32>;

const DIM_BYTES: u64 = 4;
const COMPONENT_BYTES: u64 = 4;

/// A 4-byte little-endian record component.
pub trait VecsElement: Copy + Send + Sync + 'static {
    /// Conventional file extension, for log messages.
    const EXTENSION: &'static str;

    fn from_le_bytes(bytes: [u8; 4]) -> Self;
    fn to_le_bytes(self) -> [u8; 4];
}

impl VecsElement for f32 {
    const EXTENSION: &'static str = "fvecs";

    fn from_le_bytes(bytes: [u8; 4]) -> Self {
        f32::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> [u8; 4] {
        f32::to_le_bytes(self)
    }
}

impl VecsElement for i32 {
    const EXTENSION: &'static str = "ivecs";

    fn from_le_bytes(bytes: [u8; 4]) -> Self {
        i32::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> [u8; 4] {
        i32::to_le_bytes(self)
    }
}

/// Byte size of one record of dimension `dim`.
pub fn record_size(dim: usize) -> u64 {
    DIM_BYTES + COMPONENT_BYTES * dim as u64
}

// ============================================================================
// Decoding
// ============================================================================

/// Sequential record reader that tracks its byte offset for error reports.
struct RecordReader<'a, R> {
    inner: R,
    path: &'a Path,
    offset: u64,
    file_len: u64,
}

impl<'a, R: Read> RecordReader<'a, R> {
    fn new(inner: R, path: &'a Path, offset: u64, file_len: u64) -> Self {
        Self {
            inner,
            path,
            offset,
            file_len,
        }
    }

    /// Fill `buf` as far as the input allows; returns bytes actually read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(BenchError::io(self.path, e)),
            }
        }
        Ok(filled)
    }

    /// Read the next dimension field. `None` on a clean end of file.
    fn read_dimension(&mut self) -> Result<Option<usize>> {
        let mut bytes = [0u8; 4];
        let got = self.fill(&mut bytes)?;
        if got == 0 {
            return Ok(None);
        }
        if got < bytes.len() {
            return Err(BenchError::decode(
                self.path,
                self.offset,
                format!("truncated dimension field ({got} of 4 bytes)"),
            ));
        }

        let dim = i32::from_le_bytes(bytes);
        if dim < 0 {
            return Err(BenchError::decode(
                self.path,
                self.offset,
                format!("negative dimension {dim}"),
            ));
        }
        let dim = dim as usize;

        let needed = COMPONENT_BYTES * dim as u64;
        let remaining = self.file_len.saturating_sub(self.offset + DIM_BYTES);
        if needed > remaining {
            return Err(BenchError::decode(
                self.path,
                self.offset,
                format!("truncated record: dimension {dim} needs {needed} bytes, {remaining} left"),
            ));
        }

        self.offset += DIM_BYTES;
        Ok(Some(dim))
    }

    fn read_components<T: VecsElement>(&mut self, dim: usize) -> Result<Vec<T>> {
        let mut bytes = vec![0u8; dim * COMPONENT_BYTES as usize];
        let got = self.fill(&mut bytes)?;
        if got < bytes.len() {
            return Err(BenchError::decode(
                self.path,
                self.offset,
                format!("truncated record: expected {} component bytes, got {got}", bytes.len()),
            ));
        }
        self.offset += bytes.len() as u64;

        Ok(bytes
            .chunks_exact(COMPONENT_BYTES as usize)
            .map(|c| T::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn next_record<T: VecsElement>(&mut self) -> Result<Option<Vec<T>>> {
        match self.read_dimension()? {
            Some(dim) => self.read_components(dim).map(Some),
            None => Ok(None),
        }
    }
}

fn open(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).map_err(|e| BenchError::io(path, e))?;
    let len = file.metadata().map_err(|e| BenchError::io(path, e))?.len();
    Ok((file, len))
}

/// Read every record until end of file.
///
/// Ending exactly on a record boundary (including an empty file) is success;
/// ending inside a record is a [`BenchError::Decode`].
pub fn read_all<T: VecsElement>(path: &Path) -> Result<Vec<Vec<T>>> {
    let (file, file_len) = open(path)?;
    let mut reader = RecordReader::new(BufReader::new(file), path, 0, file_len);

    let mut records = Vec::new();
    while let Some(record) = reader.next_record::<T>()? {
        records.push(record);
    }

    tracing::debug!(
        path = %path.display(),
        records = records.len(),
        format = T::EXTENSION,
        "decoded vecs file"
    );
    Ok(records)
}

/// Read records `first..=last` (1-based). `last == None` reads through end of
/// file.
///
/// The seek offset assumes every record has the first record's dimension; see
/// the module docs.
pub fn read_range<T: VecsElement>(
    path: &Path,
    first: usize,
    last: Option<usize>,
) -> Result<Vec<Vec<T>>> {
    if first == 0 {
        return Err(BenchError::config("vecs range is 1-based; first must be >= 1"));
    }
    if let Some(last) = last {
        if last < first {
            return Err(BenchError::config(format!(
                "invalid vecs range {first}..={last}: last precedes first"
            )));
        }
    }

    let (file, file_len) = open(path)?;
    let mut buffered = BufReader::new(file);

    let stride = {
        let mut probe = RecordReader::new(&mut buffered, path, 0, file_len);
        match probe.read_dimension()? {
            Some(dim) => record_size(dim),
            None => {
                return Err(BenchError::decode(
                    path,
                    0,
                    "empty file: cannot derive record size",
                ))
            }
        }
    };

    let start = (first as u64 - 1)
        .checked_mul(stride)
        .ok_or_else(|| BenchError::decode(path, 0, "range start offset overflows u64"))?;
    if start > file_len {
        return Err(BenchError::decode(
            path,
            start,
            format!("seek past end of file ({file_len} bytes) for record {first}"),
        ));
    }
    buffered
        .seek(SeekFrom::Start(start))
        .map_err(|e| BenchError::io(path, e))?;

    let mut reader = RecordReader::new(buffered, path, start, file_len);
    let mut records = Vec::with_capacity(last.map_or(0, |l| (l - first + 1).min(1 << 16)));
    let mut index = first;
    loop {
        if let Some(last) = last {
            if index > last {
                break;
            }
        }
        match reader.next_record::<T>()? {
            Some(record) => records.push(record),
            None if last.is_none() => break,
            None => {
                return Err(BenchError::decode(
                    path,
                    reader.offset,
                    format!("range wants record {index} but file ends after record {}", index - 1),
                ))
            }
        }
        index += 1;
    }

    Ok(records)
}

pub fn read_fvecs(path: &Path) -> Result<Vec<Vector>> {
    read_all::<f32>(path)
}

pub fn read_ivecs(path: &Path) -> Result<Vec<IndexVector>> {
    read_all::<i32>(path)
}

/// The common dimension of every record, or `None` when the set is empty or
/// mixed.
pub fn uniform_dimension<T>(records: &[Vec<T>]) -> Option<usize> {
    let first = records.first()?.len();
    records.iter().all(|r| r.len() == first).then_some(first)
}

// ============================================================================
// Encoding
// ============================================================================

/// Raw little-endian component bytes, without the dimension prefix.
///
/// This is the transport form used when inserting vectors as binary column
/// values. It does not decode through [`read_all`]; use [`encode_record`] for
/// that.
pub fn encode_components<T: VecsElement>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * COMPONENT_BYTES as usize);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Hex form of [`encode_components`], as accepted by a binary vector column.
pub fn encode_db_binary(values: &[f32]) -> String {
    hex::encode(encode_components(values))
}

/// A complete `[dim][components]` record.
///
/// Fails when the record is too long for the `i32` dimension field.
pub fn encode_record<T: VecsElement>(values: &[T]) -> Result<Vec<u8>> {
    let dim = dimension_field(values.len())?;
    let mut out = Vec::with_capacity(record_size(values.len()) as usize);
    out.extend_from_slice(&dim.to_le_bytes());
    out.extend_from_slice(&encode_components(values));
    Ok(out)
}

fn dimension_field(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        BenchError::config(format!(
            "record of {len} components does not fit the i32 dimension field"
        ))
    })
}

/// Write records to `path` in vecs layout, replacing any existing file.
pub fn write_vecs<T: VecsElement>(path: &Path, records: &[Vec<T>]) -> Result<()> {
    let file = File::create(path).map_err(|e| BenchError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writer
            .write_all(&encode_record(record)?)
            .map_err(|e| BenchError::io(path, e))?;
    }
    writer.flush().map_err(|e| BenchError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn record_layout_is_dim_then_components() {
        let bytes = encode_record(&[1.0f32, -2.5]).unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &2i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-2.5f32).to_le_bytes());
    }

    #[test]
    fn dimension_field_rejects_overflow() {
        assert_eq!(dimension_field(128).unwrap(), 128);
        assert_eq!(dimension_field(i32::MAX as usize).unwrap(), i32::MAX);
        let err = dimension_field(i32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, BenchError::Configuration(_)), "{err}");
    }

    #[test]
    fn encode_components_has_no_prefix() {
        let bytes = encode_components(&[1.0f32]);
        assert_eq!(bytes, vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(encode_db_binary(&[1.0]), "0000803f");
    }

    #[test]
    fn empty_file_reads_as_empty_set() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "empty.fvecs", &[]);
        assert!(read_fvecs(&path).unwrap().is_empty());
    }

    #[test]
    fn negative_dimension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "neg.ivecs", &(-3i32).to_le_bytes());
        let err = read_ivecs(&path).unwrap_err();
        assert!(matches!(err, BenchError::Decode { offset: 0, .. }), "{err}");
    }

    #[test]
    fn partial_dimension_field_is_truncation() {
        let dir = TempDir::new().unwrap();
        let mut bytes = encode_record(&[1i32, 2]).unwrap();
        bytes.extend_from_slice(&[2, 0]);
        let path = fixture(&dir, "short.ivecs", &bytes);
        let err = read_ivecs(&path).unwrap_err();
        match err {
            BenchError::Decode { offset, .. } => assert_eq!(offset, 12),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn range_rejects_zero_and_inverted_bounds() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "one.fvecs", &encode_record(&[0.5f32]).unwrap());
        assert!(matches!(
            read_range::<f32>(&path, 0, None),
            Err(BenchError::Configuration(_))
        ));
        assert!(matches!(
            read_range::<f32>(&path, 3, Some(2)),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn uniform_dimension_detects_mixed_sets() {
        assert_eq!(uniform_dimension(&[vec![1, 2], vec![3, 4]]), Some(2));
        assert_eq!(uniform_dimension(&[vec![1, 2], vec![3]]), None);
        assert_eq!(uniform_dimension::<i32>(&[]), None);
    }
}
