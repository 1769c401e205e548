use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{IndexError, Result};

const RECORD_HEADER_LEN: u64 = 8;

/// Pointer to a blob record inside the blob log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlobPointer {
    pub offset: u64,
    pub len: u32,
    pub crc32: u32,
}

impl BlobPointer {
    pub fn new(offset: u64, len: u32, crc32: u32) -> Self {
        Self { offset, len, crc32 }
    }
}

fn checksum(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Append-only blob log for page records.
///
/// Record format:
/// - u32 length (little endian)
/// - u32 crc32 of payload
/// - raw payload bytes
pub struct BlobLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl BlobLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        truncate_torn_tail(&mut file, &path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append a payload and return its pointer.
    pub fn append(&self, payload: &[u8]) -> Result<BlobPointer> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            IndexError::PageStore(format!("record of {} bytes is too large", payload.len()))
        })?;

        let mut file = self.file.lock();
        let offset = file.seek(SeekFrom::End(0))?;
        let crc32 = checksum(payload);

        file.write_all(&len.to_le_bytes())?;
        file.write_all(&crc32.to_le_bytes())?;
        file.write_all(payload)?;

        Ok(BlobPointer::new(offset, len, crc32))
    }

    /// Read a payload given its pointer, validating checksum.
    pub fn read(&self, ptr: BlobPointer) -> Result<Vec<u8>> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(ptr.offset))?;

        let (len, stored_crc) = read_header(&mut *file)?;
        if len != ptr.len {
            return Err(IndexError::Corrupt(format!(
                "Blob length mismatch: expected {}, found {}",
                ptr.len, len
            )));
        }

        let mut payload = vec![0u8; len as usize];
        file.read_exact(&mut payload)?;

        let crc = checksum(&payload);
        if crc != stored_crc || crc != ptr.crc32 {
            return Err(IndexError::Corrupt(
                "Blob checksum mismatch (corrupt record)".to_string(),
            ));
        }

        Ok(payload)
    }

    /// Read every record from the start of the log.
    pub fn scan(&self) -> Result<Vec<(BlobPointer, Vec<u8>)>> {
        let mut file = self.file.lock();
        let end = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        let mut records = Vec::new();
        let mut offset = 0u64;
        while offset < end {
            let (len, stored_crc) = read_header(&mut *file)?;
            let mut payload = vec![0u8; len as usize];
            file.read_exact(&mut payload)?;
            if checksum(&payload) != stored_crc {
                return Err(IndexError::Corrupt(format!(
                    "Blob checksum mismatch at offset {}",
                    offset
                )));
            }

            records.push((BlobPointer::new(offset, len, stored_crc), payload));
            offset += RECORD_HEADER_LEN + u64::from(len);
        }

        Ok(records)
    }

    /// Size of the log in bytes.
    pub fn len_bytes(&self) -> Result<u64> {
        Ok(self.file.lock().metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len_bytes()? == 0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Cut an interrupted append off the end of the log.
///
/// Walks record headers only; the log is cut at the first record whose header
/// or payload extends past the end of the file, so later appends start on a
/// record boundary.
fn truncate_torn_tail(file: &mut File, path: &Path) -> Result<()> {
    let end = file.seek(SeekFrom::End(0))?;
    let mut offset = 0u64;
    while end - offset >= RECORD_HEADER_LEN {
        file.seek(SeekFrom::Start(offset))?;
        let (len, _) = read_header(file)?;
        let record_end = offset + RECORD_HEADER_LEN + u64::from(len);
        if record_end > end {
            break;
        }
        offset = record_end;
    }

    if offset < end {
        warn!(offset, torn_bytes = end - offset, path = ?path, "truncating torn record at log tail");
        file.set_len(offset)?;
    }
    Ok(())
}

fn read_header(reader: &mut impl Read) -> io::Result<(u32, u32)> {
    let mut header = [0u8; RECORD_HEADER_LEN as usize];
    reader.read_exact(&mut header)?;
    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    Ok((len, crc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_read_scan() {
        let tmp = TempDir::new().unwrap();
        let log = BlobLog::open(tmp.path().join("pages.log")).unwrap();

        let first = log.append(b"first").unwrap();
        let second = log.append(b"second record").unwrap();

        assert_eq!(log.read(second).unwrap(), b"second record");
        assert_eq!(log.read(first).unwrap(), b"first");

        let records = log.scan().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, first);
        assert_eq!(records[1].1, b"second record");
    }

    fn tear(path: &Path, tail: &[u8]) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(tail).unwrap();
    }

    #[test]
    fn test_open_truncates_torn_tail() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pages.log");
        let complete = {
            let log = BlobLog::open(&path).unwrap();
            log.append(b"complete").unwrap()
        };

        // Header claims 100 bytes, only 4 were written
        let mut torn = Vec::new();
        torn.extend_from_slice(&100u32.to_le_bytes());
        torn.extend_from_slice(&0u32.to_le_bytes());
        torn.extend_from_slice(b"part");
        tear(&path, &torn);

        let log = BlobLog::open(&path).unwrap();
        assert_eq!(log.len_bytes().unwrap(), RECORD_HEADER_LEN + 8);
        assert_eq!(log.read(complete).unwrap(), b"complete");

        let long = vec![7u8; 200];
        let appended = log.append(&long).unwrap();
        assert_eq!(appended.offset, RECORD_HEADER_LEN + 8);
        drop(log);

        let log = BlobLog::open(&path).unwrap();
        let records = log.scan().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].1, long);
    }

    #[test]
    fn test_open_truncates_partial_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pages.log");
        BlobLog::open(&path).unwrap().append(b"first").unwrap();
        tear(&path, &[9, 0, 0]);

        let log = BlobLog::open(&path).unwrap();
        log.append(b"second").unwrap();
        drop(log);

        let records = BlobLog::open(&path).unwrap().scan().unwrap();
        let payloads: Vec<&[u8]> = records.iter().map(|(_, p)| p.as_slice()).collect();
        assert_eq!(payloads, vec![&b"first"[..], &b"second"[..]]);
    }

    #[test]
    fn test_corrupt_record_is_detected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pages.log");
        let ptr = {
            let log = BlobLog::open(&path).unwrap();
            log.append(b"payload").unwrap()
        };

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let log = BlobLog::open(&path).unwrap();
        assert!(matches!(log.read(ptr), Err(IndexError::Corrupt(_))));
        assert!(matches!(log.scan(), Err(IndexError::Corrupt(_))));
    }
}
