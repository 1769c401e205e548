//! Persisted index snapshot
//!
//! Layout:
//! - magic `IVDX`
//! - u32 format version (little endian)
//! - u64 payload length (little endian)
//! - u32 crc32 of payload (little endian)
//! - bincode payload (`IndexSnapshot`)

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::IndexSettings;
use crate::error::{IndexError, Result};
use crate::index::{CompressedPostings, DocumentRegistry, InvertedIndex, PostingsTable};
use crate::models::{DocumentId, Ordinal};

/// Snapshot version for compatibility checking
pub const SNAPSHOT_VERSION: u32 = 1;

pub const SNAPSHOT_MAGIC: [u8; 4] = *b"IVDX";

const HEADER_LEN: usize = 4 + 4 + 8 + 4;

/// Postings in whichever representation the index held when captured
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotPostings {
    /// Term and its ascending ordinals
    Raw(Vec<(String, Vec<u32>)>),
    Compressed(Vec<(String, CompressedPostings)>),
}

/// Complete snapshot of an inverted index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    pub settings: IndexSettings,
    pub next_ordinal: u32,
    /// External ids in ordinal order
    pub documents: Vec<DocumentId>,
    pub postings: SnapshotPostings,
}

impl IndexSnapshot {
    /// Capture the state of `index`; terms are sorted for stable output
    pub fn capture(index: &InvertedIndex) -> Self {
        let postings = match index.postings() {
            PostingsTable::Raw(terms) => {
                let mut terms: Vec<_> = terms
                    .iter()
                    .map(|(term, set)| (term.clone(), set.iter().collect::<Vec<u32>>()))
                    .collect();
                terms.sort_by(|a, b| a.0.cmp(&b.0));
                SnapshotPostings::Raw(terms)
            }
            PostingsTable::Compressed(terms) => {
                let mut terms: Vec<_> = terms
                    .iter()
                    .map(|(term, postings)| (term.clone(), postings.clone()))
                    .collect();
                terms.sort_by(|a, b| a.0.cmp(&b.0));
                SnapshotPostings::Compressed(terms)
            }
        };

        Self {
            version: SNAPSHOT_VERSION,
            settings: index.settings().clone(),
            next_ordinal: index.registry().next_ordinal().as_u32(),
            documents: index.registry().ids().to_vec(),
            postings,
        }
    }

    /// Check if this snapshot version is compatible
    pub fn is_compatible(&self) -> bool {
        self.version <= SNAPSHOT_VERSION
    }

    /// Rebuild the index, validating every invariant of the captured state
    pub fn restore(self) -> Result<InvertedIndex> {
        if !self.is_compatible() {
            return Err(IndexError::IncompatibleSnapshot {
                expected: SNAPSHOT_VERSION,
                actual: self.version,
            });
        }

        let registry = DocumentRegistry::from_parts(self.documents, Ordinal::new(self.next_ordinal))?;
        let max_ordinal = registry.len() as u32;
        let check_range = |term: &str, set: &RoaringBitmap| -> Result<()> {
            match (set.min(), set.max()) {
                (Some(min), Some(max)) if min >= 1 && max <= max_ordinal => Ok(()),
                (None, None) => Err(IndexError::Corrupt(format!(
                    "term {:?} has an empty postings set",
                    term
                ))),
                _ => Err(IndexError::Corrupt(format!(
                    "term {:?} references ordinals outside 1..={}",
                    term, max_ordinal
                ))),
            }
        };

        let postings = match self.postings {
            SnapshotPostings::Raw(terms) => {
                let mut table = HashMap::with_capacity(terms.len());
                for (term, ordinals) in terms {
                    if !ordinals.windows(2).all(|w| w[0] < w[1]) {
                        return Err(IndexError::Corrupt(format!(
                            "term {:?} has unsorted ordinals",
                            term
                        )));
                    }
                    let set: RoaringBitmap = ordinals.into_iter().collect();
                    check_range(&term, &set)?;
                    if table.insert(term.clone(), set).is_some() {
                        return Err(IndexError::Corrupt(format!("term {:?} stored twice", term)));
                    }
                }
                PostingsTable::Raw(table)
            }
            SnapshotPostings::Compressed(terms) => {
                if !self.settings.compression {
                    return Err(IndexError::Corrupt(
                        "compressed postings in an index with compression disabled".to_string(),
                    ));
                }
                let mut table = HashMap::with_capacity(terms.len());
                for (term, postings) in terms {
                    if postings.bytes.len() as u64 != postings.bit_len.div_ceil(8) {
                        return Err(IndexError::Corrupt(format!(
                            "term {:?} claims {} bits in {} bytes",
                            term,
                            postings.bit_len,
                            postings.bytes.len()
                        )));
                    }
                    check_range(&term, &postings.decode()?)?;
                    if table.insert(term.clone(), postings).is_some() {
                        return Err(IndexError::Corrupt(format!("term {:?} stored twice", term)));
                    }
                }
                PostingsTable::Compressed(table)
            }
        };

        Ok(InvertedIndex::from_parts(self.settings, registry, postings))
    }

    /// Serialize to the framed binary layout
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&payload);

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(&hasher.finalize().to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Deserialize from the framed binary layout
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(IndexError::Corrupt(format!(
                "snapshot truncated: {} bytes, header needs {}",
                data.len(),
                HEADER_LEN
            )));
        }

        let (header, payload) = data.split_at(HEADER_LEN);
        if header[0..4] != SNAPSHOT_MAGIC {
            return Err(IndexError::Corrupt("not an index snapshot".to_string()));
        }

        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version > SNAPSHOT_VERSION {
            return Err(IndexError::IncompatibleSnapshot {
                expected: SNAPSHOT_VERSION,
                actual: version,
            });
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&header[8..16]);
        let len = u64::from_le_bytes(len_bytes);
        if len != payload.len() as u64 {
            return Err(IndexError::Corrupt(format!(
                "snapshot payload is {} bytes, header says {}",
                payload.len(),
                len
            )));
        }

        let stored_crc = u32::from_le_bytes([header[16], header[17], header[18], header[19]]);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        if hasher.finalize() != stored_crc {
            return Err(IndexError::Corrupt("snapshot checksum mismatch".to_string()));
        }

        let snapshot: Self = bincode::deserialize(payload)?;
        if snapshot.version != version {
            return Err(IndexError::Corrupt(format!(
                "snapshot header version {} disagrees with payload version {}",
                version, snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Write to `path` atomically (temporary sibling file, then rename)
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = temp_path(path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            self.write_to(&mut writer)?;
            writer
                .into_inner()
                .map_err(|e| IndexError::Io(e.into_error()))?
                .sync_all()?;
        }
        fs::rename(&tmp, path)?;

        info!(
            path = ?path,
            documents = self.documents.len(),
            "index snapshot saved"
        );
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        debug!(path = ?path, bytes = data.len(), "loading index snapshot");
        Self::from_bytes(&data)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
