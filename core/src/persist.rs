use crate::error::{IndexError, Result};
use crate::index::{Document, Index, InvertedIndex, Posting};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

// [magic "WDX1"][u32 version BE][bincode payload][u32 CRC32 BE]
pub const MAGIC: &[u8; 4] = b"WDX1";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;
const FOOTER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub num_docs: u64,
    pub num_words: u64,
    pub created_at: String,
    pub version: u32,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    created_at: &'a str,
    docs: &'a [Document],
    terms: Vec<(&'a str, &'a [Posting])>,
}

#[derive(Deserialize)]
struct Snapshot {
    created_at: String,
    docs: Vec<Document>,
    terms: Vec<(String, Vec<Posting>)>,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

pub fn manifest_path(index_path: &Path) -> PathBuf {
    with_suffix(index_path, ".meta.json")
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

pub fn encode_index(index: &InvertedIndex, created_at: &str) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        created_at,
        docs: index.documents(),
        terms: index.terms().map(|(t, plist)| (t, plist.postings())).collect(),
    };
    let payload = bincode::serialize(&snapshot)?;
    let crc = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + FOOTER_LEN);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc.to_be_bytes());
    Ok(out)
}

pub fn decode_index(bytes: &[u8]) -> Result<(InvertedIndex, String)> {
    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(IndexError::Corrupt(format!("file too short ({} bytes)", bytes.len())));
    }
    if &bytes[..4] != MAGIC {
        return Err(IndexError::Corrupt("bad magic".into()));
    }
    let version = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(IndexError::UnsupportedVersion(version));
    }
    let (payload, footer) = bytes[HEADER_LEN..].split_at(bytes.len() - HEADER_LEN - FOOTER_LEN);
    let stored = u32::from_be_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(IndexError::Corrupt(format!(
            "CRC32 mismatch: expected {stored:#010x}, got {computed:#010x}"
        )));
    }
    let snapshot: Snapshot = bincode::deserialize(payload)?;
    let index = InvertedIndex::from_parts(snapshot.docs, snapshot.terms)?;
    Ok((index, snapshot.created_at))
}

/// Write `bytes` to a sibling temp file and rename it over `path`. The temp
/// file never outlives a failed attempt.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = with_suffix(path, ".tmp");
    let res = File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = res {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Write the index atomically and refresh its manifest.
///
/// The index file is authoritative: a stale manifest is removed before the
/// new index lands, and failing to write the fresh one only logs a warning.
pub fn save_index(path: &Path, index: &InvertedIndex) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let created_at = now_rfc3339();
    let bytes = encode_index(index, &created_at)?;

    let meta = manifest_path(path);
    match fs::remove_file(&meta) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }
    write_atomic(path, &bytes)?;

    let manifest = IndexManifest {
        num_docs: index.num_docs() as u64,
        num_words: index.num_words() as u64,
        created_at,
        version: FORMAT_VERSION,
    };
    if let Err(e) = save_manifest(&meta, &manifest) {
        tracing::warn!(path = %meta.display(), error = %e, "index manifest not written");
    }

    tracing::info!(
        path = %path.display(),
        num_docs = index.num_docs(),
        num_words = index.num_words(),
        bytes = bytes.len(),
        "index persisted"
    );
    Ok(())
}

pub fn load_index(path: &Path) -> Result<InvertedIndex> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let (index, created_at) = decode_index(&buf)?;
    tracing::info!(
        path = %path.display(),
        num_docs = index.num_docs(),
        num_words = index.num_words(),
        %created_at,
        "index loaded"
    );
    Ok(index)
}

pub fn save_manifest(path: &Path, manifest: &IndexManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    write_atomic(path, json.as_bytes())
}

pub fn load_manifest(path: &Path) -> Result<IndexManifest> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}
