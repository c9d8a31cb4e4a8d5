//! Versioned on-disk artifacts.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic        [u8; 4]   "SVCP" corpus, "SVMD" model
//! version      u16
//! fingerprint  u64       vocabulary fingerprint (models) / settings digest (corpus)
//! payload_len  u64
//! checksum     u32       CRC-32 of the payload
//! payload      [u8]      bincode (serde, standard config)
//! ```
//!
//! Artifacts are written to a uniquely named temporary file in the target
//! directory and renamed into place, so a reader never observes a partially
//! written file under the final name.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{Result, SentivoteError};

/// Current artifact format version.
pub const FORMAT_VERSION: u16 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 4 + 2 + 8 + 8 + 4;

/// What an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Corpus,
    Model,
}

impl ArtifactKind {
    pub fn magic(&self) -> &'static [u8; 4] {
        match self {
            ArtifactKind::Corpus => b"SVCP",
            ArtifactKind::Model => b"SVMD",
        }
    }
}

/// Decoded artifact header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    pub kind: ArtifactKind,
    pub version: u16,
    pub fingerprint: u64,
    pub payload_len: u64,
    pub checksum: u32,
}

/// Serialize `value` and write it atomically to `path`.
pub fn write_artifact<T: Serialize>(
    path: &Path,
    kind: ArtifactKind,
    fingerprint: u64,
    value: &T,
) -> Result<()> {
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| SentivoteError::serialization(format!("Failed to encode artifact: {e}")))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let tmp_path = temp_path(path);
    let result = (|| -> Result<()> {
        let mut output = BufWriter::new(File::create(&tmp_path)?);
        output.write_all(kind.magic())?;
        output.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        output.write_u64::<LittleEndian>(fingerprint)?;
        output.write_u64::<LittleEndian>(payload.len() as u64)?;
        output.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
        output.write_all(&payload)?;
        output.flush()?;
        output.get_ref().sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read and decode an artifact.
///
/// Returns `Ok(None)` when the file does not exist and a
/// [`SentivoteError::Cache`] when it exists but cannot be trusted (wrong
/// magic, unsupported version, truncated, checksum mismatch, undecodable
/// payload).
pub fn read_artifact<T: DeserializeOwned>(
    path: &Path,
    kind: ArtifactKind,
) -> Result<Option<(ArtifactHeader, T)>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut input = BufReader::new(file);

    let header = read_header(&mut input, kind).map_err(|e| corrupt(path, e))?;

    let mut payload = Vec::new();
    input.read_to_end(&mut payload)?;
    if payload.len() as u64 != header.payload_len {
        return Err(corrupt(
            path,
            format!(
                "payload length {} does not match header {}",
                payload.len(),
                header.payload_len
            ),
        ));
    }
    if crc32fast::hash(&payload) != header.checksum {
        return Err(corrupt(path, "checksum mismatch"));
    }

    let (value, _): (T, usize) =
        bincode::serde::decode_from_slice(&payload, bincode::config::standard())
            .map_err(|e| corrupt(path, format!("failed to decode payload: {e}")))?;

    Ok(Some((header, value)))
}

fn read_header<R: Read>(
    input: &mut R,
    kind: ArtifactKind,
) -> std::result::Result<ArtifactHeader, String> {
    let mut magic = [0u8; 4];
    input
        .read_exact(&mut magic)
        .map_err(|_| "truncated header".to_string())?;
    if &magic != kind.magic() {
        return Err("invalid artifact magic".to_string());
    }

    let read = |e: std::io::Error| format!("truncated header: {e}");
    let version = input.read_u16::<LittleEndian>().map_err(read)?;
    if version != FORMAT_VERSION {
        return Err(format!("unsupported artifact version {version}"));
    }
    let fingerprint = input.read_u64::<LittleEndian>().map_err(read)?;
    let payload_len = input.read_u64::<LittleEndian>().map_err(read)?;
    let checksum = input.read_u32::<LittleEndian>().map_err(read)?;

    Ok(ArtifactHeader {
        kind,
        version,
        fingerprint,
        payload_len,
        checksum,
    })
}

fn corrupt<S: std::fmt::Display>(path: &Path, reason: S) -> SentivoteError {
    SentivoteError::cache(format!("{}: {}", path.display(), reason))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}
