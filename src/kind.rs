use crate::error::{BitResult, OdbError};
use crate::hash::{hash_bytes, Oid};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fmt::{self, Display, Formatter};
use std::io::{Read, Write};
use std::str::FromStr;

/// the fixed, closed taxonomy of object kinds; numeric codes match the
/// on-disk convention this core's framing is grounded on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
    OfsDelta,
    RefDelta,
}

/// sentinel meaning "do not type-check" at the API surface (`lookup`'s
/// `expected_kind` parameter)
pub const ANY: Option<ObjectKind> = None;

impl ObjectKind {
    const TABLE: &'static [(ObjectKind, &'static str, bool)] = &[
        (ObjectKind::Commit, "commit", true),
        (ObjectKind::Tree, "tree", true),
        (ObjectKind::Blob, "blob", true),
        (ObjectKind::Tag, "tag", true),
        (ObjectKind::OfsDelta, "", false),
        (ObjectKind::RefDelta, "", false),
    ];

    pub fn name(self) -> &'static str {
        Self::TABLE.iter().find(|(k, ..)| *k == self).map(|(_, name, _)| *name).unwrap_or("")
    }

    pub fn is_loose(self) -> bool {
        Self::TABLE.iter().find(|(k, ..)| *k == self).map(|(_, _, loose)| *loose).unwrap_or(false)
    }

    pub fn from_name(name: &str) -> BitResult<Self> {
        if name.is_empty() {
            anyhow::bail!(OdbError::BadKindName);
        }
        Self::TABLE
            .iter()
            .find(|(_, candidate, _)| *candidate == name)
            .map(|(kind, ..)| *kind)
            .ok_or(OdbError::BadKindName)
            .map_err(Into::into)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ObjectKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// a `(kind, length, payload)` triple with `payload.len() == length`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub kind: ObjectKind,
    pub payload: Vec<u8>,
}

impl RawObject {
    pub fn new(kind: ObjectKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    pub fn header(&self) -> ObjectHeader {
        ObjectHeader { kind: self.kind, len: self.payload.len() as u64 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
    pub kind: ObjectKind,
    pub len: u64,
}

/// the canonical `"<name> <len>\0"` header used both for hashing and for
/// loose-object framing
fn format_header(kind: ObjectKind, len: u64) -> BitResult<Vec<u8>> {
    anyhow::ensure!(kind.is_loose(), "cannot frame non-loose object kind `{:?}`", kind);
    Ok(format!("{} {}\0", kind.name(), len).into_bytes())
}

/// produces the canonical framing (`<name> <len>\0<payload>`) and hashes it
pub fn hash_raw_object(raw: &RawObject) -> BitResult<Oid> {
    let header = format_header(raw.kind, raw.payload.len() as u64)?;
    let mut buf = Vec::with_capacity(header.len() + raw.payload.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(&raw.payload);
    Ok(hash_bytes(&buf))
}

/// frames and hashes in one pass, returning both (used by backends that need
/// to persist the exact bytes they hashed)
pub fn frame_and_hash(raw: &RawObject) -> BitResult<(Oid, Vec<u8>)> {
    let header = format_header(raw.kind, raw.payload.len() as u64)?;
    let mut buf = Vec::with_capacity(header.len() + raw.payload.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(&raw.payload);
    Ok((hash_bytes(&buf), buf))
}

/// reads a `"<name> <len>\0"` header off the front of `framed`, returning the
/// header and the remaining payload bytes
pub fn read_framed_header(framed: &[u8]) -> BitResult<(ObjectHeader, &[u8])> {
    let space = framed
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| anyhow::anyhow!("malformed object header: no space separator"))?;
    let kind = ObjectKind::from_name(std::str::from_utf8(&framed[..space])?)?;

    let nul = framed[space + 1..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| anyhow::anyhow!("malformed object header: no NUL terminator"))?
        + space
        + 1;
    let len: u64 = std::str::from_utf8(&framed[space + 1..nul])?.parse()?;
    Ok((ObjectHeader { kind, len }, &framed[nul + 1..]))
}

/// decompresses `input` into a buffer of exactly `expected_len` bytes
pub fn inflate_buffer(input: &[u8], expected_len: usize) -> BitResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = Vec::with_capacity(expected_len);
    decoder.read_to_end(&mut out)?;
    anyhow::ensure!(
        out.len() == expected_len,
        "inflate produced {} bytes, expected {}",
        out.len(),
        expected_len
    );
    Ok(out)
}

/// compresses `input` with zlib at the default compression level; the
/// inverse of [`inflate_buffer`]
pub fn deflate_buffer(input: &[u8]) -> BitResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_name_round_trips() {
        for kind in [ObjectKind::Commit, ObjectKind::Tree, ObjectKind::Blob, ObjectKind::Tag] {
            assert_eq!(ObjectKind::from_name(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn from_name_rejects_empty_and_unknown() {
        assert!(ObjectKind::from_name("").is_err());
        assert!(ObjectKind::from_name("frobnicate").is_err());
    }

    #[test]
    fn delta_kinds_are_not_loose() {
        assert!(!ObjectKind::OfsDelta.is_loose());
        assert!(!ObjectKind::RefDelta.is_loose());
    }

    #[test]
    fn hash_raw_object_matches_known_empty_blob_oid() {
        let raw = RawObject::new(ObjectKind::Blob, vec![]);
        assert_eq!(hash_raw_object(&raw).unwrap(), Oid::EMPTY_BLOB);
    }

    #[test]
    fn deflate_then_inflate_round_trips() {
        let payload = b"tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\0hello".to_vec();
        let compressed = deflate_buffer(&payload).unwrap();
        let decompressed = inflate_buffer(&compressed, payload.len()).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn read_framed_header_parses_name_and_length() {
        let (oid, framed) = frame_and_hash(&RawObject::new(ObjectKind::Blob, b"abc".to_vec())).unwrap();
        let (header, payload) = read_framed_header(&framed).unwrap();
        assert_eq!(header.kind, ObjectKind::Blob);
        assert_eq!(header.len, 3);
        assert_eq!(payload, b"abc");
        assert_eq!(hash_bytes(&framed), oid);
    }
}
