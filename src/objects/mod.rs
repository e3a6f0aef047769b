mod blob;
mod commit;
mod tag;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use tag::Tag;
pub use tree::{Tree, TreeEntry};

use crate::error::BitResult;
use crate::kind::ObjectKind;
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::fmt::{self, Debug, Display, Formatter};
use std::io::Write;
use std::str::FromStr;

/// parses the kind-specific payload of a loose object
pub trait Parse {
    fn parse(payload: &[u8]) -> BitResult<Self>
    where
        Self: Sized;
}

/// serializes the kind-specific payload of a loose object (without the
/// `<kind> <len>\0` framing, which the odb layer adds)
pub trait Serialize {
    fn serialize(&self, out: &mut dyn Write) -> BitResult<()>;
}

/// the mode bits git tree entries use; the ordering here (note `Tree` sorts
/// after the "file" variants) backs the tree entry sort order
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, TryFromPrimitive)]
#[repr(u32)]
pub enum FileMode {
    Reg = 0o100644,
    Exec = 0o100755,
    Link = 0o120000,
    Tree = 0o040000,
    Gitlink = 0o160000,
}

impl FileMode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn is_tree(self) -> bool {
        matches!(self, FileMode::Tree)
    }
}

impl Display for FileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.as_u32())
    }
}

impl Debug for FileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for FileMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = u32::from_str_radix(s, 8)?;
        Self::try_from(n).map_err(|_| anyhow::anyhow!("invalid file mode `{}`", s))
    }
}

/// the in-memory parsed payload of a typed object
#[derive(Debug, PartialEq)]
pub enum ObjectData {
    Blob(Blob),
    Commit(Commit),
    Tree(Tree),
    Tag(Tag),
}

impl ObjectData {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectData::Blob(_) => ObjectKind::Blob,
            ObjectData::Commit(_) => ObjectKind::Commit,
            ObjectData::Tree(_) => ObjectKind::Tree,
            ObjectData::Tag(_) => ObjectKind::Tag,
        }
    }

    /// a fresh, empty payload for `kind`, used by `newobject` to seed an
    /// in-memory object before its fields are populated and it is written
    pub fn empty(kind: ObjectKind) -> BitResult<Self> {
        match kind {
            ObjectKind::Blob => Ok(ObjectData::Blob(Blob::default())),
            ObjectKind::Commit => Ok(ObjectData::Commit(Commit::default())),
            ObjectKind::Tree => Ok(ObjectData::Tree(Tree::default())),
            ObjectKind::Tag => Ok(ObjectData::Tag(Tag::default())),
            ObjectKind::OfsDelta | ObjectKind::RefDelta =>
                anyhow::bail!("cannot allocate a new object of non-loose kind `{}`", kind),
        }
    }

    pub fn parse(kind: ObjectKind, payload: &[u8]) -> BitResult<Self> {
        match kind {
            ObjectKind::Blob => Blob::parse(payload).map(ObjectData::Blob),
            ObjectKind::Commit => Commit::parse(payload).map(ObjectData::Commit),
            ObjectKind::Tree => Tree::parse(payload).map(ObjectData::Tree),
            ObjectKind::Tag => Tag::parse(payload).map(ObjectData::Tag),
            ObjectKind::OfsDelta | ObjectKind::RefDelta =>
                anyhow::bail!("cannot parse a non-loose object kind `{}`", kind),
        }
    }

    pub fn serialize(&self, out: &mut dyn Write) -> BitResult<()> {
        match self {
            ObjectData::Blob(blob) => blob.serialize(out),
            ObjectData::Commit(commit) => commit.serialize(out),
            ObjectData::Tree(tree) => tree.serialize(out),
            ObjectData::Tag(tag) => tag.serialize(out),
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            ObjectData::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            ObjectData::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            ObjectData::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            ObjectData::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_commit_mut(&mut self) -> Option<&mut Commit> {
        match self {
            ObjectData::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut Tree> {
        match self {
            ObjectData::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_blob_mut(&mut self) -> Option<&mut Blob> {
        match self {
            ObjectData::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_tag_mut(&mut self) -> Option<&mut Tag> {
        match self {
            ObjectData::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}
