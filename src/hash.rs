use crate::error::BitGenericError;
use rustc_hex::{FromHex, ToHex};
use sha1::digest::Output;
use sha1::{Digest, Sha1};
use std::convert::TryInto;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

pub const OID_SIZE: usize = std::mem::size_of::<Oid>();

/// a content-addressed object identifier: the SHA-1 hash of an object's
/// canonical `<kind> <len>\0<payload>` framing
#[derive(PartialEq, Eq, Hash, Clone, Ord, PartialOrd, Copy)]
#[repr(transparent)]
pub struct Oid([u8; 20]);

impl Oid {
    /// all-zero sentinel used for objects that have no identity yet
    /// (e.g. a freshly `newobject`ed, not-yet-written object)
    pub const UNKNOWN: Self = Self([0; 20]);

    /// hash of an empty blob
    pub const EMPTY_BLOB: Self = Self([
        0xe6, 0x9d, 0xe2, 0x9b, 0xb2, 0xd1, 0xd6, 0x43, 0x4b, 0x8b, 0x29, 0xae, 0x77, 0x5a, 0xd8,
        0xc2, 0xe4, 0x8c, 0x53, 0x91,
    ]);

    /// hash of an empty tree
    pub const EMPTY_TREE: Self = Self([
        0x4b, 0x82, 0x5d, 0xc6, 0x42, 0xcb, 0x6e, 0xb9, 0xa0, 0x60, 0xe5, 0x4b, 0xf8, 0xd6, 0x92,
        0x88, 0xfb, 0xee, 0x49, 0x04,
    ]);

    #[inline]
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    /// splits the hex representation into the `(2-char dir, 38-char file)` pair
    /// a loose backend lays objects out under
    pub fn split(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_owned(), hex[2..].to_owned())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl From<Output<Sha1>> for Oid {
    fn from(bytes: Output<Sha1>) -> Self {
        Self::new(bytes.as_slice().try_into().unwrap())
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Oid {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self((0..20).map(|_| u8::arbitrary(g)).collect::<Vec<_>>().try_into().unwrap())
    }
}

impl FromStr for Oid {
    type Err = BitGenericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end();
        anyhow::ensure!(s.len() == 40, "invalid oid `{}` (expected 40 hex characters)", s);
        let bytes: Vec<u8> = s.from_hex()?;
        Ok(Self(bytes.try_into().unwrap()))
    }
}

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// hashes `bytes` directly, with no framing applied (used by backends that
/// already have the fully-framed byte sequence in hand)
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> Oid {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    Oid::new(hasher.finalize().as_slice().try_into().unwrap())
}
