use crate::error::BitResult;
use crate::objects::{Parse, Serialize};
use std::io::Write;

/// raw, uninterpreted payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl Parse for Blob {
    fn parse(payload: &[u8]) -> BitResult<Self> {
        Ok(Self { bytes: payload.to_vec() })
    }
}

impl Serialize for Blob {
    fn serialize(&self, out: &mut dyn Write) -> BitResult<()> {
        Ok(out.write_all(&self.bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_round_trips_arbitrary_bytes() {
        let blob = Blob::new(vec![0, 1, 2, 255, 254, b'\n']);
        let mut buf = vec![];
        blob.serialize(&mut buf).unwrap();
        assert_eq!(Blob::parse(&buf).unwrap(), blob);
    }

    #[test]
    fn empty_blob_round_trips() {
        let blob = Blob::new(vec![]);
        let mut buf = vec![];
        blob.serialize(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(Blob::parse(&buf).unwrap(), blob);
    }
}
