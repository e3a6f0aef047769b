use crate::error::BitResult;
use crate::hash::Oid;
use crate::objects::{FileMode, Parse, Serialize};
use std::cmp::Ordering;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub oid: Oid,
}

impl TreeEntry {
    pub fn new(mode: FileMode, name: impl Into<String>, oid: Oid) -> Self {
        Self { mode, name: name.into(), oid }
    }

    /// git's tree-entry order: compares names byte-wise, but a directory
    /// name is compared as if it carried a trailing `/` so e.g. `"foo"`
    /// (a file) sorts before `"foo.txt"`, but `"foo/"` (a directory) sorts
    /// after it
    fn sort_key(&self) -> (&[u8], u8) {
        (self.name.as_bytes(), if self.mode.is_tree() { b'/' } else { 0 })
    }
}

fn entry_cmp(a: &TreeEntry, b: &TreeEntry) -> Ordering {
    let (a_name, a_tag) = a.sort_key();
    let (b_name, b_tag) = b.sort_key();
    let min_len = a_name.len().min(b_name.len());
    a_name[..min_len].cmp(&b_name[..min_len]).then_with(|| {
        let x = if a_name.len() == min_len { a_tag } else { a_name[min_len] };
        let y = if b_name.len() == min_len { b_tag } else { b_name[min_len] };
        x.cmp(&y)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(entry_cmp);
        Self { entries }
    }
}

impl Parse for Tree {
    fn parse(payload: &[u8]) -> BitResult<Self> {
        let mut entries = vec![];
        let mut rest = payload;
        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| anyhow::anyhow!("malformed tree entry: missing mode separator"))?;
            let mode: FileMode = std::str::from_utf8(&rest[..space])?.parse()?;

            let nul = rest[space + 1..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| anyhow::anyhow!("malformed tree entry: missing name terminator"))?
                + space
                + 1;
            let name = std::str::from_utf8(&rest[space + 1..nul])?.to_owned();

            anyhow::ensure!(rest.len() >= nul + 1 + 20, "malformed tree entry: truncated oid");
            let mut oid_bytes = [0u8; 20];
            oid_bytes.copy_from_slice(&rest[nul + 1..nul + 1 + 20]);

            entries.push(TreeEntry::new(mode, name, Oid::new(oid_bytes)));
            rest = &rest[nul + 1 + 20..];
        }
        Ok(Self { entries })
    }
}

impl Serialize for Tree {
    fn serialize(&self, out: &mut dyn Write) -> BitResult<()> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(entry_cmp);
        for entry in &sorted {
            write!(out, "{} {}\0", entry.mode, entry.name)?;
            out.write_all(entry.oid.as_bytes())?;
        }
        Ok(())
    }
}
