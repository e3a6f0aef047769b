use crate::error::BitResult;
use crate::hash::Oid;
use crate::objects::{Parse, Serialize};
use crate::signature::Signature;
use std::io::Write;
use std::str::FromStr;

/// `tree <oid>\n(parent <oid>\n)*author <sig>\ncommitter <sig>\n(gpgsig <sig>\n)?\n<message>`
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub tree: Oid,
    /// zero for a root commit, more than one for a merge commit
    pub parents: Vec<Oid>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
    pub gpgsig: Option<String>,
}

impl Default for Commit {
    fn default() -> Self {
        Self {
            tree: Oid::UNKNOWN,
            parents: vec![],
            author: Signature { name: String::new(), email: String::new(), time: default_time() },
            committer: Signature { name: String::new(), email: String::new(), time: default_time() },
            message: String::new(),
            gpgsig: None,
        }
    }
}

fn default_time() -> chrono::DateTime<chrono::FixedOffset> {
    chrono::FixedOffset::east_opt(0).unwrap().timestamp_opt(0, 0).single().unwrap()
}

impl Parse for Commit {
    fn parse(payload: &[u8]) -> BitResult<Self> {
        let text = std::str::from_utf8(payload)?;
        let mut tree = None;
        let mut parents = vec![];
        let mut author = None;
        let mut committer = None;
        let mut gpgsig: Option<String> = None;

        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            if line.is_empty() {
                break;
            }
            let (key, rest) = line
                .split_once(' ')
                .ok_or_else(|| anyhow::anyhow!("malformed commit header line `{}`", line))?;
            match key {
                "tree" => tree = Some(Oid::from_str(rest)?),
                "parent" => parents.push(Oid::from_str(rest)?),
                "author" => author = Some(Signature::from_str(rest)?),
                "committer" => committer = Some(Signature::from_str(rest)?),
                "gpgsig" => {
                    // continuation lines are indented with a single leading space
                    let mut sig = rest.to_owned();
                    while let Some(cont) = lines.peek() {
                        if !cont.starts_with(' ') {
                            break;
                        }
                        sig.push('\n');
                        sig.push_str(&cont[1..]);
                        lines.next();
                    }
                    gpgsig = Some(sig);
                }
                other => anyhow::bail!("unrecognized commit header field `{}`", other),
            }
        }

        let message = lines.collect::<Vec<_>>().join("\n");

        Ok(Self {
            tree: tree.ok_or_else(|| anyhow::anyhow!("commit missing `tree` field"))?,
            parents,
            author: author.ok_or_else(|| anyhow::anyhow!("commit missing `author` field"))?,
            committer: committer.ok_or_else(|| anyhow::anyhow!("commit missing `committer` field"))?,
            message,
            gpgsig,
        })
    }
}

impl Serialize for Commit {
    fn serialize(&self, out: &mut dyn Write) -> BitResult<()> {
        writeln!(out, "tree {}", self.tree)?;
        for parent in &self.parents {
            writeln!(out, "parent {}", parent)?;
        }
        writeln!(out, "author {}", self.author)?;
        writeln!(out, "committer {}", self.committer)?;
        if let Some(gpgsig) = &self.gpgsig {
            write!(out, "gpgsig {}", gpgsig.replace('\n', "\n "))?;
            writeln!(out)?;
        }
        writeln!(out)?;
        write!(out, "{}", self.message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str) -> Signature {
        Signature {
            name: name.to_owned(),
            email: format!("{}@example.com", name),
            time: chrono::FixedOffset::east_opt(0).unwrap().timestamp_opt(1616061862, 0).single().unwrap(),
        }
    }

    #[test]
    fn root_commit_round_trips() {
        let commit = Commit {
            tree: Oid::EMPTY_TREE,
            parents: vec![],
            author: sig("author"),
            committer: sig("committer"),
            message: "initial commit\n".to_owned(),
            gpgsig: None,
        };
        let mut buf = vec![];
        commit.serialize(&mut buf).unwrap();
        assert_eq!(Commit::parse(&buf).unwrap(), commit);
    }

    #[test]
    fn merge_commit_with_multiple_parents_round_trips() {
        let commit = Commit {
            tree: Oid::EMPTY_TREE,
            parents: vec![Oid::EMPTY_BLOB, Oid::EMPTY_TREE],
            author: sig("author"),
            committer: sig("committer"),
            message: "merge\n".to_owned(),
            gpgsig: None,
        };
        let mut buf = vec![];
        commit.serialize(&mut buf).unwrap();
        let parsed = Commit::parse(&buf).unwrap();
        assert_eq!(parsed.parents, commit.parents);
    }

    #[test]
    fn gpgsig_continuation_lines_round_trip() {
        let commit = Commit {
            tree: Oid::EMPTY_TREE,
            parents: vec![],
            author: sig("author"),
            committer: sig("committer"),
            message: "signed commit\n".to_owned(),
            gpgsig: Some("-----BEGIN PGP SIGNATURE-----\nabc123\n-----END PGP SIGNATURE-----".to_owned()),
        };
        let mut buf = vec![];
        commit.serialize(&mut buf).unwrap();
        assert_eq!(Commit::parse(&buf).unwrap(), commit);
    }
}
