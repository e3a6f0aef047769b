use crate::error::BitResult;
use crate::hash::Oid;
use crate::kind::ObjectKind;
use crate::objects::{Parse, Serialize};
use crate::signature::Signature;
use std::io::Write;
use std::str::FromStr;

/// `object <oid>\ntype <kind>\ntag <name>\ntagger <sig>\n\n<message>`
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub target: Oid,
    pub target_kind: ObjectKind,
    pub tag: String,
    pub tagger: Signature,
    pub message: String,
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            target: Oid::UNKNOWN,
            target_kind: ObjectKind::Commit,
            tag: String::new(),
            tagger: Signature {
                name: String::new(),
                email: String::new(),
                time: chrono::FixedOffset::east_opt(0).unwrap().timestamp_opt(0, 0).single().unwrap(),
            },
            message: String::new(),
        }
    }
}

impl Parse for Tag {
    fn parse(payload: &[u8]) -> BitResult<Self> {
        let text = std::str::from_utf8(payload)?;
        let mut target = None;
        let mut target_kind = None;
        let mut tag = None;
        let mut tagger = None;

        let mut lines = text.split('\n');
        for line in &mut lines {
            if line.is_empty() {
                break;
            }
            let (key, rest) = line
                .split_once(' ')
                .ok_or_else(|| anyhow::anyhow!("malformed tag header line `{}`", line))?;
            match key {
                "object" => target = Some(Oid::from_str(rest)?),
                "type" => target_kind = Some(ObjectKind::from_name(rest)?),
                "tag" => tag = Some(rest.to_owned()),
                "tagger" => tagger = Some(Signature::from_str(rest)?),
                other => anyhow::bail!("unrecognized tag header field `{}`", other),
            }
        }

        let message = lines.collect::<Vec<_>>().join("\n");

        Ok(Self {
            target: target.ok_or_else(|| anyhow::anyhow!("tag missing `object` field"))?,
            target_kind: target_kind.ok_or_else(|| anyhow::anyhow!("tag missing `type` field"))?,
            tag: tag.ok_or_else(|| anyhow::anyhow!("tag missing `tag` field"))?,
            tagger: tagger.ok_or_else(|| anyhow::anyhow!("tag missing `tagger` field"))?,
            message,
        })
    }
}

impl Serialize for Tag {
    fn serialize(&self, out: &mut dyn Write) -> BitResult<()> {
        writeln!(out, "object {}", self.target)?;
        writeln!(out, "type {}", self.target_kind)?;
        writeln!(out, "tag {}", self.tag)?;
        writeln!(out, "tagger {}", self.tagger)?;
        writeln!(out)?;
        write!(out, "{}", self.message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips() {
        let tag = Tag {
            target: Oid::EMPTY_TREE,
            target_kind: ObjectKind::Commit,
            tag: "v1.0.0".to_owned(),
            tagger: Signature {
                name: "Andy Yu".to_owned(),
                email: "andyyu2004@gmail.com".to_owned(),
                time: chrono::FixedOffset::east_opt(0).unwrap().timestamp_opt(1616061862, 0).single().unwrap(),
            },
            message: "release v1.0.0\n".to_owned(),
        };
        let mut buf = vec![];
        tag.serialize(&mut buf).unwrap();
        assert_eq!(Tag::parse(&buf).unwrap(), tag);
    }
}
