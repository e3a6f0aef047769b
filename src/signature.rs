use crate::error::BitGenericError;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// `name <email> seconds offset`, matching the line format real commit/tag
/// objects use for `author`/`committer`/`tagger`
#[derive(PartialEq, Clone, Debug)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub time: DateTime<FixedOffset>,
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} {}", self.name, self.email, self.time.timestamp(), format_offset(self.time.offset()))
    }
}

fn format_offset(offset: &FixedOffset) -> String {
    let total_minutes = offset.local_minus_utc() / 60;
    let sign = if total_minutes >= 0 { '+' } else { '-' };
    let minutes = total_minutes.abs();
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}

impl FromStr for Signature {
    type Err = BitGenericError;

    // "Andy Yu <andyyu2004@gmail.com> 1616061862 +1300"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email_start = s.find('<').ok_or_else(|| anyhow::anyhow!("signature missing `<`"))?;
        let email_end = s.find('>').ok_or_else(|| anyhow::anyhow!("signature missing `>`"))?;
        anyhow::ensure!(email_start > 0, "signature missing a name before `<`");

        let name = s[..email_start - 1].to_owned();
        let email = s[email_start + 1..email_end].to_owned();

        let mut rest = s[email_end + 1..].trim_start().split_ascii_whitespace();
        let epoch: i64 = rest
            .next()
            .ok_or_else(|| anyhow::anyhow!("signature missing timestamp"))?
            .parse()?;
        let tz = rest.next().ok_or_else(|| anyhow::anyhow!("signature missing timezone offset"))?;
        anyhow::ensure!(tz.len() == 5, "malformed timezone offset `{}`", tz);

        let sign = match &tz[0..1] {
            "+" => 1,
            "-" => -1,
            _ => anyhow::bail!("malformed timezone offset `{}`", tz),
        };
        let hours: i32 = tz[1..3].parse()?;
        let minutes: i32 = tz[3..5].parse()?;
        let offset_secs = sign * (hours * 3600 + minutes * 60);

        let offset = FixedOffset::east_opt(offset_secs)
            .ok_or_else(|| anyhow::anyhow!("timezone offset `{}` out of range", tz))?;
        let time = offset
            .timestamp_opt(epoch, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("invalid timestamp `{}`", epoch))?;

        Ok(Self { name, email, time })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trips_through_display_and_from_str() {
        let sig = Signature {
            name: "Andy Yu".to_owned(),
            email: "andyyu2004@gmail.com".to_owned(),
            time: FixedOffset::east_opt(13 * 3600).unwrap().timestamp_opt(1616061862, 0).single().unwrap(),
        };
        let formatted = sig.to_string();
        assert_eq!(formatted, "Andy Yu <andyyu2004@gmail.com> 1616061862 +1300");
        assert_eq!(Signature::from_str(&formatted).unwrap(), sig);
    }

    #[test]
    fn negative_offsets_format_with_minus_sign() {
        let sig = Signature {
            name: "A".to_owned(),
            email: "a@b.c".to_owned(),
            time: FixedOffset::west_opt(5 * 3600).unwrap().timestamp_opt(0, 0).single().unwrap(),
        };
        assert_eq!(sig.to_string(), "A <a@b.c> 0 -0500");
    }
}
