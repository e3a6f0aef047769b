use crate::error::BitResult;
use std::io::prelude::*;
use std::str::FromStr;

pub(crate) trait BufReadExt: BufRead {
    /// reads the bytes up to (and consuming) `sep`, parsing them as base-10 ascii
    fn read_ascii_num(&mut self, sep: u8) -> BitResult<u64> {
        let mut buf = vec![];
        let n = self.read_until(sep, &mut buf)?;
        anyhow::ensure!(n > 0 && buf.last() == Some(&sep), "unexpected eof reading ascii number");
        Ok(std::str::from_utf8(&buf[..n - 1])?.parse()?)
    }

    /// reads the bytes up to (and consuming) `sep`, parsing them via `FromStr`
    fn read_ascii_str<T>(&mut self, sep: u8) -> BitResult<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let mut buf = vec![];
        let n = self.read_until(sep, &mut buf)?;
        anyhow::ensure!(n > 0 && buf.last() == Some(&sep), "unexpected eof reading ascii field");
        Ok(std::str::from_utf8(&buf[..n - 1])?.parse()?)
    }
}

impl<R: BufRead + ?Sized> BufReadExt for R {
}
