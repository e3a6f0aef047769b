use crate::error::BitResult;
use anyhow::Context;
use bitflags::bitflags;
use std::cell::Cell;
use std::fs::File;
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

const LOCK_FILE_EXT: &str = "lock";

bitflags! {
    pub struct LockfileFlags: u8 {
        const SET_READONLY = 1;
    }
}

/// an atomic write-then-rename into `path`, via a sibling `<path>.lock` file
#[derive(Debug)]
pub struct Lockfile {
    lockfile: File,
    flags: LockfileFlags,
    path: PathBuf,
    lockfile_path: PathBuf,
    committed: Cell<bool>,
    rolled_back: Cell<bool>,
}

impl Write for Lockfile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lockfile.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lockfile.flush()
    }
}

impl Lockfile {
    fn open(path: impl AsRef<Path>, flags: LockfileFlags) -> BitResult<Self> {
        let path = path.as_ref();
        let lockfile_path = path.with_extension(LOCK_FILE_EXT);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lockfile = File::options().create_new(true).write(true).open(&lockfile_path).or_else(
            |err| match err.kind() {
                io::ErrorKind::AlreadyExists => Err(err).with_context(|| {
                    format!(
                        "failed to lock file `{}` (`{}` already exists)",
                        path.display(),
                        lockfile_path.display()
                    )
                }),
                _ => Err(err).with_context(|| format!("failed to create file `{}`", path.display())),
            },
        )?;

        Ok(Self {
            lockfile,
            flags,
            lockfile_path,
            path: path.to_path_buf(),
            committed: Cell::new(false),
            rolled_back: Cell::new(false),
        })
    }

    /// runs `f` under an exclusive lock on `path`; commits the lockfile's
    /// contents to `path` if `f` succeeds, rolls back otherwise
    pub fn with_mut<R>(
        path: impl AsRef<Path>,
        flags: LockfileFlags,
        f: impl FnOnce(&mut Self) -> BitResult<R>,
    ) -> BitResult<R> {
        let mut lockfile = Self::open(path, flags)?;
        match f(&mut lockfile) {
            Ok(r) => {
                lockfile.commit().with_context(|| {
                    format!(
                        "failed to write lockfile to `{}`; the updated contents are stored in `{}`; please remove this file when done",
                        lockfile.path.display(),
                        lockfile.lockfile_path.display()
                    )
                })?;
                Ok(r)
            }
            Err(err) => {
                lockfile.rollback();
                Err(err)
            }
        }
    }

    fn commit(&self) -> io::Result<()> {
        if self.rolled_back.get() {
            return Ok(());
        }
        let set_readonly = self.flags.contains(LockfileFlags::SET_READONLY);
        if set_readonly && self.path.exists() {
            let mut permissions = self.path.metadata()?.permissions();
            permissions.set_readonly(false);
            std::fs::set_permissions(&self.path, permissions)?;
        }

        std::fs::rename(&self.lockfile_path, &self.path)?;
        self.committed.set(true);

        if set_readonly {
            let mut permissions = self.path.metadata()?.permissions();
            permissions.set_readonly(true);
            std::fs::set_permissions(&self.path, permissions)?;
        }
        Ok(())
    }

    fn cleanup(&self) -> BitResult<()> {
        std::fs::remove_file(&self.lockfile_path).with_context(|| {
            format!("failed to remove lockfile `{}`", self.lockfile_path.display())
        })
    }

    pub fn rollback(&self) {
        self.rolled_back.set(true);
    }
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        assert!(!self.rolled_back.get() || !self.committed.get());
        if self.rolled_back.get() || !self.committed.get() {
            self.cleanup().unwrap();
        }
    }
}
