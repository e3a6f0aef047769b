use crate::backend::Backend;
use crate::error::{BitResult, BitResultExt, OdbError};
use crate::hash::Oid;
use crate::io::BufReadExt;
use crate::kind::{frame_and_hash, ObjectHeader, ObjectKind, RawObject};
use crate::lockfile::{Lockfile, LockfileFlags};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{prelude::*, BufReader};
use std::path::{Path, PathBuf};

/// a loose-file-per-object backend: each object lives zlib-compressed at
/// `<objects_dir>/<2-hex>/<38-hex>`, written via an atomic lockfile-then-rename.
/// This is illustrative, not a byte-exact reimplementation of any particular
/// VCS's on-disk format (see crate-level non-goals).
pub struct LooseBackend {
    objects_dir: PathBuf,
    priority: i32,
}

impl LooseBackend {
    pub fn new(objects_dir: impl AsRef<Path>) -> BitResult<Self> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        anyhow::ensure!(
            objects_dir.exists(),
            "objects directory `{}` does not exist",
            objects_dir.display()
        );
        Ok(Self { objects_dir, priority: 0 })
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn obj_path(&self, oid: Oid) -> PathBuf {
        let (dir, file) = oid.split();
        self.objects_dir.join(dir).join(file)
    }

    fn open_stream(&self, id: Oid) -> BitResult<BufReader<ZlibDecoder<File>>> {
        let path = self.obj_path(id);
        let file = File::open(&path).map_err(|_| anyhow::anyhow!(OdbError::NotFound(id)))?;
        Ok(BufReader::new(ZlibDecoder::new(file)))
    }
}

impl Backend for LooseBackend {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn read(&self, id: Oid) -> BitResult<RawObject> {
        let mut stream = self.open_stream(id)?;
        let kind: ObjectKind = stream.read_ascii_str(b' ')?;
        let len = stream.read_ascii_num(0)?;
        let mut payload = Vec::with_capacity(len as usize);
        stream.read_to_end(&mut payload)?;
        anyhow::ensure!(payload.len() as u64 == len, "loose object `{}` has truncated payload", id);
        Ok(RawObject::new(kind, payload))
    }

    fn read_header(&self, id: Oid) -> BitResult<ObjectHeader> {
        let mut stream = self.open_stream(id)?;
        let kind: ObjectKind = stream.read_ascii_str(b' ')?;
        let len = stream.read_ascii_num(0)?;
        Ok(ObjectHeader { kind, len })
    }

    fn write(&self, raw: &RawObject) -> BitResult<Oid> {
        let (oid, framed) = frame_and_hash(raw)?;
        let path = self.obj_path(oid);
        if path.exists() {
            // content-addressing guarantees this is the same content; nothing to do
            return Ok(oid);
        }

        Lockfile::with_mut(&path, LockfileFlags::SET_READONLY, |lockfile| {
            let mut encoder = ZlibEncoder::new(lockfile, Compression::default());
            encoder.write_all(&framed)?;
            encoder.finish()?;
            Ok(())
        })?;
        Ok(oid)
    }

    fn exists(&self, id: Oid) -> BitResult<bool> {
        Ok(self.obj_path(id).exists())
    }
}
