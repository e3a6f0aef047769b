use crate::backend::Backend;
use crate::error::{BitResult, OdbError};
use crate::hash::Oid;
use crate::kind::{hash_raw_object, ObjectHeader, RawObject};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// an in-process object store, guarded by a `RwLock`. Useful both as the
/// minimal backend needed to exercise the façade and cache in tests without
/// touching a filesystem, and as a pure in-memory object store for embedders.
/// Read-your-writes within a single instance is immediate.
pub struct MemoryBackend {
    priority: i32,
    objects: RwLock<FxHashMap<Oid, RawObject>>,
}

impl MemoryBackend {
    pub fn new(priority: i32) -> Self {
        Self { priority, objects: RwLock::new(FxHashMap::default()) }
    }
}

impl Default for MemoryBackend {
    /// high default priority so this backend is tried before disk-backed
    /// backends in tests that register both
    fn default() -> Self {
        Self::new(100)
    }
}

impl Backend for MemoryBackend {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn read(&self, id: Oid) -> BitResult<RawObject> {
        self.objects.read().get(&id).cloned().ok_or_else(|| anyhow::anyhow!(OdbError::NotFound(id)))
    }

    fn read_header(&self, id: Oid) -> BitResult<ObjectHeader> {
        Ok(self.read(id)?.header())
    }

    fn write(&self, raw: &RawObject) -> BitResult<Oid> {
        let oid = hash_raw_object(raw)?;
        self.objects.write().insert(oid, raw.clone());
        Ok(oid)
    }

    fn exists(&self, id: Oid) -> BitResult<bool> {
        Ok(self.objects.read().contains_key(&id))
    }
}
