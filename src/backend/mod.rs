mod loose;
mod memory;

pub use loose::LooseBackend;
pub use memory::MemoryBackend;

use crate::error::{BitResult, BitResultExt, OdbError};
use crate::hash::Oid;
use crate::kind::{ObjectHeader, RawObject};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// a pluggable storage provider. `priority` and `read` are the only required
/// methods; the others fall back to defaults derived from `read`.
pub trait Backend: Send + Sync {
    fn priority(&self) -> i32;

    fn read(&self, id: Oid) -> BitResult<RawObject>;

    /// default: read the full object and discard the payload
    fn read_header(&self, id: Oid) -> BitResult<ObjectHeader> {
        Ok(self.read(id)?.header())
    }

    /// default: this backend does not support writes
    fn write(&self, _raw: &RawObject) -> BitResult<Oid> {
        anyhow::bail!("backend does not support writes")
    }

    /// default: "I don't know" rather than "no" — callers should not treat a
    /// `false` here as authoritative unless every backend returned it
    fn exists(&self, _id: Oid) -> BitResult<bool> {
        Ok(false)
    }
}

/// a backend plus the bound/unbound flag that enforces "a backend is bound to
/// at most one ODB at a time". Cloning a handle shares the same flag, so
/// adding a clone to a second `Odb` while the first still holds it fails with
/// [`OdbError::Busy`].
#[derive(Clone)]
pub struct BackendHandle {
    backend: Arc<dyn Backend>,
    bound: Arc<AtomicBool>,
}

impl BackendHandle {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self { backend: Arc::new(backend), bound: Arc::new(AtomicBool::new(false)) }
    }

    fn bind(&self) -> BitResult<()> {
        if self.bound.swap(true, Ordering::AcqRel) {
            anyhow::bail!(OdbError::Busy);
        }
        Ok(())
    }

    /// releases this handle so it may be bound to a different `Odb`
    pub fn unbind(&self) {
        self.bound.store(false, Ordering::Release);
    }
}

/// the object database façade: a priority-sorted, descending-order sequence
/// of backends, dispatched with first-success semantics
pub struct Odb {
    backends: Vec<BackendHandle>,
}

impl Odb {
    pub fn new() -> Self {
        Self { backends: vec![] }
    }

    /// binds `handle` to this odb (failing with [`OdbError::Busy`] if it is
    /// already bound elsewhere), then re-sorts backends by descending
    /// priority (ties broken by insertion order, i.e. a stable sort). Adding
    /// a handle already registered with this same odb is a no-op, not an
    /// error — re-binding is only refused across distinct odbs.
    pub fn add_backend(&mut self, handle: BackendHandle) -> BitResult<()> {
        if self.backends.iter().any(|h| Arc::ptr_eq(&h.backend, &handle.backend)) {
            return Ok(());
        }
        handle.bind()?;
        self.backends.push(handle);
        self.backends.sort_by_key(|h| std::cmp::Reverse(h.backend.priority()));
        Ok(())
    }

    pub fn with_backend(mut self, handle: BackendHandle) -> BitResult<Self> {
        self.add_backend(handle)?;
        Ok(self)
    }

    /// constructs an odb backed by a [`LooseBackend`] rooted at `objects_dir`;
    /// failure to construct the loose backend is non-fatal (the odb is simply
    /// left with no backends, matching the teacher's `open` tolerance of a
    /// missing objects directory)
    pub fn open(objects_dir: impl AsRef<Path>) -> BitResult<Self> {
        let mut odb = Self::new();
        if let Ok(loose) = LooseBackend::new(objects_dir.as_ref()) {
            odb.add_backend(BackendHandle::new(loose))?;
        }
        Ok(odb)
    }

    pub fn exists(&self, id: Oid) -> bool {
        self.backends.iter().any(|h| {
            log::trace!("Odb::exists(id: {}) :: trying backend", id);
            h.backend.exists(id).unwrap_or(false)
        })
    }

    /// tries each backend's `read` in order; any error (not just not-found —
    /// a corrupted or erroring higher-priority backend must not hide a good
    /// copy held by a lower-priority one) falls through to the next backend
    pub fn read(&self, id: Oid) -> BitResult<RawObject> {
        let mut last_err = None;
        for handle in &self.backends {
            log::trace!("Odb::read(id: {}) :: trying backend", id);
            match handle.backend.read(id) {
                Ok(raw) => return Ok(raw),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!(OdbError::NotFound(id))))
    }

    /// tries each backend's `read_header` in order with the same any-error
    /// fallthrough as `read`; on total failure, falls back to a full `read`
    /// and discards the payload
    pub fn read_header(&self, id: Oid) -> BitResult<ObjectHeader> {
        let mut last_err = None;
        for handle in &self.backends {
            log::trace!("Odb::read_header(id: {}) :: trying backend", id);
            match handle.backend.read_header(id) {
                Ok(header) => return Ok(header),
                Err(err) => last_err = Some(err),
            }
        }
        match self.read(id) {
            Ok(raw) => Ok(raw.header()),
            Err(_) => Err(last_err.unwrap_or_else(|| anyhow::anyhow!(OdbError::NotFound(id)))),
        }
    }

    pub fn write(&self, raw: &RawObject) -> BitResult<Oid> {
        let mut last_err = None;
        for handle in &self.backends {
            log::trace!("Odb::write(kind: {}) :: trying backend", raw.kind);
            match handle.backend.write(raw) {
                Ok(oid) => return Ok(oid),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no backend accepted the write")))
    }
}

impl Default for Odb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::hash_raw_object;

    #[test]
    fn add_backend_sorts_descending_by_priority() {
        let mut odb = Odb::new();
        odb.add_backend(BackendHandle::new(MemoryBackend::new(1))).unwrap();
        odb.add_backend(BackendHandle::new(MemoryBackend::new(10))).unwrap();
        odb.add_backend(BackendHandle::new(MemoryBackend::new(5))).unwrap();
        let priorities: Vec<i32> = odb.backends.iter().map(|h| h.backend.priority()).collect();
        assert_eq!(priorities, vec![10, 5, 1]);
    }

    #[test]
    fn adding_the_same_handle_to_the_same_odb_twice_is_idempotent() {
        let handle = BackendHandle::new(MemoryBackend::new(0));
        let mut odb = Odb::new();
        odb.add_backend(handle.clone()).unwrap();
        odb.add_backend(handle).unwrap();
        assert_eq!(odb.backends.len(), 1);
    }

    #[test]
    fn adding_a_bound_handle_twice_fails_busy() {
        let handle = BackendHandle::new(MemoryBackend::new(0));
        let mut a = Odb::new();
        let mut b = Odb::new();
        a.add_backend(handle.clone()).unwrap();
        let err = b.add_backend(handle).unwrap_err();
        assert!(matches!(err.downcast_ref::<OdbError>(), Some(OdbError::Busy)));
    }

    #[test]
    fn read_on_empty_odb_is_not_found() {
        let odb = Odb::new();
        let err = odb.read(Oid::UNKNOWN).unwrap_err();
        assert!(err.is_not_found_err());
    }

    #[test]
    fn write_then_read_round_trips_through_first_backend() {
        let mut odb = Odb::new();
        odb.add_backend(BackendHandle::new(MemoryBackend::new(0))).unwrap();
        let raw = RawObject::new(crate::kind::ObjectKind::Blob, b"hello".to_vec());
        let oid = odb.write(&raw).unwrap();
        assert!(odb.exists(oid));
        assert_eq!(odb.read(oid).unwrap(), raw);
    }

    /// a backend that always fails with an opaque (non-`OdbError`) error,
    /// standing in for e.g. a corrupted loose object or a zlib failure
    struct AlwaysErrorsBackend {
        priority: i32,
    }

    impl Backend for AlwaysErrorsBackend {
        fn priority(&self) -> i32 {
            self.priority
        }

        fn read(&self, _id: Oid) -> BitResult<RawObject> {
            anyhow::bail!("simulated corruption")
        }
    }

    #[test]
    fn read_falls_through_a_non_not_found_error_to_a_lower_priority_backend() {
        let mut odb = Odb::new();
        odb.add_backend(BackendHandle::new(AlwaysErrorsBackend { priority: 10 })).unwrap();
        odb.add_backend(BackendHandle::new(MemoryBackend::new(1))).unwrap();

        let raw = RawObject::new(crate::kind::ObjectKind::Blob, b"good copy".to_vec());
        let oid = hash_raw_object(&raw).unwrap();
        // write directly to the lower-priority backend, bypassing `Odb::write`
        // (which would itself only try the first backend)
        match odb.backends.iter().find(|h| h.backend.priority() == 1) {
            Some(h) => {
                h.backend.write(&raw).unwrap();
            }
            None => panic!("expected the memory backend to be registered"),
        }

        assert_eq!(odb.read(oid).unwrap(), raw);
        assert_eq!(odb.read_header(oid).unwrap(), raw.header());
    }
}
