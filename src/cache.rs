use crate::hash::Oid;
use crate::repo::Object;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ObjectHandle = Rc<RefCell<Object>>;

/// identifier-keyed cache of live typed objects, owned by a repository.
/// Invariant: for any key `k` present, the cached handle's object has
/// `id == k` and `in_memory == false`; in-memory (not-yet-written) objects
/// live outside the cache until their first successful write.
#[derive(Default)]
pub struct ObjectCache {
    objects: FxHashMap<Oid, ObjectHandle>,
}

impl ObjectCache {
    pub fn get(&self, oid: Oid) -> Option<ObjectHandle> {
        // cloning the `Rc` is what gives `lookup` its pointer-identity guarantee:
        // repeated lookups of the same oid return the same underlying `Object`
        self.objects.get(&oid).cloned()
    }

    pub fn insert(&mut self, oid: Oid, handle: ObjectHandle) {
        self.objects.insert(oid, handle);
    }

    pub fn remove(&mut self, oid: Oid) {
        self.objects.remove(&oid);
    }

    /// removes `old` (if present) and inserts `handle` under `new` — the
    /// write-back re-keying step; a no-op removal if `old` was never cached
    /// (e.g. this was a fresh `newobject`)
    pub fn rekey(&mut self, old: Option<Oid>, new: Oid, handle: ObjectHandle) {
        if let Some(old) = old {
            self.objects.remove(&old);
        }
        self.objects.insert(new, handle);
    }
}
