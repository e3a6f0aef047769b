use crate::backend::{BackendHandle, MemoryBackend, Odb};
use crate::cache::{ObjectCache, ObjectHandle};
use crate::error::{BitResult, OdbError};
use crate::hash::Oid;
use crate::kind::{ObjectKind, RawObject};
use crate::objects::ObjectData;
use crate::source::Source;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

pub const OBJECTS_DIR_NAME: &str = "objects";
pub const HEAD_FILE_NAME: &str = "HEAD";
pub const INDEX_FILE_NAME: &str = "index";

/// the resolved filesystem layout of a repository: where its object
/// database, index, and (if any) work tree live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    pub git_dir: PathBuf,
    pub objects_dir: PathBuf,
    pub index_file: PathBuf,
    /// `None` for a bare repository
    pub work_tree: Option<PathBuf>,
}

impl RepoLayout {
    pub fn with_overrides(
        git_dir: impl Into<PathBuf>,
        objects_dir: impl Into<PathBuf>,
        index_file: impl Into<PathBuf>,
        work_tree: Option<PathBuf>,
    ) -> Self {
        Self {
            git_dir: git_dir.into(),
            objects_dir: objects_dir.into(),
            index_file: index_file.into(),
            work_tree,
        }
    }

    fn git_dir_layout(git_dir: PathBuf, work_tree: Option<PathBuf>) -> Self {
        let objects_dir = git_dir.join(OBJECTS_DIR_NAME);
        let index_file = git_dir.join(INDEX_FILE_NAME);
        Self { git_dir, objects_dir, index_file, work_tree }
    }

    fn looks_like_git_dir(candidate: &Path) -> bool {
        candidate.join(OBJECTS_DIR_NAME).is_dir() && candidate.join(HEAD_FILE_NAME).is_file()
    }

    /// walks `start` and its ancestors looking for a `.git` (or, for local
    /// testing convenience, `.bit`) directory containing `objects/` and
    /// `HEAD`. If `start` itself directly contains `objects/`+`HEAD` with no
    /// enclosing work tree, the repository is bare.
    pub fn discover(start: impl AsRef<Path>) -> BitResult<Self> {
        let start = start.as_ref().canonicalize()?;

        if Self::looks_like_git_dir(&start) {
            return Ok(Self::git_dir_layout(start, None));
        }

        let mut dir = Some(start.as_path());
        while let Some(d) = dir {
            for candidate_name in [".git", ".bit"] {
                let git_dir = d.join(candidate_name);
                if Self::looks_like_git_dir(&git_dir) {
                    return Ok(Self::git_dir_layout(git_dir, Some(d.to_path_buf())));
                }
            }
            dir = d.parent();
        }

        anyhow::bail!("not a repository (or any parent directory): {}", start.display())
    }
}

/// a mutated-in-place, cache-resident typed object: owning repository
/// back-reference, current identifier (meaningless while `in_memory`), a
/// source buffer, and the parsed payload
pub struct Object {
    owner: Weak<RepositoryInner>,
    id: Oid,
    data: ObjectData,
    source: Source,
    modified: bool,
    in_memory: bool,
}

impl Object {
    #[cfg(test)]
    pub(crate) fn for_test(id: Oid, data: ObjectData, source: Source, modified: bool, in_memory: bool) -> Self {
        Self { owner: Weak::new(), id, data, source, modified, in_memory }
    }

    /// meaningless while `in_memory()` is true — callers must not observe it
    pub fn id(&self) -> Oid {
        assert!(!self.in_memory, "attempted to read the identifier of an in-memory object");
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.data.kind()
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ObjectData {
        self.modified = true;
        &mut self.data
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    /// the owning repository, if it is still alive
    pub fn owner(&self) -> Option<Repository> {
        self.owner.upgrade().map(Repository)
    }
}

struct RepositoryInner {
    layout: Option<RepoLayout>,
    odb: Odb,
    cache: RefCell<ObjectCache>,
}

/// the owner of an odb, an object cache, and (if present) a resolved
/// filesystem layout. `Clone` is a cheap `Rc` bump, matching the teacher's
/// `Copy`-handle repository pattern, adapted to give cached objects genuine
/// pointer identity via `Rc<RefCell<Object>>` rather than arena indices.
#[derive(Clone)]
pub struct Repository(Rc<RepositoryInner>);

impl Repository {
    fn from_odb(layout: Option<RepoLayout>, odb: Odb) -> Self {
        Self(Rc::new(RepositoryInner { layout, odb, cache: RefCell::new(ObjectCache::default()) }))
    }

    /// a repository backed purely by an in-memory odb; useful for tests and
    /// embedders that don't want a filesystem at all
    pub fn in_memory() -> Self {
        let mut odb = Odb::new();
        odb.add_backend(BackendHandle::new(MemoryBackend::default())).expect("fresh handle cannot be busy");
        Self::from_odb(None, odb)
    }

    /// discovers a repository by walking up from `path`, opening its odb
    /// against the resolved `objects_dir`
    pub fn discover(path: impl AsRef<Path>) -> BitResult<Self> {
        let layout = RepoLayout::discover(path)?;
        let odb = Odb::open(&layout.objects_dir)?;
        Ok(Self::from_odb(Some(layout), odb))
    }

    /// opens a repository at an explicitly given layout, bypassing discovery
    pub fn with_layout(layout: RepoLayout) -> BitResult<Self> {
        let odb = Odb::open(&layout.objects_dir)?;
        Ok(Self::from_odb(Some(layout), odb))
    }

    pub fn layout(&self) -> Option<&RepoLayout> {
        self.0.layout.as_ref()
    }

    fn downgrade(&self) -> Weak<RepositoryInner> {
        Rc::downgrade(&self.0)
    }

    /// allocates a typed object of `kind`, in-memory and modified, not yet
    /// inserted into the cache
    pub fn newobject(&self, kind: ObjectKind) -> BitResult<ObjectHandle> {
        anyhow::ensure!(kind.is_loose(), "cannot allocate a new object of non-loose kind `{}`", kind);
        let data = ObjectData::empty(kind)?;
        let object = Object {
            owner: self.downgrade(),
            id: Oid::UNKNOWN,
            data,
            source: Source::new(),
            modified: true,
            in_memory: true,
        };
        Ok(Rc::new(RefCell::new(object)))
    }

    /// cache hit returns the cached handle directly (no re-read, pointer
    /// identical to any earlier `lookup` of the same id). On miss, reads
    /// through the odb, type-checks against `expected_kind` (`None` means
    /// "do not type-check"), parses, and caches.
    pub fn lookup(&self, id: Oid, expected_kind: Option<ObjectKind>) -> BitResult<ObjectHandle> {
        if let Some(handle) = self.0.cache.borrow().get(id) {
            return Ok(handle);
        }

        let raw = self.0.odb.read(id)?;
        if let Some(expected) = expected_kind {
            anyhow::ensure!(
                raw.kind == expected,
                OdbError::InvalidType { expected, actual: raw.kind }
            );
        }

        let data = ObjectData::parse(raw.kind, &raw.payload)?;
        let object = Object {
            owner: self.downgrade(),
            id,
            data,
            source: Source::from_bytes(raw.payload).closed(),
            modified: false,
            in_memory: false,
        };
        let handle = Rc::new(RefCell::new(object));
        self.0.cache.borrow_mut().insert(id, handle.clone());
        Ok(handle)
    }

    /// no-op if the object is unmodified. Otherwise serializes into a fresh
    /// write buffer, writes it through the odb, and re-keys the cache under
    /// the returned identifier. A failed serialize or odb write leaves the
    /// object `modified` (retryable) with its source buffer in the state the
    /// failure left it in.
    pub fn write(&self, handle: &ObjectHandle) -> BitResult<()> {
        let mut object = handle.borrow_mut();
        if !object.modified {
            return Ok(());
        }

        let old_id = if object.in_memory { None } else { Some(object.id) };

        let mut source = Source::new();
        object.data.serialize(&mut source)?;
        let raw = RawObject::new(object.data.kind(), source.as_slice().to_vec());

        let new_id = self.0.odb.write(&raw)?;

        self.0.cache.borrow_mut().rekey(old_id, new_id, handle.clone());
        object.id = new_id;
        object.modified = false;
        object.in_memory = false;
        object.source.close();
        Ok(())
    }

    /// closes the object's source buffer and removes it from the cache
    /// (a no-op if it was never cached, e.g. an in-memory object that was
    /// never written)
    pub fn free_object(&self, handle: &ObjectHandle) {
        let mut object = handle.borrow_mut();
        object.source.close();
        if !object.in_memory {
            self.0.cache.borrow_mut().remove(object.id);
        }
    }

    /// re-reads raw bytes from the odb into the object's source buffer;
    /// requires the object to not be in-memory
    pub fn source_open(&self, handle: &ObjectHandle) -> BitResult<()> {
        let mut object = handle.borrow_mut();
        anyhow::ensure!(!object.in_memory, "cannot source_open an in-memory object");
        let raw = self.0.odb.read(object.id)?;
        object.source = Source::from_bytes(raw.payload);
        Ok(())
    }

    pub fn source_close(&self, handle: &ObjectHandle) {
        handle.borrow_mut().source.close();
    }
}

#[cfg(test)]
mod tests;
