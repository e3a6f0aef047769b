use super::*;
use crate::kind::ObjectKind;

#[test]
fn newobject_is_in_memory_and_modified() {
    let repo = Repository::in_memory();
    let handle = repo.newobject(ObjectKind::Blob).unwrap();
    let object = handle.borrow();
    assert!(object.is_in_memory());
    assert!(object.is_modified());
    assert_eq!(object.kind(), ObjectKind::Blob);
}

#[test]
fn write_then_lookup_round_trips_and_clears_modified_flag() {
    let repo = Repository::in_memory();
    let handle = repo.newobject(ObjectKind::Blob).unwrap();
    handle.borrow_mut().data_mut().as_blob_mut().unwrap().bytes = b"hello world".to_vec();

    repo.write(&handle).unwrap();
    assert!(!handle.borrow().is_modified());
    assert!(!handle.borrow().is_in_memory());

    let id = handle.borrow().id();
    let looked_up = repo.lookup(id, Some(ObjectKind::Blob)).unwrap();
    assert!(Rc::ptr_eq(&handle, &looked_up));
}

#[test]
fn lookup_type_checks_against_expected_kind() {
    let repo = Repository::in_memory();
    let handle = repo.newobject(ObjectKind::Blob).unwrap();
    repo.write(&handle).unwrap();
    let id = handle.borrow().id();

    let err = repo.lookup(id, Some(ObjectKind::Tree)).unwrap_err();
    let odb_err = err.downcast_ref::<OdbError>().expect("expected an OdbError");
    assert_eq!(
        *odb_err,
        OdbError::InvalidType { expected: ObjectKind::Tree, actual: ObjectKind::Blob }
    );
}

#[test]
fn lookup_of_missing_object_is_not_found() {
    let repo = Repository::in_memory();
    let err = repo.lookup(Oid::new([7; 20]), None).unwrap_err();
    use crate::error::BitResultExt;
    assert!(Err::<(), _>(err).is_not_found_err());
}

#[test]
fn free_object_removes_from_cache() {
    let repo = Repository::in_memory();
    let handle = repo.newobject(ObjectKind::Blob).unwrap();
    repo.write(&handle).unwrap();
    let id = handle.borrow().id();

    repo.free_object(&handle);
    let looked_up = repo.lookup(id, None).unwrap();
    assert!(!Rc::ptr_eq(&handle, &looked_up));
}

#[test]
fn discover_finds_git_dir_in_ancestor_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let git_dir = tmp.path().join(".git");
    std::fs::create_dir_all(git_dir.join("objects")).unwrap();
    std::fs::write(git_dir.join("HEAD"), b"ref: refs/heads/master\n").unwrap();

    let nested = tmp.path().join("src").join("nested");
    std::fs::create_dir_all(&nested).unwrap();

    let layout = RepoLayout::discover(&nested).unwrap();
    assert_eq!(layout.git_dir, git_dir.canonicalize().unwrap());
    assert_eq!(layout.work_tree, Some(tmp.path().canonicalize().unwrap()));
}

#[test]
fn discover_detects_bare_repository() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("objects")).unwrap();
    std::fs::write(tmp.path().join("HEAD"), b"ref: refs/heads/master\n").unwrap();

    let layout = RepoLayout::discover(tmp.path()).unwrap();
    assert!(layout.work_tree.is_none());
}

#[test]
fn discover_fails_outside_any_repository() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(RepoLayout::discover(tmp.path()).is_err());
}
