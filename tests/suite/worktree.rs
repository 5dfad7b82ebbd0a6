//! Repository root resolution for plain checkouts, subdirectories and worktrees.

use differing_core::{RepoError, RepoService};

use crate::common::{Fixture, three_commit_repo};

#[tokio::test]
async fn subdirectory_resolves_to_top_level() {
    let history = three_commit_repo();
    let service = RepoService::open(&history.fixture.path().join("src"), Fixture::settings())
        .await
        .unwrap();
    assert_eq!(service.root(), history.fixture.canonical_path());
}

#[tokio::test]
async fn linked_worktree_resolves_to_its_own_root() {
    let history = three_commit_repo();
    let holder = tempfile::tempdir().unwrap();
    let worktree = holder.path().join("wt");
    history.fixture.git(&[
        "worktree",
        "add",
        "-q",
        "-b",
        "side",
        worktree.to_str().unwrap(),
    ]);
    std::fs::write(worktree.join("notes.txt"), "changed only in the worktree\n").unwrap();

    let service = RepoService::open(&worktree, Fixture::settings())
        .await
        .unwrap();
    let canonical = std::fs::canonicalize(&worktree).unwrap();
    assert_eq!(service.root(), canonical);
    assert_ne!(service.root(), history.fixture.canonical_path());

    let pair = service
        .resolve_content(&differing_types::DiffId::Working, "notes.txt")
        .await
        .unwrap();
    assert_eq!(pair.new_content, "changed only in the worktree\n");
    assert_eq!(pair.old_content, "one\ntwo\nthree\nfour\n");

    // The main checkout is untouched.
    let main = history.fixture.service().await;
    assert!(
        main.list_files(&differing_types::DiffId::Working)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn non_repository_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = RepoService::open(dir.path(), Fixture::settings())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotARepository { .. }), "{err:?}");
}

#[tokio::test]
async fn missing_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = RepoService::open(&dir.path().join("nope"), Fixture::settings())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotARepository { .. }), "{err:?}");
}
