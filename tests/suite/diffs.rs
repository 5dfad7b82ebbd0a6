//! Diff enumeration and commit ranges against real repositories.

use differing_core::RepoError;
use differing_types::{CommitId, DiffId};

use crate::common::{Fixture, three_commit_repo};

fn commit(id: &str) -> DiffId {
    DiffId::Commit(CommitId::new(id).unwrap())
}

#[tokio::test]
async fn working_entry_leads_and_commits_follow_newest_first() {
    let history = three_commit_repo();
    history
        .fixture
        .write("notes.txt", "one\ntwo\nthree\nfour\nfive\n");
    let service = history.fixture.service().await;

    let diffs = service.list_diffs().await.unwrap();
    let ids: Vec<String> = diffs.iter().map(|d| d.id.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "working".to_string(),
            history.c3.clone(),
            history.c2.clone(),
            history.c1.clone()
        ]
    );

    let working = &diffs[0];
    assert_eq!(working.message, "Working Changes");
    assert_eq!(working.files_count, 1);
    assert_eq!(working.additions, 1);
    assert_eq!(working.deletions, 0);

    assert_eq!(diffs[1].message, "C3: bump answer");
    assert_eq!(diffs[1].author, "Test Author");
    assert_eq!(diffs[1].files_count, 1);
    assert_eq!(diffs[1].additions, 1);
    assert_eq!(diffs[1].deletions, 1);
}

#[tokio::test]
async fn clean_single_commit_repo_still_lists_working_entry() {
    let mut fixture = Fixture::new();
    fixture.write("a.txt", "a\n");
    fixture.commit_all("only");
    let service = fixture.service().await;

    let diffs = service.list_diffs().await.unwrap();
    assert_eq!(diffs.len(), 2);
    assert!(diffs[0].id.is_working());
    assert_eq!(diffs[0].files_count, 0);
    assert_eq!(diffs[0].additions, 0);
}

#[tokio::test]
async fn root_commit_counts_as_full_addition() {
    let mut fixture = Fixture::new();
    fixture.write("a.txt", "1\n2\n3\n");
    fixture.write("b.txt", "x\n");
    fixture.commit_all("root");
    let service = fixture.service().await;

    let diffs = service.list_diffs().await.unwrap();
    let root = &diffs[1];
    assert_eq!(root.files_count, 2);
    assert_eq!(root.additions, 4);
    assert_eq!(root.deletions, 0);
}

#[tokio::test]
async fn commit_stats_add_up_across_files() {
    let mut fixture = Fixture::new();
    fixture.write("a.txt", "keep\ndrop\n");
    fixture.commit_all("base");
    fixture.write("a.txt", "keep\nn1\nn2\nn3\n");
    fixture.write("b.txt", "b1\nb2\n");
    fixture.commit_all("change");
    let service = fixture.service().await;

    let diffs = service.list_diffs().await.unwrap();
    let change = &diffs[1];
    assert_eq!(change.files_count, 2);
    assert_eq!(change.additions, 5);
    assert_eq!(change.deletions, 1);
}

#[tokio::test]
async fn binary_files_count_without_lines() {
    let mut fixture = Fixture::new();
    fixture.write("a.txt", "a\n");
    fixture.commit_all("base");
    std::fs::write(fixture.path().join("blob.bin"), [0u8, 1, 2, 0, 255]).unwrap();
    fixture.write("a.txt", "a\nb\n");
    fixture.commit_all("binary");
    let service = fixture.service().await;

    let diffs = service.list_diffs().await.unwrap();
    assert_eq!(diffs[1].files_count, 2);
    assert_eq!(diffs[1].additions, 1);
}

#[tokio::test]
async fn recent_window_respects_max_commits() {
    let mut fixture = Fixture::new();
    for i in 0..5 {
        fixture.write("a.txt", &format!("{i}\n"));
        fixture.commit_all(&format!("commit {i}"));
    }
    let mut settings = Fixture::settings();
    settings.max_commits = 3;
    let service = differing_core::RepoService::open(fixture.path(), settings)
        .await
        .unwrap();

    let diffs = service.list_diffs().await.unwrap();
    assert_eq!(diffs.len(), 4);
    assert_eq!(diffs[1].message, "commit 4");
}

#[tokio::test]
async fn unborn_repository_has_only_the_working_entry() {
    let fixture = Fixture::new();
    fixture.write("staged.txt", "one\ntwo\n");
    fixture.git(&["add", "staged.txt"]);
    let service = fixture.service().await;

    let diffs = service.list_diffs().await.unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].files_count, 1);
    assert_eq!(diffs[0].additions, 2);

    assert!(
        service
            .list_commits(&DiffId::Working)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(service.head().await.unwrap().is_none());
}

#[tokio::test]
async fn commit_range_runs_from_parent_exclusive_to_head() {
    let history = three_commit_repo();
    let service = history.fixture.service().await;

    let records = service.list_commits(&commit(&history.c2)).await.unwrap();
    let ids: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec![history.c3.clone(), history.c2.clone()]);
    assert!(records[0].is_head);
    assert_eq!(records.iter().filter(|r| r.is_head).count(), 1);
}

#[tokio::test]
async fn root_commit_range_covers_all_history() {
    let history = three_commit_repo();
    let service = history.fixture.service().await;

    let records = service.list_commits(&commit(&history.c1)).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].id.as_str(), history.c1);
    assert!(records[0].is_head);
}

#[tokio::test]
async fn abbreviated_ids_resolve() {
    let history = three_commit_repo();
    let service = history.fixture.service().await;

    let records = service
        .list_commits(&commit(&history.c3[..10]))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.as_str(), history.c3);
}

#[tokio::test]
async fn working_commit_list_matches_recent_window() {
    let history = three_commit_repo();
    let service = history.fixture.service().await;

    let records = service.list_commits(&DiffId::Working).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records[0].is_head);
    assert_eq!(records[0].message, "C3: bump answer");
}

#[tokio::test]
async fn unknown_commit_is_reported() {
    let history = three_commit_repo();
    let service = history.fixture.service().await;

    let err = service
        .list_commits(&commit("deadbeefdeadbeef"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::UnknownRevision { .. }), "{err:?}");
}
