//! Shared test utilities and fixtures
//!
//! Every fixture is a real git repository in a temporary directory, driven with
//! the `git` binary the service itself uses.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use differing_core::{RepoService, RepoSettings};
use tempfile::TempDir;

const BASE_EPOCH: u64 = 1_700_000_000;

pub struct Fixture {
    dir: TempDir,
    commits: u64,
}

impl Fixture {
    /// An empty repository with an identity configured and no commits.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let fixture = Self { dir, commits: 0 };
        fixture.git(&["init", "-q"]);
        fixture.git(&["config", "user.name", "Test Author"]);
        fixture.git(&["config", "user.email", "author@example.com"]);
        fixture.git(&["config", "commit.gpgsign", "false"]);
        fixture.git(&["config", "core.autocrlf", "false"]);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn canonical_path(&self) -> PathBuf {
        fs::canonicalize(self.path()).expect("canonicalize fixture root")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).expect("read fixture file")
    }

    /// Run git in the fixture, panicking on failure. Returns trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        git_in(self.path(), args, self.commits)
    }

    /// Stage everything and commit with a distinct, increasing timestamp.
    pub fn commit_all(&mut self, message: &str) -> String {
        self.commits += 1;
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "--no-verify", "-m", message]);
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn settings() -> RepoSettings {
        RepoSettings::default()
    }

    pub async fn service(&self) -> RepoService {
        self.service_with(Self::settings()).await
    }

    pub async fn service_with(&self, settings: RepoSettings) -> RepoService {
        RepoService::open(self.path(), settings)
            .await
            .expect("open fixture repository")
    }
}

pub fn git_in(dir: &Path, args: &[&str], tick: u64) -> String {
    let date = format!("{} +0000", BASE_EPOCH + tick * 60);
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_DATE", &date)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// C1 → C2 → C3 (HEAD), with `notes.txt` tracked since C1.
pub struct History {
    pub fixture: Fixture,
    pub c1: String,
    pub c2: String,
    pub c3: String,
}

pub fn three_commit_repo() -> History {
    let mut fixture = Fixture::new();
    fixture.write("notes.txt", "one\ntwo\nthree\n");
    let c1 = fixture.commit_all("C1: add notes");

    fixture.write("notes.txt", "one\ntwo\nthree\nfour\n");
    fixture.write("src/lib.rs", "pub fn answer() -> u32 {\n    42\n}\n");
    let c2 = fixture.commit_all("C2: add lib");

    fixture.write("src/lib.rs", "pub fn answer() -> u32 {\n    43\n}\n");
    let c3 = fixture.commit_all("C3: bump answer");

    History {
        fixture,
        c1,
        c2,
        c3,
    }
}

/// A running HTTP server over a fixture, torn down on drop.
pub struct TestServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start(service: RepoService) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(differing_server::serve(
            listener,
            Arc::new(service),
            std::future::pending(),
        ));
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
