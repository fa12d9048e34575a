//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::worker::{WorkerHandle, WorkerInvocation, WorkerLauncher, WorkerOutcome};
use async_trait::async_trait;
use futures::{FutureExt, StreamExt, stream};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// What one scripted worker execution writes and how it ends
#[derive(Clone, Debug)]
pub(crate) struct ScriptedRun {
    pub(crate) stdout: Vec<Vec<u8>>,
    pub(crate) stderr: Vec<Vec<u8>>,
    pub(crate) outcome: WorkerOutcome,
}

impl ScriptedRun {
    /// Exits successfully after writing `stdout` chunk by chunk
    pub(crate) fn success(stdout: &[&str]) -> Self {
        Self {
            stdout: stdout.iter().map(|s| s.as_bytes().to_vec()).collect(),
            stderr: Vec::new(),
            outcome: WorkerOutcome::Success,
        }
    }

    /// Fails with `message` after writing `stdout`
    pub(crate) fn failure(stdout: &[&str], message: &str) -> Self {
        Self {
            stdout: stdout.iter().map(|s| s.as_bytes().to_vec()).collect(),
            stderr: vec![format!("{}\n", message).into_bytes()],
            outcome: WorkerOutcome::failure(message),
        }
    }

    pub(crate) fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = vec![stderr.as_bytes().to_vec()];
        self
    }
}

/// In-memory launcher replaying scripted runs in order and recording every invocation
///
/// Once the script is exhausted, launches fail to start.
#[derive(Debug, Default)]
pub(crate) struct ScriptedLauncher {
    runs: Mutex<VecDeque<ScriptedRun>>,
    invocations: Mutex<Vec<WorkerInvocation>>,
}

impl ScriptedLauncher {
    pub(crate) fn new(runs: Vec<ScriptedRun>) -> Arc<Self> {
        Arc::new(Self {
            runs: Mutex::new(runs.into()),
            invocations: Mutex::new(Vec::new()),
        })
    }

    /// Invocations received so far
    pub(crate) fn invocations(&self) -> Vec<WorkerInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerLauncher for ScriptedLauncher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn launch(&self, invocation: &WorkerInvocation) -> WorkerHandle {
        self.invocations.lock().unwrap().push(invocation.clone());

        let Some(run) = self.runs.lock().unwrap().pop_front() else {
            return WorkerHandle::failed_to_start("failed to start scripted worker: script exhausted");
        };

        WorkerHandle::new(
            stream::iter(run.stdout).boxed(),
            stream::iter(run.stderr).boxed(),
            futures::future::ready(run.outcome).boxed(),
        )
    }
}

/// Helper to create a test MediaDownloader backed by `launcher`.
/// Returns the downloader and the tempdir (which must be kept alive).
///
/// With `with_cookies`, the cookie file exists so the credentialed retry is available.
pub(crate) async fn create_test_downloader(
    launcher: Arc<ScriptedLauncher>,
    with_cookies: bool,
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.tools.cookies_file = temp_dir.path().join("cookies.txt");

    if with_cookies {
        std::fs::write(
            &config.tools.cookies_file,
            "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n",
        )
        .unwrap();
    }

    let downloader = MediaDownloader::with_launcher(config, launcher)
        .await
        .unwrap();

    (downloader, temp_dir)
}
