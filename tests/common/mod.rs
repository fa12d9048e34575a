//! Common test utilities for media-dl integration tests
//!
//! Fake workers are shell scripts run as `/bin/sh <script> <worker args...>`. Every
//! script starts with a prologue that records the invocation in `invocations.log`
//! and exposes `$output` and `$cookies` from the worker arguments.

#![allow(dead_code)]

use media_dl::{Config, JobEvent};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

pub const SIGN_IN: &str = "ERROR: [youtube] abc: Sign in to confirm you're not a bot";

const PROLOGUE: &str = r#"output=""
cookies=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output) output="$2"; shift ;;
    --cookies) cookies="$2"; shift ;;
  esac
  shift
done
echo "cookies=$cookies output=$output" >> "$(dirname "$0")/invocations.log"
"#;

/// Write a fake worker script into `dir`
pub fn fake_worker(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("worker.sh");
    std::fs::write(&script, format!("{}{}", PROLOGUE, body)).expect("write fake worker");
    script
}

/// Config running `script` through `/bin/sh`, with everything else inside `dir`
pub fn config_for(dir: &Path, script: &Path, with_cookies: bool) -> Config {
    let mut config = Config::default();
    config.download.download_dir = dir.join("downloads");
    config.tools.worker_path = Some(PathBuf::from("/bin/sh"));
    config.tools.worker_args = vec![script.to_string_lossy().into_owned()];
    config.tools.search_path = false;
    config.tools.cookies_file = dir.join("cookies.txt");

    if with_cookies {
        std::fs::write(&config.tools.cookies_file, "# Netscape HTTP Cookie File\n")
            .expect("write cookie file");
    }

    config
}

/// One line per worker invocation, in order
pub fn invocations(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("invocations.log"))
        .map(|log| log.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Drain a job's event stream
pub async fn collect_events(mut events: mpsc::Receiver<JobEvent>) -> Vec<JobEvent> {
    let mut collected = Vec::new();
    while let Some(event) = events.recv().await {
        collected.push(event);
    }
    collected
}
