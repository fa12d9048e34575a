//! Session credential lookup
//!
//! The worker can be handed a Netscape-format cookie file to act as a signed-in
//! session. Whether that file exists is checked once per request and the answer is
//! passed to the job as a plain value.

use std::fs::File;
use std::path::{Path, PathBuf};

/// A cookie file the worker can use to authenticate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    cookie_file: PathBuf,
}

impl Credentials {
    /// Wrap a cookie file path
    pub fn new(cookie_file: impl Into<PathBuf>) -> Self {
        Self {
            cookie_file: cookie_file.into(),
        }
    }

    /// Path of the cookie file
    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }
}

/// Looks up the well-known cookie file on disk
#[derive(Clone, Debug)]
pub struct CredentialResolver {
    path: PathBuf,
}

impl CredentialResolver {
    /// Create a resolver for the given cookie file location
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location this resolver checks
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the credentials if the cookie file is a readable regular file
    ///
    /// Never fails: any access error counts as "no credentials".
    pub fn resolve(&self) -> Option<Credentials> {
        match File::open(&self.path).and_then(|file| file.metadata()) {
            Ok(metadata) if metadata.is_file() => Some(Credentials::new(&self.path)),
            Ok(_) => {
                tracing::debug!(path = %self.path.display(), "Cookie path is not a regular file");
                None
            }
            Err(e) => {
                tracing::trace!(path = %self.path.display(), error = %e, "No cookie file available");
                None
            }
        }
    }
}
