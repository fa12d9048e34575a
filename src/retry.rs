//! Credential retry coordination
//!
//! A job runs the worker at most twice. The first attempt never carries credentials.
//! If it fails with an authentication error and a cookie file is available, one more
//! attempt runs with the cookie file attached. Nothing else is retried.
//!
//! [`RetryCoordinator`] is a pure state machine: it decides which attempt runs next
//! and how each [`WorkerOutcome`] resolves the job, while the caller performs the
//! attempts. The same coordinator drives streaming downloads and single-shot
//! metadata lookups.
//!
//! # Example
//!
//! ```
//! use media_dl::credentials::Credentials;
//! use media_dl::retry::{Resolution, RetryCoordinator, RetryState};
//! use media_dl::worker::WorkerOutcome;
//!
//! let mut coordinator = RetryCoordinator::new(Some(Credentials::new("cookies.txt")));
//!
//! assert!(coordinator.next_attempt().is_some());
//! let first = WorkerOutcome::failure("ERROR: Sign in to confirm you're not a bot");
//! assert!(coordinator.observe(first).is_none());
//! assert_eq!(coordinator.state(), RetryState::RetryingWithCredentials);
//!
//! let attempt = coordinator.next_attempt().expect("retry attempt");
//! assert!(attempt.credentials().is_some());
//! let resolution = coordinator.observe(WorkerOutcome::Success);
//! assert!(matches!(resolution, Some(Resolution::Succeeded { attempts: 2 })));
//! assert_eq!(coordinator.state(), RetryState::Done);
//! ```

use crate::credentials::Credentials;
use crate::error::WorkerError;
use crate::worker::{WorkerInvocation, WorkerOutcome};

/// Maximum number of worker attempts per job
pub const MAX_ATTEMPTS: u32 = 2;

/// Coordinator state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// First attempt pending or running, no credentials
    Initial,
    /// Second attempt pending or running, with credentials
    RetryingWithCredentials,
    /// Resolved; no further attempts
    Done,
}

/// What the next attempt should look like
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptPlan<'a> {
    number: u32,
    credentials: Option<&'a Credentials>,
}

impl<'a> AttemptPlan<'a> {
    /// 1 for the initial attempt, 2 for the retry
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Credentials to attach, if any
    pub fn credentials(&self) -> Option<&'a Credentials> {
        self.credentials
    }

    /// Apply this plan to the job's base invocation
    pub fn apply(&self, base: &WorkerInvocation) -> WorkerInvocation {
        match self.credentials {
            Some(credentials) => base.with_credentials(credentials),
            None => base.clone(),
        }
    }
}

/// How a job ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// An attempt succeeded
    Succeeded {
        /// Attempts run, including the successful one
        attempts: u32,
    },
    /// The job failed
    Failed {
        /// Classified failure
        error: WorkerError,
        /// Attempts run
        attempts: u32,
    },
}

impl Resolution {
    /// Attempts run before resolving
    pub fn attempts(&self) -> u32 {
        match self {
            Resolution::Succeeded { attempts } | Resolution::Failed { attempts, .. } => *attempts,
        }
    }
}

/// State machine for the single credential retry
#[derive(Debug)]
pub struct RetryCoordinator {
    state: RetryState,
    credentials: Option<Credentials>,
    attempts: u32,
}

impl RetryCoordinator {
    /// Start in [`RetryState::Initial`]
    ///
    /// `credentials` is the per-request lookup result; it is not re-checked later.
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            state: RetryState::Initial,
            credentials,
            attempts: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Plan the attempt for the current state, or `None` once done
    pub fn next_attempt(&mut self) -> Option<AttemptPlan<'_>> {
        let credentials = match self.state {
            RetryState::Initial => None,
            RetryState::RetryingWithCredentials => self.credentials.as_ref(),
            RetryState::Done => return None,
        };
        self.attempts += 1;
        Some(AttemptPlan {
            number: self.attempts,
            credentials,
        })
    }

    /// Feed the outcome of the attempt just run
    ///
    /// Returns the resolution when the job is finished, or `None` when another
    /// attempt must run. Outcomes arriving after resolution are ignored.
    pub fn observe(&mut self, outcome: WorkerOutcome) -> Option<Resolution> {
        let attempts = self.attempts;
        match (self.state, outcome) {
            (RetryState::Done, _) => {
                tracing::debug!("Ignoring worker outcome after job resolution");
                None
            }
            (_, WorkerOutcome::Success) => {
                self.state = RetryState::Done;
                Some(Resolution::Succeeded { attempts })
            }
            (
                RetryState::Initial,
                WorkerOutcome::Failure {
                    message,
                    is_auth_error: true,
                },
            ) => {
                if self.credentials.is_some() {
                    tracing::info!(
                        attempt = attempts,
                        "Worker requires sign-in, retrying with credentials"
                    );
                    self.state = RetryState::RetryingWithCredentials;
                    None
                } else {
                    tracing::info!(
                        attempt = attempts,
                        "Worker requires sign-in and no credentials are available"
                    );
                    self.state = RetryState::Done;
                    Some(Resolution::Failed {
                        error: WorkerError::AuthRequired { message },
                        attempts,
                    })
                }
            }
            (RetryState::Initial, WorkerOutcome::Failure { message, .. }) => {
                self.state = RetryState::Done;
                Some(Resolution::Failed {
                    error: WorkerError::Failed { message },
                    attempts,
                })
            }
            (RetryState::RetryingWithCredentials, WorkerOutcome::Failure { message, .. }) => {
                self.state = RetryState::Done;
                Some(Resolution::Failed {
                    error: WorkerError::RetryFailed { message },
                    attempts,
                })
            }
        }
    }
}
