//! In-flight generation jobs, one per logical slot.
//!
//! A slot is a name chosen by the host ("canvas", "edit:<layer>", ...).
//! Starting a job in a busy slot is refused. Cancelling aborts the job's
//! future; the caller then sees [`GenerationOutcome::Cancelled`] and nothing
//! else happens.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{AbortHandle, Abortable};

use crate::error::{GenerationError, GenerationResult};

/// How a generation job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The service returned images (data URLs).
    Completed(Vec<String>),
    /// The job failed; the message is meant for the user.
    Failed(String),
    /// The job was cancelled before it finished.
    Cancelled,
}

impl GenerationOutcome {
    /// Images of a completed job.
    #[must_use]
    pub fn images(&self) -> Option<&[String]> {
        match self {
            Self::Completed(images) => Some(images),
            _ => None,
        }
    }
}

type SlotMap = HashMap<String, AbortHandle>;

/// Tracks which slots have a job running.
#[derive(Debug, Clone, Default)]
pub struct JobSlots {
    active: Arc<Mutex<SlotMap>>,
}

/// Frees the slot when the job finishes or its future is dropped.
struct SlotGuard {
    active: Arc<Mutex<SlotMap>>,
    slot: String,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.slot);
    }
}

fn lock(active: &Mutex<SlotMap>) -> MutexGuard<'_, SlotMap> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobSlots {
    /// No jobs running.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` in `slot`.
    ///
    /// Errors from the job are folded into [`GenerationOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::SlotBusy`] if the slot already has a job.
    pub async fn run<F>(&self, slot: impl Into<String>, job: F) -> GenerationResult<GenerationOutcome>
    where
        F: Future<Output = GenerationResult<Vec<String>>>,
    {
        let slot = slot.into();
        let (handle, registration) = AbortHandle::new_pair();
        {
            let mut active = lock(&self.active);
            if active.contains_key(&slot) {
                tracing::warn!("Refusing second generation job in slot '{slot}'");
                return Err(GenerationError::SlotBusy(slot));
            }
            active.insert(slot.clone(), handle);
        }
        let _guard = SlotGuard {
            active: Arc::clone(&self.active),
            slot: slot.clone(),
        };

        tracing::debug!("Generation job started in slot '{slot}'");
        let outcome = match Abortable::new(job, registration).await {
            Ok(Ok(images)) => GenerationOutcome::Completed(images),
            Ok(Err(err)) => {
                tracing::warn!("Generation job in slot '{slot}' failed: {err}");
                GenerationOutcome::Failed(err.to_string())
            }
            Err(_aborted) => {
                tracing::info!("Generation job in slot '{slot}' cancelled");
                GenerationOutcome::Cancelled
            }
        };
        Ok(outcome)
    }

    /// Cancel the job in `slot`. Returns whether one was running.
    pub fn cancel(&self, slot: &str) -> bool {
        match lock(&self.active).get(slot) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Whether `slot` has a job running.
    #[must_use]
    pub fn is_busy(&self, slot: &str) -> bool {
        lock(&self.active).contains_key(slot)
    }

    /// Number of running jobs.
    #[must_use]
    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }
}
