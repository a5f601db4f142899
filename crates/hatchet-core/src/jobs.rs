//! Background jobs.
//!
//! A job is a task running on its own thread. Jobs are stopped
//! cooperatively: the table flips the job's stop flag and forgets it, and the
//! task is expected to poll [`JobContext::is_stopped`]. The console reaps
//! finished jobs between commands.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use indexmap::IndexMap;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ids::JobId;

const JOBS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::jobs");

/// Job table failures.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// No tracked job has this id.
    #[error("Invalid job given: {id}!")]
    NotFound {
        /// Requested id.
        id: JobId,
    },

    /// The worker thread could not be spawned.
    #[error("Failed to start job {name}: {source}!")]
    Spawn {
        /// Job name.
        name: String,
        /// Underlying spawn failure.
        #[source]
        source: Arc<io::Error>,
    },
}

/// Handle a running task polls to notice a stop request.
#[derive(Debug, Clone)]
pub struct JobContext {
    id: JobId,
    stop: Arc<AtomicBool>,
}

impl JobContext {
    /// Id of the job running this task.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns `true` once the job has been asked to stop.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Listing row for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    /// Job id.
    pub id: JobId,
    /// Job name.
    pub name: String,
    /// Module the job was started from, if any.
    pub module: Option<String>,
}

/// A finished job removed by [`JobTable::stop_dead`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapedJob {
    /// Job id.
    pub id: JobId,
    /// Job name.
    pub name: String,
    /// The task unwound instead of returning.
    pub panicked: bool,
}

#[derive(Debug)]
struct JobEntry {
    name: String,
    module: Option<String>,
    hidden: bool,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl JobEntry {
    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct JobState {
    next_id: u32,
    jobs: IndexMap<JobId, JobEntry>,
}

/// Process-wide table of background jobs; clones share state.
#[derive(Debug, Clone, Default)]
pub struct JobTable {
    state: Arc<Mutex<JobState>>,
}

impl JobTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on a new thread and tracks it.
    ///
    /// Hidden jobs run and are reaped like any other but are left out of
    /// [`JobTable::list`].
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Spawn`] when the thread cannot be created.
    pub fn create<F>(
        &self,
        name: &str,
        module: Option<String>,
        hidden: bool,
        task: F,
    ) -> Result<JobId, JobError>
    where
        F: FnOnce(JobContext) + Send + 'static,
    {
        let mut state = self.state.lock();
        let id = JobId::new(state.next_id);
        let stop = Arc::new(AtomicBool::new(false));
        let context = JobContext {
            id,
            stop: Arc::clone(&stop),
        };
        let handle = thread::Builder::new()
            .name(format!("job-{id}"))
            .spawn(move || task(context))
            .map_err(|source| JobError::Spawn {
                name: name.to_owned(),
                source: Arc::new(source),
            })?;
        state.next_id = state.next_id.wrapping_add(1);
        state.jobs.insert(
            id,
            JobEntry {
                name: name.to_owned(),
                module,
                hidden,
                stop,
                handle,
            },
        );
        debug!(target: JOBS_TARGET, job = %id, name, hidden, "job started");
        Ok(id)
    }

    /// Signals a job to stop and stops tracking it.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for unknown ids.
    pub fn stop(&self, id: JobId) -> Result<(), JobError> {
        let entry = self
            .state
            .lock()
            .jobs
            .shift_remove(&id)
            .ok_or(JobError::NotFound { id })?;
        entry.signal_stop();
        info!(target: JOBS_TARGET, job = %id, name = %entry.name, "job stopped");
        Ok(())
    }

    /// Signals every job to stop and clears the table.
    pub fn stop_all(&self) {
        let drained: Vec<(JobId, JobEntry)> = self.state.lock().jobs.drain(..).collect();
        for (id, entry) in &drained {
            entry.signal_stop();
            debug!(target: JOBS_TARGET, job = %id, "job stopped");
        }
    }

    /// Removes finished jobs, returning what became of each.
    pub fn stop_dead(&self) -> Vec<ReapedJob> {
        let finished: Vec<(JobId, JobEntry)> = {
            let mut state = self.state.lock();
            let dead: Vec<JobId> = state
                .jobs
                .iter()
                .filter(|(_, entry)| !entry.is_alive())
                .map(|(id, _)| *id)
                .collect();
            dead.into_iter()
                .filter_map(|id| state.jobs.shift_remove(&id).map(|entry| (id, entry)))
                .collect()
        };
        finished
            .into_iter()
            .map(|(id, entry)| {
                let panicked = entry.handle.join().is_err();
                if panicked {
                    warn!(target: JOBS_TARGET, job = %id, name = %entry.name, "job panicked");
                }
                ReapedJob {
                    id,
                    name: entry.name,
                    panicked,
                }
            })
            .collect()
    }

    /// Visible jobs that are still running.
    #[must_use]
    pub fn list(&self) -> Vec<JobSummary> {
        self.state
            .lock()
            .jobs
            .iter()
            .filter(|(_, entry)| !entry.hidden && entry.is_alive())
            .map(|(id, entry)| JobSummary {
                id: *id,
                name: entry.name.clone(),
                module: entry.module.clone(),
            })
            .collect()
    }

    /// Returns `true` when a visible job is still running.
    #[must_use]
    pub fn has_visible(&self) -> bool {
        self.state
            .lock()
            .jobs
            .values()
            .any(|entry| !entry.hidden && entry.is_alive())
    }

    /// Returns `true` while the job is tracked and running.
    #[must_use]
    pub fn is_alive(&self, id: JobId) -> bool {
        self.state.lock().jobs.get(&id).is_some_and(JobEntry::is_alive)
    }

    /// Number of tracked jobs, hidden and finished ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Returns `true` when no jobs are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().jobs.is_empty()
    }
}
