//! Scheduler registry: job name to cron timer.
//!
//! All changes to the table go through one lock, and the previous timer of a
//! name is cancelled before its replacement starts. Runs of the same name
//! share a run lock, so a run started by a replaced timer never overlaps one
//! started by its successor.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use repocast_protocols::JobOutcome;

use crate::cron_timer::{parse_schedule, CronTimer};
use crate::error::SchedulerError;
use crate::jobs::{JobContext, JobKind};
use crate::runner::{JobPanic, JobRunner};

struct Entry {
    kind: JobKind,
    schedule: String,
    is_active: bool,
    timer: Option<CronTimer>,
    run_lock: Arc<Mutex<()>>,
}

impl Entry {
    fn running(&self) -> bool {
        self.timer.as_ref().is_some_and(CronTimer::is_running)
    }
}

/// Snapshot of one registered job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobState {
    pub name: String,
    pub schedule: String,
    pub is_active: bool,
    /// Whether a timer is currently running for the job.
    pub running: bool,
    pub next_run: Option<DateTime<Utc>>,
    /// Firings of the current timer.
    pub fire_count: u64,
}

pub struct SchedulerRegistry {
    runner: Arc<JobRunner>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl SchedulerRegistry {
    /// Create an empty registry and the receiver of job panics.
    pub fn new(context: Arc<JobContext>) -> (Arc<Self>, mpsc::UnboundedReceiver<JobPanic>) {
        let (runner, panics) = JobRunner::new(context);
        let registry = Self {
            runner: Arc::new(runner),
            entries: Mutex::new(HashMap::new()),
        };
        (Arc::new(registry), panics)
    }

    pub fn context(&self) -> &Arc<JobContext> {
        self.runner.context()
    }

    /// Create or replace the registration of `name`.
    ///
    /// A timer is started only when `is_active` is set and `schedule` is not
    /// empty. A malformed schedule is rejected and leaves any existing
    /// registration untouched.
    pub async fn register(
        &self,
        name: &str,
        kind: JobKind,
        schedule: &str,
        is_active: bool,
    ) -> Result<(), SchedulerError> {
        let mut entries = self.entries.lock().await;
        self.install(&mut entries, name, kind, schedule, is_active)
    }

    /// Change the schedule and/or activity of a registered job.
    pub async fn reconfigure(
        &self,
        name: &str,
        schedule: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<(), SchedulerError> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get(name)
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))?;

        let kind = entry.kind;
        let schedule = schedule.map(str::to_string).unwrap_or_else(|| entry.schedule.clone());
        let is_active = is_active.unwrap_or(entry.is_active);
        self.install(&mut entries, name, kind, &schedule, is_active)
    }

    /// Re-register `name` from its persisted setting.
    pub async fn reload_from_store(&self, name: &str) -> Result<(), SchedulerError> {
        let kind =
            JobKind::from_name(name).ok_or_else(|| SchedulerError::NotFound(name.to_string()))?;
        let setting = self
            .context()
            .store
            .get_job_setting(name)
            .await?
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))?;

        self.register(name, kind, &setting.schedule, setting.is_active)
            .await
    }

    /// Register every known job from storage. Returns the number registered.
    ///
    /// Jobs with a malformed schedule are skipped.
    pub async fn start_from_store(&self) -> Result<usize, SchedulerError> {
        let settings = self.context().store.get_all_job_settings().await?;
        let mut registered = 0;

        for setting in settings {
            let Some(kind) = JobKind::from_name(&setting.name) else {
                warn!("Ignoring setting of unknown job '{}'", setting.name);
                continue;
            };
            match self
                .register(&setting.name, kind, &setting.schedule, setting.is_active)
                .await
            {
                Ok(()) => registered += 1,
                Err(e) => error!("Skipping job '{}': {}", setting.name, e),
            }
        }

        info!("Registered {} scheduled jobs", registered);
        Ok(registered)
    }

    /// Whether a timer is running for `name`.
    pub async fn status(&self, name: &str) -> Result<bool, SchedulerError> {
        let entries = self.entries.lock().await;
        entries
            .get(name)
            .map(Entry::running)
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))
    }

    /// Snapshot of all registered jobs, ordered by name.
    pub async fn statuses(&self) -> Vec<JobState> {
        let entries = self.entries.lock().await;
        let mut states: Vec<JobState> = entries
            .iter()
            .map(|(name, entry)| JobState {
                name: name.clone(),
                schedule: entry.schedule.clone(),
                is_active: entry.is_active,
                running: entry.running(),
                next_run: entry.timer.as_ref().and_then(CronTimer::next_fire_time),
                fire_count: entry.timer.as_ref().map_or(0, CronTimer::fire_count),
            })
            .collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }

    /// Number of running timers.
    pub async fn running_timers(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|entry| entry.running()).count()
    }

    /// Run `name` once, outside its timer.
    pub async fn run_now(&self, name: &str) -> Result<JobOutcome, SchedulerError> {
        let (kind, run_lock) = {
            let entries = self.entries.lock().await;
            match entries.get(name) {
                Some(entry) => (entry.kind, entry.run_lock.clone()),
                None => (
                    JobKind::from_name(name)
                        .ok_or_else(|| SchedulerError::NotFound(name.to_string()))?,
                    Arc::new(Mutex::new(())),
                ),
            }
        };

        let _guard = run_lock.lock().await;
        self.runner.run(kind).await
    }

    /// Cancel every timer. Runs in progress complete.
    pub async fn shutdown(&self) {
        let entries = self.entries.lock().await;
        for entry in entries.values() {
            if let Some(ref timer) = entry.timer {
                timer.cancel();
            }
        }
        info!("Scheduler stopped");
    }

    fn install(
        &self,
        entries: &mut HashMap<String, Entry>,
        name: &str,
        kind: JobKind,
        schedule: &str,
        is_active: bool,
    ) -> Result<(), SchedulerError> {
        let schedule = schedule.trim();
        if !schedule.is_empty() {
            parse_schedule(schedule)?;
        }

        let run_lock = match entries.remove(name) {
            Some(previous) => {
                if let Some(timer) = previous.timer {
                    debug!(
                        "Replacing timer '{}' ({}) after {} firings",
                        timer.name(),
                        timer.cron_expr(),
                        timer.fire_count()
                    );
                    timer.cancel();
                }
                previous.run_lock
            }
            None => Arc::new(Mutex::new(())),
        };

        let timer = if is_active && !schedule.is_empty() {
            Some(self.start_timer(name, kind, schedule, run_lock.clone())?)
        } else {
            debug!("Job '{}' registered without a timer", name);
            None
        };

        entries.insert(
            name.to_string(),
            Entry {
                kind,
                schedule: schedule.to_string(),
                is_active,
                timer,
                run_lock,
            },
        );
        Ok(())
    }

    fn start_timer(
        &self,
        name: &str,
        kind: JobKind,
        schedule: &str,
        run_lock: Arc<Mutex<()>>,
    ) -> Result<CronTimer, SchedulerError> {
        let runner = self.runner.clone();
        CronTimer::start(name, schedule, move || {
            let runner = runner.clone();
            let run_lock = run_lock.clone();
            async move {
                let _guard = run_lock.lock().await;
                if let Err(e) = runner.run(kind).await {
                    error!("Scheduled run of '{}' did not complete: {}", kind, e);
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
