//! Cron expression handling and the per-job timer task.
//!
//! Stored schedules use the classic 5-field syntax (minute precision). The
//! `cron` crate expects a leading seconds field, so 5-field expressions are
//! run at second 0. 6-field expressions are taken as-is. All times are UTC.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SchedulerError;

/// Convert a 5- or 6-field expression to the 6-field form.
pub fn normalize_cron(expr: &str) -> Result<String, SchedulerError> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 => Ok(fields.join(" ")),
        n => Err(SchedulerError::invalid_schedule(
            expr,
            format!("expected 5 or 6 fields, got {}", n),
        )),
    }
}

/// Parse a 5- or 6-field cron expression.
pub fn parse_schedule(expr: &str) -> Result<Schedule, SchedulerError> {
    let normalized = normalize_cron(expr)?;
    Schedule::from_str(&normalized)
        .map_err(|e| SchedulerError::invalid_schedule(expr, e.to_string()))
}

/// A running cron timer.
///
/// The timer awaits each run before computing its next fire time, so runs of
/// one timer never overlap. Cancelling stops future firings without
/// interrupting a run in progress. Dropping the timer cancels it.
pub struct CronTimer {
    name: String,
    cron_expr: String,
    schedule: Schedule,
    cancel: CancellationToken,
    fire_count: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl CronTimer {
    /// Spawn a timer that calls `task` at every fire time of `cron_expr`.
    pub fn start<F, Fut>(
        name: impl Into<String>,
        cron_expr: &str,
        task: F,
    ) -> Result<Self, SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let schedule = parse_schedule(cron_expr)?;
        let cancel = CancellationToken::new();
        let fire_count = Arc::new(AtomicU64::new(0));

        let handle = tokio::spawn(run_timer(
            name.clone(),
            schedule.clone(),
            cancel.clone(),
            fire_count.clone(),
            task,
        ));
        info!("Cron timer '{}' started with schedule '{}'", name, cron_expr);

        Ok(Self {
            name,
            cron_expr: cron_expr.to_string(),
            schedule,
            cancel,
            fire_count,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cron_expr(&self) -> &str {
        &self.cron_expr
    }

    /// Number of times the timer has fired.
    pub fn fire_count(&self) -> u64 {
        self.fire_count.load(Ordering::Relaxed)
    }

    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        if !self.is_running() {
            return None;
        }
        self.schedule.upcoming(Utc).next()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }

    /// Stop future firings.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Cancelling cron timer '{}'", self.name);
            self.cancel.cancel();
        }
    }
}

impl Drop for CronTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_timer<F, Fut>(
    name: String,
    schedule: Schedule,
    cancel: CancellationToken,
    fire_count: Arc<AtomicU64>,
    task: F,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut last_fire = Utc::now();

    loop {
        let after = Utc::now().max(last_fire);
        let Some(next) = schedule.after(&after).next() else {
            debug!("Cron timer '{}' has no upcoming fire time", name);
            break;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        last_fire = next;
        fire_count.fetch_add(1, Ordering::Relaxed);
        debug!("Cron timer '{}' fired for {}", name, next);
        task().await;
    }

    debug!("Cron timer '{}' stopped", name);
}

#[cfg(test)]
#[path = "cron_timer_tests.rs"]
mod tests;
