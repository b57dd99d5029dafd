//! Periodic background jobs
//!
//! Each scheduled job runs in its own tokio task on a fixed interval and owns
//! a child of the scheduler's cancellation token. Jobs only read the stores
//! through their snapshot queries.

pub mod jobs;

use crate::error::{RentalError, Result};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use jobs::{ActiveReservationReport, FleetAvailabilityCheck, ReservationEndingReminder};

type JobTask = (tokio::task::JoinHandle<()>, CancellationToken);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Message produced by a job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub job: String,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(job: &str, message: impl Into<String>) -> Self {
        Self {
            job: job.to_string(),
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(job: &str, message: impl Into<String>) -> Self {
        Self {
            job: job.to_string(),
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.job, self.message)
    }
}

/// A unit of periodic work.
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, now: NaiveDateTime) -> Vec<Notice>;
}

pub struct Scheduler {
    tasks: Arc<RwLock<HashMap<String, JobTask>>>,
    root: CancellationToken,
    grace: Duration,
    notices: Option<mpsc::Sender<Notice>>,
}

impl Scheduler {
    /// `grace` bounds how long cancellation waits for a running job.
    pub fn new(grace: Duration) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            root: CancellationToken::new(),
            grace,
            notices: None,
        }
    }

    /// Forward every notice to `tx` in addition to logging it.
    pub fn with_notices(mut self, tx: mpsc::Sender<Notice>) -> Self {
        self.notices = Some(tx);
        self
    }

    /// Starts `job`, first run immediately, then every `period`.
    pub async fn schedule(&self, job: Arc<dyn ScheduledJob>, period: Duration) -> Result<()> {
        if period.is_zero() {
            return Err(RentalError::invalid("job period", "must be positive"));
        }

        let name = job.name().to_string();
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&name) {
            return Err(RentalError::invalid(
                "job",
                format!("'{name}' is already scheduled"),
            ));
        }

        let token = self.root.child_token();
        let task_token = token.clone();
        let notices = self.notices.clone();
        let job_name = name.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Job {} cancelled", job_name);
                        break;
                    }
                    _ = ticker.tick() => {
                        let now = Local::now().naive_local();
                        for notice in job.run(now) {
                            match notice.level {
                                NoticeLevel::Info => info!("{}", notice),
                                NoticeLevel::Warning => warn!("{}", notice),
                            }
                            if let Some(tx) = &notices {
                                if tx.send(notice).await.is_err() {
                                    debug!("Notice receiver for job {} dropped", job_name);
                                }
                            }
                        }
                    }
                }
            }
        });

        tasks.insert(name.clone(), (task, token));
        info!("Scheduled job {} every {:?}", name, period);
        Ok(())
    }

    /// Stops one job. Returns false when no job has that name.
    pub async fn cancel(&self, name: &str) -> bool {
        let entry = self.tasks.write().await.remove(name);
        match entry {
            Some(task) => {
                self.stop(name, task).await;
                true
            }
            None => false,
        }
    }

    /// Stops every job and waits for each up to the grace period.
    pub async fn shutdown(&self) {
        self.root.cancel();
        let drained: Vec<(String, JobTask)> = self.tasks.write().await.drain().collect();
        for (name, task) in drained {
            self.stop(&name, task).await;
        }
        info!("Scheduler stopped");
    }

    pub async fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn stop(&self, name: &str, (task, token): JobTask) {
        token.cancel();
        match tokio::time::timeout(self.grace, task).await {
            Ok(Ok(())) => debug!("Job {} stopped", name),
            Ok(Err(e)) => warn!("Job {} failed: {}", name, e),
            Err(_) => warn!("Job {} did not stop within {:?}", name, self.grace),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
