use std::{collections::VecDeque, process::Stdio, sync::Arc};

use chrono::Utc;
use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    sync::{watch, Mutex},
};
use uuid::Uuid;

use super::dto::{JobStatus, TrainingJob};
use crate::error::TrainingError;

const OUTPUT_TAIL_CHARS: usize = 2000;
// Enough bytes for OUTPUT_TAIL_CHARS of any UTF-8 text.
const OUTPUT_TAIL_BYTES: usize = OUTPUT_TAIL_CHARS * 4;
const MAX_FINISHED_JOBS: usize = 100;

pub type SuccessHook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Registry of training runs. At most one job is pending or running at a time.
#[derive(Clone)]
pub struct TrainingJobs {
    inner: Arc<Inner>,
}

struct Inner {
    command: String,
    jobs: DashMap<Uuid, TrainingJob>,
    active: Mutex<Option<Uuid>>,
    on_success: Option<SuccessHook>,
    max_finished: usize,
}

pub struct TrainingHandle {
    pub job: TrainingJob,
    status: watch::Receiver<JobStatus>,
}

impl TrainingJobs {
    pub fn new(command: impl Into<String>) -> Self {
        Self::build(command.into(), None, MAX_FINISHED_JOBS)
    }

    /// `hook` runs after a successful exit, before waiters are notified.
    pub fn with_success_hook(command: impl Into<String>, hook: SuccessHook) -> Self {
        Self::build(command.into(), Some(hook), MAX_FINISHED_JOBS)
    }

    fn build(command: String, on_success: Option<SuccessHook>, max_finished: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                command,
                jobs: DashMap::new(),
                active: Mutex::new(None),
                on_success,
                max_finished,
            }),
        }
    }

    pub async fn start(&self) -> Result<TrainingHandle, TrainingError> {
        let mut active = self.inner.active.lock().await;
        if let Some(id) = *active {
            return Err(TrainingError::AlreadyRunning(id));
        }

        let job = TrainingJob::new(&self.inner.command);
        let id = job.id;
        self.inner.jobs.insert(id, job);

        let child = match Command::new("sh")
            .arg("-c")
            .arg(&self.inner.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                log::error!("Failed to launch training command {}: {}", self.inner.command, e);
                self.update(id, |job| {
                    job.status = JobStatus::Failed;
                    job.output = Some(e.to_string());
                    job.finished_at = Some(Utc::now());
                });
                self.prune_finished();
                return Err(TrainingError::Spawn(e));
            }
        };

        *active = Some(id);
        drop(active);

        self.update(id, |job| {
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
        });
        log::info!("Training job {} started: {}", id, self.inner.command);

        let (tx, rx) = watch::channel(JobStatus::Running);
        let jobs = self.clone();
        tokio::spawn(async move { jobs.supervise(id, child, tx).await });

        Ok(TrainingHandle {
            job: self.get(id)?,
            status: rx,
        })
    }

    /// Waits for the job behind `handle` to finish and returns its final record.
    pub async fn wait(&self, handle: TrainingHandle) -> Result<TrainingJob, TrainingError> {
        let id = handle.job.id;
        let mut status = handle.status;

        while !status.borrow().is_finished() {
            if status.changed().await.is_err() {
                break;
            }
        }

        self.get(id)
    }

    pub fn get(&self, id: Uuid) -> Result<TrainingJob, TrainingError> {
        self.inner
            .jobs
            .get(&id)
            .map(|job| job.value().clone())
            .ok_or(TrainingError::NotFound(id))
    }

    /// All known jobs, newest first.
    pub fn list(&self) -> Vec<TrainingJob> {
        let mut jobs: Vec<TrainingJob> = self.inner.jobs.iter().map(|j| j.value().clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    async fn supervise(&self, id: Uuid, mut child: Child, tx: watch::Sender<JobStatus>) {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, exit) =
            tokio::join!(read_tail(stdout), read_tail(stderr), child.wait());

        let (status, exit_code, output) = match exit {
            Ok(exit) => {
                let status = if exit.success() {
                    JobStatus::Succeeded
                } else {
                    JobStatus::Failed
                };
                (status, exit.code(), output_tail(&stdout, &stderr))
            }
            Err(e) => (JobStatus::Failed, None, Some(e.to_string())),
        };

        match status {
            JobStatus::Succeeded => log::info!("Training job {} succeeded", id),
            _ => log::error!("Training job {} failed with exit code {:?}", id, exit_code),
        }

        if status == JobStatus::Succeeded {
            if let Some(hook) = &self.inner.on_success {
                hook().await;
            }
        }

        self.update(id, |job| {
            job.status = status;
            job.exit_code = exit_code;
            job.output = output;
            job.finished_at = Some(Utc::now());
        });

        self.prune_finished();

        *self.inner.active.lock().await = None;
        tx.send_replace(status);
    }

    /// Drops the oldest finished records beyond the history limit.
    fn prune_finished(&self) {
        let mut finished: Vec<_> = self
            .inner
            .jobs
            .iter()
            .filter(|job| job.status.is_finished())
            .map(|job| (job.created_at, job.id))
            .collect();

        if finished.len() <= self.inner.max_finished {
            return;
        }

        finished.sort();
        let excess = finished.len() - self.inner.max_finished;
        for (_, id) in finished.into_iter().take(excess) {
            self.inner.jobs.remove(&id);
        }
    }

    fn update(&self, id: Uuid, apply: impl FnOnce(&mut TrainingJob)) {
        if let Some(mut job) = self.inner.jobs.get_mut(&id) {
            apply(&mut job);
        }
    }
}

/// Drains `pipe`, keeping only the last `OUTPUT_TAIL_BYTES` bytes.
async fn read_tail<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let Some(mut pipe) = pipe else {
        return Vec::new();
    };

    let mut tail: VecDeque<u8> = VecDeque::with_capacity(OUTPUT_TAIL_BYTES);
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                tail.extend(&chunk[..n]);
                let excess = tail.len().saturating_sub(OUTPUT_TAIL_BYTES);
                tail.drain(..excess);
            }
            Err(e) => {
                log::warn!("Failed to read training output: {}", e);
                break;
            }
        }
    }

    tail.into()
}

fn output_tail(stdout: &[u8], stderr: &[u8]) -> Option<String> {
    let source = if stderr.iter().any(|b| !b.is_ascii_whitespace()) {
        stderr
    } else {
        stdout
    };

    let text = String::from_utf8_lossy(source);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let start = text
        .char_indices()
        .rev()
        .nth(OUTPUT_TAIL_CHARS - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    Some(text[start..].to_string())
}
