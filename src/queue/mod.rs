//! # Print Job Queue
//!
//! Bounded FIFO of [`PrintJob`]s in front of a single slow printer.
//!
//! ## Policy
//!
//! - A full queue rejects the incoming job with
//!   [`TermicaError::QueueFull`] and counts it as dropped. Jobs already
//!   accepted are never evicted.
//! - One job runs at a time. A job is popped, executed to completion and
//!   discarded; failed jobs are not retried.
//! - Jobs are spaced by an inter-job delay measured from the end of the
//!   previous job.
//!
//! The queue only holds state. [`crate::printer::ThermalPrinter`] decides
//! when to run the next job and executes it.

pub mod job;

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::TermicaError;
pub use job::{JobKind, PrintJob};

pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_INTER_JOB_DELAY: Duration = Duration::from_millis(2000);

/// Processing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QueueStats {
    pub processed: u32,
    pub dropped: u32,
    pub total_processing_ms: u64,
}

impl QueueStats {
    /// Mean job duration in milliseconds, 0 before the first job.
    pub fn average_job_ms(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.total_processing_ms as f64 / f64::from(self.processed)
        }
    }
}

pub struct JobQueue {
    jobs: VecDeque<PrintJob>,
    capacity: usize,
    inter_job_delay: Duration,
    busy: bool,
    last_finished: Option<Duration>,
    stats: QueueStats,
}

impl JobQueue {
    pub fn new(capacity: usize, inter_job_delay: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            jobs: VecDeque::with_capacity(capacity),
            capacity,
            inter_job_delay,
            busy: false,
            last_finished: None,
            stats: QueueStats::default(),
        }
    }

    /// Append a job. Never blocks.
    ///
    /// Returns the new queue length, or `QueueFull` when at capacity.
    pub fn enqueue(&mut self, job: PrintJob) -> Result<usize, TermicaError> {
        if self.jobs.len() >= self.capacity {
            self.stats.dropped += 1;
            warn!(
                capacity = self.capacity,
                kind = job.kind.name(),
                dropped = self.stats.dropped,
                "print queue full, rejecting job"
            );
            return Err(TermicaError::QueueFull {
                capacity: self.capacity,
            });
        }
        info!(
            id = %job.id,
            kind = job.kind.name(),
            priority = job.priority,
            queued = self.jobs.len() + 1,
            "print job queued"
        );
        self.jobs.push_back(job);
        Ok(self.jobs.len())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &PrintJob> {
        self.jobs.iter()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.jobs.iter().any(|j| j.id == id)
    }

    /// Drop every pending job. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.jobs.len();
        self.jobs.clear();
        info!(removed, "print queue cleared");
        removed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity (minimum 1). Shrinking below the current length
    /// drops the newest jobs, counted as dropped.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.jobs.len() > self.capacity {
            if let Some(job) = self.jobs.pop_back() {
                self.stats.dropped += 1;
                warn!(id = %job.id, kind = job.kind.name(), "job dropped by capacity change");
            }
        }
        info!(capacity = self.capacity, "queue capacity set");
    }

    pub fn inter_job_delay(&self) -> Duration {
        self.inter_job_delay
    }

    pub fn set_inter_job_delay(&mut self, delay: Duration) {
        self.inter_job_delay = delay;
        info!(delay_ms = delay.as_millis() as u64, "inter-job delay set");
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the inter-job delay has passed at `now`. True before the
    /// first job.
    pub fn delay_elapsed(&self, now: Duration) -> bool {
        match self.last_finished {
            Some(last) => now.saturating_sub(last) >= self.inter_job_delay,
            None => true,
        }
    }

    /// Pop the front job and mark the queue busy.
    pub fn start(&mut self) -> Option<PrintJob> {
        let job = self.jobs.pop_front()?;
        self.busy = true;
        Some(job)
    }

    /// Mark the running job done.
    pub fn finish(&mut self, now: Duration, elapsed: Duration) {
        self.busy = false;
        self.last_finished = Some(now);
        self.stats.processed += 1;
        self.stats.total_processing_ms += elapsed.as_millis() as u64;
    }

    /// Take the busy flag for work outside the queue.
    pub fn begin_exclusive(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Release the busy flag after out-of-queue work, restarting the
    /// inter-job delay.
    pub fn end_exclusive(&mut self, now: Duration) {
        self.busy = false;
        self.last_finished = Some(now);
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_INTER_JOB_DELAY)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_job() -> PrintJob {
        PrintJob::new(JobKind::Feed { lines: 1 }, 0)
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = JobQueue::default();
        let first = feed_job();
        let first_id = first.id;
        queue.enqueue(first).unwrap();
        queue.enqueue(PrintJob::new(JobKind::Separator, 0)).unwrap();

        let job = queue.start().unwrap();
        assert_eq!(job.id, first_id);
        assert!(queue.is_busy());
        queue.finish(Duration::from_secs(1), Duration::from_millis(40));
        assert!(!queue.is_busy());
        assert_eq!(queue.start().unwrap().kind, JobKind::Separator);
    }

    #[test]
    fn test_full_queue_rejects_new_jobs() {
        let mut queue = JobQueue::new(2, Duration::ZERO);
        let kept = feed_job();
        let kept_id = kept.id;
        queue.enqueue(kept).unwrap();
        assert_eq!(queue.enqueue(feed_job()).unwrap(), 2);

        let err = queue.enqueue(feed_job()).unwrap_err();
        assert!(matches!(err, TermicaError::QueueFull { capacity: 2 }));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.stats().dropped, 1);
        assert!(queue.contains(kept_id));
    }

    #[test]
    fn test_delay_gate() {
        let mut queue = JobQueue::new(4, Duration::from_millis(2000));
        assert!(queue.delay_elapsed(Duration::ZERO));

        queue.enqueue(feed_job()).unwrap();
        queue.start().unwrap();
        queue.finish(Duration::from_millis(5000), Duration::from_millis(100));
        assert!(!queue.delay_elapsed(Duration::from_millis(6999)));
        assert!(queue.delay_elapsed(Duration::from_millis(7000)));
    }

    #[test]
    fn test_average_job_time() {
        let mut queue = JobQueue::default();
        assert_eq!(queue.stats().average_job_ms(), 0.0);
        for ms in [100, 300] {
            queue.enqueue(feed_job()).unwrap();
            queue.start().unwrap();
            queue.finish(Duration::ZERO, Duration::from_millis(ms));
        }
        assert_eq!(queue.stats().processed, 2);
        assert_eq!(queue.stats().average_job_ms(), 200.0);
    }

    #[test]
    fn test_shrinking_capacity_drops_newest() {
        let mut queue = JobQueue::new(5, Duration::ZERO);
        let oldest = feed_job();
        let oldest_id = oldest.id;
        queue.enqueue(oldest).unwrap();
        for _ in 0..3 {
            queue.enqueue(feed_job()).unwrap();
        }
        queue.set_capacity(2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.stats().dropped, 2);
        assert!(queue.contains(oldest_id));

        queue.set_capacity(0);
        assert_eq!(queue.capacity(), 1);
    }

    #[test]
    fn test_exclusive_section() {
        let mut queue = JobQueue::default();
        assert!(queue.begin_exclusive());
        assert!(!queue.begin_exclusive());
        queue.end_exclusive(Duration::from_secs(3));
        assert!(!queue.is_busy());
        assert!(!queue.delay_elapsed(Duration::from_secs(4)));
    }

    #[test]
    fn test_clear() {
        let mut queue = JobQueue::default();
        queue.enqueue(feed_job()).unwrap();
        queue.enqueue(feed_job()).unwrap();
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }
}
