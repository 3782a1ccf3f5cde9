use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;
use verdict_models::AnalysisRecord;

use crate::orchestrator::AnalysisOrchestrator;

/// Point-in-time view of a batch run's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProgress {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
}

impl BatchProgress {
    pub fn failed(&self) -> usize {
        self.processed - self.succeeded
    }
}

#[derive(Default)]
struct Counters {
    total: AtomicUsize,
    processed: AtomicUsize,
    succeeded: AtomicUsize,
}

impl Counters {
    fn reset(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.processed.store(0, Ordering::SeqCst);
        self.succeeded.store(0, Ordering::SeqCst);
    }

    fn record(&self, record: &AnalysisRecord) -> usize {
        if record.success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        }
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Runs the orchestrator over many subjects with bounded concurrency.
pub struct BatchExecutor {
    orchestrator: Arc<AnalysisOrchestrator>,
    max_in_flight: usize,
    counters: Counters,
}

impl BatchExecutor {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>, max_in_flight: usize) -> Self {
        Self {
            orchestrator,
            max_in_flight: max_in_flight.max(1),
            counters: Counters::default(),
        }
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            total: self.counters.total.load(Ordering::Relaxed),
            processed: self.counters.processed.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
        }
    }

    /// One record per subject, in input order.
    pub async fn run_batch(&self, subjects: &[String]) -> Vec<AnalysisRecord> {
        self.run_batch_with(subjects, |_| {}).await
    }

    /// Like [`run_batch`](Self::run_batch), calling `on_record` once per record
    /// as it is collected, in input order.
    pub async fn run_batch_with<F>(&self, subjects: &[String], on_record: F) -> Vec<AnalysisRecord>
    where
        F: Fn(&AnalysisRecord),
    {
        if subjects.is_empty() {
            return Vec::new();
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("batch", run_id = %run_id, subjects = subjects.len());
        self.run_inner(subjects, on_record)
            .instrument(span)
            .await
    }

    async fn run_inner<F>(&self, subjects: &[String], on_record: F) -> Vec<AnalysisRecord>
    where
        F: Fn(&AnalysisRecord),
    {
        let start = Instant::now();
        let total = subjects.len();
        self.counters.reset(total);
        info!(max_in_flight = self.max_in_flight, "Starting batch");

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut handles = Vec::with_capacity(total);

        for subject in subjects {
            let orchestrator = Arc::clone(&self.orchestrator);
            let semaphore = Arc::clone(&semaphore);
            let task_subject = subject.clone();

            let handle = tokio::spawn(
                async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    orchestrator.run(&task_subject).await
                }
                .in_current_span(),
            );
            handles.push((subject, handle));
        }

        // Join in input order so records line up with subjects. Counting and
        // the callback happen here only, once per record.
        let mut records = Vec::with_capacity(total);
        for (subject, handle) in handles {
            let record = match handle.await {
                Ok(record) => record,
                Err(e) => {
                    error!(subject = %subject, error = %e, "Analysis task panicked");
                    AnalysisRecord::failed(
                        &subject.trim().to_uppercase(),
                        Utc::now(),
                        0,
                        format!("analysis task aborted: {e}"),
                    )
                }
            };

            let done = self.counters.record(&record);
            if record.success {
                info!("[{done}/{total}] {} => {}", record.subject, record.verdict.rating);
            } else {
                warn!(
                    "[{done}/{total}] {} failed: {}",
                    record.subject,
                    record.error_message.as_deref().unwrap_or("unknown error")
                );
            }
            on_record(&record);
            records.push(record);
        }

        let progress = self.progress();
        info!(
            processed = progress.processed,
            succeeded = progress.succeeded,
            failed = progress.failed(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch complete"
        );
        records
    }
}
