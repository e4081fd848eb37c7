use crate::pipeline::AlertPipeline;
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{interval, Duration};

/// Totals for one scheduler cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub subjects: usize,
    pub persisted: usize,
    pub failed: usize,
}

/// Periodically runs a full evaluation pass for every recently active
/// subject.
pub struct EvaluationScheduler {
    pipeline: Arc<AlertPipeline>,
    tick_secs: u64,
    active_lookback: ChronoDuration,
    max_concurrent: usize,
}

impl EvaluationScheduler {
    pub fn new(
        pipeline: Arc<AlertPipeline>,
        tick_secs: u64,
        active_lookback: ChronoDuration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            pipeline,
            tick_secs: tick_secs.max(1),
            active_lookback,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            tick_secs = self.tick_secs,
            max_concurrent = self.max_concurrent,
            "Evaluation scheduler started"
        );

        let mut tick = interval(Duration::from_secs(self.tick_secs));
        loop {
            tick.tick().await;
            if let Err(e) = self.run_cycle(Utc::now()).await {
                tracing::error!(error = %e, "Evaluation cycle failed");
            }
        }
    }

    /// Evaluates every subject with readings inside the lookback. A failing
    /// subject is logged and counted; the others still run.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        let subjects = self
            .pipeline
            .store()
            .active_subjects_since(now - self.active_lookback)
            .await?;

        let mut summary = CycleSummary {
            subjects: subjects.len(),
            ..Default::default()
        };
        if subjects.is_empty() {
            return Ok(summary);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(subjects.len());

        for subject_id in subjects {
            let permit = semaphore.clone().acquire_owned().await?;
            let pipeline = self.pipeline.clone();

            handles.push(tokio::spawn(async move {
                let result = pipeline.evaluate_subject(&subject_id, now).await;
                if let Err(ref e) = result {
                    tracing::error!(subject_id = %subject_id, error = %e, "Subject evaluation failed");
                }
                drop(permit);
                result
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(report)) => summary.persisted += report.persisted,
                Ok(Err(_)) => summary.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Subject evaluation task panicked");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            subjects = summary.subjects,
            persisted = summary.persisted,
            failed = summary.failed,
            "Evaluation cycle finished"
        );
        Ok(summary)
    }
}
