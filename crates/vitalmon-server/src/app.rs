use crate::adapters::{StoreDeliveryLog, StorePreferences};
use crate::config::ServerConfig;
use crate::pipeline::AlertPipeline;
use crate::scheduler::EvaluationScheduler;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use vitalmon_alert::engine::EvaluationEngine;
use vitalmon_notify::outbox::{self, OutboxWorker};
use vitalmon_notify::router::NotificationRouter;
use vitalmon_notify::EmailTransport;
use vitalmon_storage::{HealthStore, SubmissionGate};

/// The wired components. The worker is returned separately so the caller
/// decides whether to spawn it or drain it by hand.
pub struct App {
    pub store: Arc<HealthStore>,
    pub pipeline: Arc<AlertPipeline>,
    pub scheduler: EvaluationScheduler,
    pub worker: OutboxWorker,
}

pub async fn build_app(config: &ServerConfig, transport: Arc<dyn EmailTransport>) -> Result<App> {
    let db_url = config.database.connection_url();
    let store = Arc::new(
        HealthStore::new(&db_url, Path::new(&config.database.data_dir))
            .await
            .with_context(|| format!("Failed to open database {db_url}"))?,
    );

    let (outbox, worker) = outbox::channel(
        config.notify.queue_capacity,
        NotificationRouter::new(transport),
        Arc::new(StorePreferences(store.clone())),
        Arc::new(StoreDeliveryLog(store.clone())),
    );

    let gate = SubmissionGate::new(store.clone(), config.evaluation.dedup_policy());
    let pipeline = Arc::new(AlertPipeline::new(
        store.clone(),
        EvaluationEngine::default(),
        gate,
        outbox,
        config.evaluation.full_pass_on_ingest,
    ));
    let scheduler = EvaluationScheduler::new(
        pipeline.clone(),
        config.evaluation.tick_secs,
        config.evaluation.active_subject_lookback(),
        config.evaluation.max_concurrent,
    );

    Ok(App {
        store,
        pipeline,
        scheduler,
        worker,
    })
}
