use std::{path::PathBuf, sync::Arc};

use futures::FutureExt;
use textsum_core::{
    config::handler::ConfigurationManager, pipeline::handler::PipelineSlot,
    training::handler::TrainingJobs,
};

#[derive(Clone)]
pub struct ServerState {
    pipeline: Arc<PipelineSlot>,
    training: TrainingJobs,
    templates_dir: PathBuf,
}

impl From<(Arc<PipelineSlot>, TrainingJobs, PathBuf)> for ServerState {
    fn from(states: (Arc<PipelineSlot>, TrainingJobs, PathBuf)) -> Self {
        let (pipeline, training, templates_dir) = states;
        Self {
            pipeline,
            training,
            templates_dir,
        }
    }
}

impl ServerState {
    pub fn pipeline(&self) -> &PipelineSlot {
        &self.pipeline
    }

    pub fn training(&self) -> &TrainingJobs {
        &self.training
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.templates_dir.clone()
    }
}

/// Loads the model once up front and wires training success to a pipeline reload.
pub async fn build_state(manager: ConfigurationManager) -> Arc<ServerState> {
    let server_config = manager.get_server_config();
    let training_config = manager.get_training_config();

    let pipeline = Arc::new(PipelineSlot::from_configuration(manager));

    match pipeline.get().await {
        Ok(_) => log::info!("Summarization pipeline ready"),
        Err(e) => log::warn!(
            "Summarization pipeline not loaded at startup, will retry on first request: {}",
            e
        ),
    }

    let training = training_jobs(training_config.command, pipeline.clone());

    Arc::new(ServerState::from((
        pipeline,
        training,
        PathBuf::from(server_config.templates_dir),
    )))
}

/// Training registry whose successful runs drop the cached pipeline.
pub fn training_jobs(command: String, slot: Arc<PipelineSlot>) -> TrainingJobs {
    TrainingJobs::with_success_hook(
        command,
        Arc::new(move || {
            let slot = slot.clone();
            async move { slot.invalidate().await }.boxed()
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use textsum_core::{
        error::PipelineResult, pipeline::handler::Summarize, training::dto::JobStatus,
    };

    struct Fixed;

    impl Summarize for Fixed {
        fn summarize(&self, _text: &str) -> PipelineResult<String> {
            Ok("fixed".to_string())
        }
    }

    fn counting_slot(loads: Arc<AtomicUsize>) -> Arc<PipelineSlot> {
        Arc::new(PipelineSlot::new(Arc::new(
            move || -> PipelineResult<Arc<dyn Summarize>> {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Fixed) as Arc<dyn Summarize>)
            },
        )))
    }

    #[tokio::test]
    async fn test_successful_training_reloads_pipeline() {
        let loads = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(loads.clone());
        slot.get().await.unwrap();
        assert!(slot.is_loaded());

        let training = training_jobs("true".to_string(), slot.clone());
        let job = training.wait(training.start().await.unwrap()).await.unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert!(!slot.is_loaded());

        slot.get().await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_training_keeps_pipeline() {
        let loads = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(loads.clone());
        slot.get().await.unwrap();

        let training = training_jobs("exit 1".to_string(), slot.clone());
        let job = training.wait(training.start().await.unwrap()).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(slot.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
