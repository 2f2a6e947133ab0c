use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::generator::{build_prompt, parse_generated_tasks, TaskGenerator};

/// Progress of a background generation run
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerEvent {
    Status(String),
    Finished(Vec<String>),
    Failed(String),
}

/// Runs the generative path on its own task and reports through a channel.
/// The receiver is the only link back to the caller.
pub struct PlannerJob {
    pub events: mpsc::Receiver<PlannerEvent>,
    pub handle: JoinHandle<()>,
}

impl PlannerJob {
    pub fn spawn(generator: Arc<dyn TaskGenerator>, title: String, description: String) -> Self {
        let (tx, rx) = mpsc::channel(8);

        let handle = tokio::spawn(async move {
            // A closed receiver only means nobody is listening any more
            let _ = tx
                .send(PlannerEvent::Status("Generating tasks...".to_string()))
                .await;

            let prompt = build_prompt(&title, &description);
            let event = match generator.generate(&prompt).await {
                Ok(text) => {
                    let tasks = parse_generated_tasks(&text);
                    info!("Generated {} tasks for '{}'", tasks.len(), title);
                    PlannerEvent::Finished(tasks)
                }
                Err(e) => {
                    warn!("Task generation failed: {}", e);
                    PlannerEvent::Failed(e.to_string())
                }
            };
            let _ = tx.send(event).await;
        });

        Self { events: rx, handle }
    }

    /// Drain events until the run finishes or fails
    pub async fn wait(mut self) -> PlannerEvent {
        while let Some(event) = self.events.recv().await {
            match event {
                PlannerEvent::Status(message) => info!("Planner status: {}", message),
                done => return done,
            }
        }
        PlannerEvent::Failed("Task generation stopped unexpectedly".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::planner::generator::ModelError;
    use async_trait::async_trait;

    struct CannedGenerator(Result<&'static str, ()>);

    #[async_trait]
    impl TaskGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            match self.0 {
                Ok(continuation) => Ok(format!("{}{}", prompt, continuation)),
                Err(()) => Err(ModelError::Request("connection refused".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_job_posts_status_then_finished() {
        let generator = Arc::new(CannedGenerator(Ok(" Stretch daily\n2. Run 5 km")));
        let mut job = PlannerJob::spawn(generator, "Get fit".to_string(), String::new());

        assert_eq!(
            job.events.recv().await,
            Some(PlannerEvent::Status("Generating tasks...".to_string()))
        );
        assert_eq!(
            job.events.recv().await,
            Some(PlannerEvent::Finished(vec![
                "Stretch daily".to_string(),
                "Run 5 km".to_string()
            ]))
        );
        assert_eq!(job.events.recv().await, None);
    }

    #[tokio::test]
    async fn test_job_reports_failure() {
        let generator = Arc::new(CannedGenerator(Err(())));
        let job = PlannerJob::spawn(generator, "Get fit".to_string(), String::new());
        match job.wait().await {
            PlannerEvent::Failed(message) => assert!(message.contains("connection refused")),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
