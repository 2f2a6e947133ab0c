//! # Goal Task Planner
//!
//! Turns a goal's title and description into a short list of actionable
//! tasks. The deterministic rule-based planner answers first; a locally
//! served language model is consulted only when asked for explicitly or when
//! the rules produce nothing.
//!
//! Generation failures never surface as errors. They come back as an empty
//! plan with a status message the caller can show.

pub mod generator;
pub mod job;
pub mod rules;

use std::sync::Arc;

use shared::PlanSource;
use tracing::{info, warn};

pub use generator::{build_prompt, parse_generated_tasks, LocalModelGenerator, ModelError, TaskGenerator};
pub use job::{PlannerEvent, PlannerJob};
pub use rules::{infer_duration_weeks, plan_tasks, truncate_words};

/// Result of a planning request
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub tasks: Vec<String>,
    pub source: PlanSource,
    pub status: String,
}

#[derive(Clone, Default)]
pub struct PlannerService {
    generator: Option<Arc<dyn TaskGenerator>>,
}

impl PlannerService {
    pub fn new(generator: Option<Arc<dyn TaskGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn plan(&self, title: &str, description: &str, source: PlanSource) -> PlanOutcome {
        info!("Planning tasks for '{}' using {}", title, source);

        if source == PlanSource::Rules {
            let tasks = plan_tasks(title, description);
            if !tasks.is_empty() {
                return PlanOutcome {
                    status: format!("Generated {} tasks", tasks.len()),
                    tasks,
                    source: PlanSource::Rules,
                };
            }
            if self.generator.is_none() {
                return PlanOutcome {
                    tasks: Vec::new(),
                    source: PlanSource::Rules,
                    status: "No tasks could be planned for this goal".to_string(),
                };
            }
            info!("Rule-based planner produced nothing, trying the model");
        }

        self.generate(title, description).await
    }

    async fn generate(&self, title: &str, description: &str) -> PlanOutcome {
        let Some(generator) = self.generator.clone() else {
            warn!("Generative planning requested but no model is configured");
            return PlanOutcome {
                tasks: Vec::new(),
                source: PlanSource::Generative,
                status: "Task generation is not available".to_string(),
            };
        };

        let job = PlannerJob::spawn(generator, title.to_string(), description.to_string());
        match job.wait().await {
            PlannerEvent::Finished(tasks) if tasks.is_empty() => PlanOutcome {
                tasks,
                source: PlanSource::Generative,
                status: "Generation finished, but no tasks were found".to_string(),
            },
            PlannerEvent::Finished(tasks) => PlanOutcome {
                status: format!("Successfully generated {} tasks", tasks.len()),
                tasks,
                source: PlanSource::Generative,
            },
            PlannerEvent::Failed(message) | PlannerEvent::Status(message) => PlanOutcome {
                tasks: Vec::new(),
                source: PlanSource::Generative,
                status: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoGenerator;

    #[async_trait]
    impl TaskGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            Ok(format!("{} Warm up\n2. Bake a cake\n3. Cool down", prompt))
        }
    }

    struct MissingModel;

    #[async_trait]
    impl TaskGenerator for MissingModel {
        async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
            Err(ModelError::NotFound("./model_cache/distilgpt2".into()))
        }
    }

    #[tokio::test]
    async fn test_rules_answer_first() {
        let service = PlannerService::new(Some(Arc::new(EchoGenerator)));
        let outcome = service.plan("Learn Excel", "in 2 weeks", PlanSource::Rules).await;
        assert_eq!(outcome.source, PlanSource::Rules);
        assert_eq!(outcome.tasks.len(), 8);
        assert!(outcome.tasks[1].starts_with("Week 2: "));
    }

    #[tokio::test]
    async fn test_blank_goal_falls_back_to_generator() {
        let service = PlannerService::new(Some(Arc::new(EchoGenerator)));
        let outcome = service.plan("", "", PlanSource::Rules).await;
        assert_eq!(outcome.source, PlanSource::Generative);
        assert_eq!(outcome.tasks, vec!["Warm up", "Cool down"]);
    }

    #[tokio::test]
    async fn test_blank_goal_without_generator_is_empty() {
        let outcome = PlannerService::default().plan(" ", "", PlanSource::Rules).await;
        assert!(outcome.tasks.is_empty());
        assert_eq!(outcome.source, PlanSource::Rules);
    }

    #[tokio::test]
    async fn test_generator_failure_becomes_status() {
        let service = PlannerService::new(Some(Arc::new(MissingModel)));
        let outcome = service.plan("Get fit", "", PlanSource::Generative).await;
        assert!(outcome.tasks.is_empty());
        assert!(outcome.status.contains("Model directory not found"));
    }
}
