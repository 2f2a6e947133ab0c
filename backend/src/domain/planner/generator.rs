//! Generative fallback for the planner: a locally served language model is
//! asked to continue a numbered task list, and the numbered lines are parsed
//! out of whatever it writes.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::rules::{truncate_words, MAX_TASKS, MAX_TASK_WORDS};
use crate::config::ModelConfig;

pub const TASKS_MARKER: &str = "Tasks:";

/// Words from an unrelated cooking prompt that the model tends to echo
const BLOCKED_KEYWORDS: &[&str] = &["recipe", "ingredient", "cook", "bake", "oven"];

static NUMBERED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\s*(.+)").expect("valid numbered line regex"));

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model directory not found at '{0}'. Download the model first.")]
    NotFound(PathBuf),
    #[error("Model request failed: {0}")]
    Request(String),
    #[error("Model server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected model response: {0}")]
    InvalidResponse(String),
}

/// Something that continues a text prompt.
///
/// Implementations return the prompt followed by the continuation, so the
/// task marker is always present in the returned text.
#[async_trait]
pub trait TaskGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

pub fn build_prompt(title: &str, description: &str) -> String {
    format!(
        "Goal: {}\nDescription: {}\n\n\
         Based on the goal above, generate a numbered list of 5 simple, actionable tasks to achieve it. \
         Each task should be short and clear.\n\n\
         {}\n1.",
        title.trim(),
        description.trim(),
        TASKS_MARKER
    )
}

/// Numbered items after the last task marker, minus blocked topics, each cut
/// to the word limit
pub fn parse_generated_tasks(text: &str) -> Vec<String> {
    let section = text.rsplit(TASKS_MARKER).next().unwrap_or(text);
    NUMBERED_LINE_RE
        .captures_iter(section)
        .map(|caps| caps[1].trim().to_string())
        .filter(|task| !task.is_empty())
        .filter(|task| {
            let lower = task.to_lowercase();
            !BLOCKED_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|task| truncate_words(&task, MAX_TASK_WORDS))
        .take(MAX_TASKS)
        .collect()
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generator backed by a local inference server; refuses to run when the
/// model has not been downloaded into the cache directory
pub struct LocalModelGenerator {
    client: reqwest::Client,
    model_name: String,
    model_path: PathBuf,
    endpoint: String,
}

impl LocalModelGenerator {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ModelError::Request(e.to_string()))?;
        Ok(Self {
            client,
            model_name: config.name.clone(),
            model_path: config.model_path(),
            endpoint: config.endpoint.clone(),
        })
    }

    fn ensure_cached(&self) -> Result<(), ModelError> {
        if !self.model_path.exists() {
            return Err(ModelError::NotFound(self.model_path.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskGenerator for LocalModelGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.ensure_cached()?;
        info!("Requesting task generation from model {}", self.model_name);

        let request = GenerateRequest {
            model: &self.model_name,
            prompt,
            stream: false,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
        debug!("Model produced {} characters", body.response.len());

        Ok(format!("{}{}", prompt, body.response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_ends_with_marker_and_first_number() {
        let prompt = build_prompt("Run a 10k", "in 6 weeks");
        assert!(prompt.starts_with("Goal: Run a 10k\nDescription: in 6 weeks"));
        assert!(prompt.ends_with("Tasks:\n1."));
    }

    #[test]
    fn test_parse_takes_text_after_last_marker() {
        let text = "Goal: x\n1. not a task\nTasks:\n1. old\nTasks:\n1. Buy running shoes\n2. Run 3 km twice a week\n";
        assert_eq!(
            parse_generated_tasks(text),
            vec!["Buy running shoes", "Run 3 km twice a week"]
        );
    }

    #[test]
    fn test_parse_drops_blocked_keywords() {
        let text = "Tasks:\n1. Find a healthy recipe\n2. Preheat the Oven\n3. Stretch for ten minutes\n4. Bake bread";
        assert_eq!(parse_generated_tasks(text), vec!["Stretch for ten minutes"]);
    }

    #[test]
    fn test_parse_truncates_and_caps() {
        let long = (1..=20).map(|i| format!("{}. step {} of a very long plan with many extra words", i, i));
        let text = format!("Tasks:\n{}", long.collect::<Vec<_>>().join("\n"));
        let tasks = parse_generated_tasks(&text);
        assert_eq!(tasks.len(), MAX_TASKS);
        assert!(tasks.iter().all(|t| t.split_whitespace().count() <= MAX_TASK_WORDS));
        assert!(tasks[0].ends_with("..."));
    }

    #[test]
    fn test_parse_without_numbers_is_empty() {
        assert!(parse_generated_tasks("Tasks:\njust some rambling text").is_empty());
    }

    #[tokio::test]
    async fn test_local_generator_requires_cached_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            cache_dir: dir.path().to_path_buf(),
            ..ModelConfig::default()
        };
        let generator = LocalModelGenerator::new(&config).unwrap();
        let err = generator.generate("Tasks:\n1.").await.unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }
}
