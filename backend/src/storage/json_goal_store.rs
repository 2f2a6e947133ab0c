//! # JSON Goal Store
//!
//! File-based goal storage for setups without a database. Everything lives
//! in one document:
//!
//! ```json
//! { "goals": [...], "progress": [...], "tasks": [...], "next_id": 42 }
//! ```
//!
//! Every operation is a read-modify-write of the whole file under a mutex.
//! The new document is written to `goals.json.tmp` and renamed over the old
//! one, so a crash leaves either the previous or the next state on disk and
//! a multi-record change (progress plus its log entry) lands in one write.
//! File access goes through `tokio::fs`, which keeps it off the runtime's
//! worker threads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use shared::{Goal, GoalProgress, GoalStatus, GoalTask};

use super::repositories::goal_repository::CHECKLIST_NOTE;
use super::traits::{
    ChecklistEdit, ChecklistToggle, GoalStorage, NewGoal, ProgressUpdate, ToggleOutcome,
};
use crate::domain::progress::{checklist_progress, is_complete};

#[derive(Debug, Serialize, Deserialize)]
struct GoalDocument {
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    progress: Vec<GoalProgress>,
    #[serde(default)]
    tasks: Vec<GoalTask>,
    #[serde(default = "first_id")]
    next_id: i64,
}

fn first_id() -> i64 {
    1
}

impl Default for GoalDocument {
    fn default() -> Self {
        Self {
            goals: Vec::new(),
            progress: Vec::new(),
            tasks: Vec::new(),
            next_id: first_id(),
        }
    }
}

impl GoalDocument {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn goal_mut(&mut self, goal_id: i64, user_id: i64) -> Option<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.user_id == user_id)
    }

    fn log_progress(&mut self, goal_id: i64, user_id: i64, progress: i64, notes: Option<String>, timestamp: &str) {
        let id = self.allocate_id();
        self.progress.push(GoalProgress {
            id,
            goal_id,
            user_id,
            progress_percentage: progress,
            notes,
            created_at: timestamp.to_string(),
        });
    }

    /// Set the goal's progress from its checklist ratio and log the change
    fn recompute_from_checklist(&mut self, goal_id: i64, user_id: i64, timestamp: &str) -> i64 {
        let (completed, total) = self
            .tasks
            .iter()
            .filter(|t| t.goal_id == goal_id)
            .fold((0, 0), |(done, all), t| (done + usize::from(t.is_completed), all + 1));
        let progress = checklist_progress(completed, total);
        if let Some(goal) = self.goal_mut(goal_id, user_id) {
            goal.progress_percentage = progress;
            goal.updated_at = timestamp.to_string();
            if is_complete(progress) {
                goal.status = GoalStatus::Completed;
            }
        }
        self.log_progress(goal_id, user_id, progress, Some(CHECKLIST_NOTE.to_string()), timestamp);
        progress
    }

    fn goal_tasks(&self, goal_id: i64) -> Vec<GoalTask> {
        let mut tasks: Vec<GoalTask> = self
            .tasks
            .iter()
            .filter(|t| t.goal_id == goal_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }
}

pub struct JsonGoalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonGoalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<GoalDocument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(GoalDocument::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", self.path.display()));
            }
        };
        let document = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(document)
    }

    async fn save(&self, document: &GoalDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!("Saved goal store to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl GoalStorage for JsonGoalStore {
    async fn create_goal(&self, goal: &NewGoal) -> Result<Goal> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let created = Goal {
            id: doc.allocate_id(),
            user_id: goal.user_id,
            title: goal.title.clone(),
            description: goal.description.clone(),
            goal_type: goal.goal_type,
            target_value: goal.target_value,
            current_value: 0.0,
            progress_percentage: 0,
            deadline: goal.deadline.clone(),
            status: GoalStatus::Active,
            priority: goal.priority,
            created_at: goal.created_at.clone(),
            updated_at: goal.created_at.clone(),
        };
        doc.goals.push(created.clone());
        self.save(&doc).await?;
        Ok(created)
    }

    async fn get_goal(&self, goal_id: i64, user_id: i64) -> Result<Option<Goal>> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(doc
            .goals
            .into_iter()
            .find(|g| g.id == goal_id && g.user_id == user_id))
    }

    async fn list_goals(&self, user_id: i64, status: Option<GoalStatus>) -> Result<Vec<Goal>> {
        let _guard = self.lock.lock().await;
        let mut goals: Vec<Goal> = self
            .load()
            .await?
            .goals
            .into_iter()
            .filter(|g| g.user_id == user_id)
            .filter(|g| status.map_or(true, |s| g.status == s))
            .collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(goals)
    }

    async fn save_goal(&self, goal: &Goal) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let Some(existing) = doc.goal_mut(goal.id, goal.user_id) else {
            return Ok(false);
        };
        let created_at = existing.created_at.clone();
        *existing = Goal {
            created_at,
            ..goal.clone()
        };
        self.save(&doc).await?;
        Ok(true)
    }

    async fn apply_progress(&self, update: &ProgressUpdate) -> Result<Option<Goal>> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let Some(goal) = doc.goal_mut(update.goal_id, update.user_id) else {
            return Ok(None);
        };
        goal.current_value = update.current_value;
        goal.progress_percentage = update.progress_percentage;
        goal.updated_at = update.timestamp.clone();
        if update.complete {
            goal.status = GoalStatus::Completed;
        }
        let updated = goal.clone();

        doc.log_progress(
            update.goal_id,
            update.user_id,
            update.progress_percentage,
            update.notes.clone(),
            &update.timestamp,
        );
        self.save(&doc).await?;
        Ok(Some(updated))
    }

    async fn delete_goal(&self, goal_id: i64, user_id: i64) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.goal_mut(goal_id, user_id).is_none() {
            return Ok(false);
        }
        doc.goals.retain(|g| g.id != goal_id);
        doc.progress.retain(|p| p.goal_id != goal_id);
        doc.tasks.retain(|t| t.goal_id != goal_id);
        self.save(&doc).await?;
        Ok(true)
    }

    async fn progress_history(&self, goal_id: i64, user_id: i64) -> Result<Vec<GoalProgress>> {
        let _guard = self.lock.lock().await;
        let mut history: Vec<GoalProgress> = self
            .load()
            .await?
            .progress
            .into_iter()
            .filter(|p| p.goal_id == goal_id && p.user_id == user_id)
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(history)
    }

    async fn count_open_goals(&self, user_id: Option<i64>) -> Result<i64> {
        let _guard = self.lock.lock().await;
        let count = self
            .load()
            .await?
            .goals
            .iter()
            .filter(|g| user_id.map_or(true, |id| g.user_id == id))
            .filter(|g| g.status.is_open())
            .count();
        Ok(count as i64)
    }

    async fn list_goal_tasks(&self, goal_id: i64) -> Result<Vec<GoalTask>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.goal_tasks(goal_id))
    }

    async fn add_goal_tasks(
        &self,
        edit: &ChecklistEdit,
        descriptions: &[String],
        replace: bool,
    ) -> Result<Option<Vec<GoalTask>>> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.goal_mut(edit.goal_id, edit.user_id).is_none() {
            return Ok(None);
        }
        if replace {
            doc.tasks.retain(|t| t.goal_id != edit.goal_id);
        }
        for description in descriptions {
            let id = doc.allocate_id();
            doc.tasks.push(GoalTask {
                id,
                goal_id: edit.goal_id,
                task_description: description.clone(),
                is_completed: false,
            });
        }
        if edit.recompute_progress {
            doc.recompute_from_checklist(edit.goal_id, edit.user_id, &edit.timestamp);
        }
        self.save(&doc).await?;
        Ok(Some(doc.goal_tasks(edit.goal_id)))
    }

    async fn toggle_goal_task(&self, toggle: &ChecklistToggle) -> Result<Option<ToggleOutcome>> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.goal_mut(toggle.goal_id, toggle.user_id).is_none() {
            return Ok(None);
        }
        let Some(task) = doc
            .tasks
            .iter_mut()
            .find(|t| t.id == toggle.task_id && t.goal_id == toggle.goal_id)
        else {
            return Ok(None);
        };
        task.is_completed = !task.is_completed;
        let task = task.clone();

        if toggle.recompute_progress {
            doc.recompute_from_checklist(toggle.goal_id, toggle.user_id, &toggle.timestamp);
        }

        let goal = doc.goal_mut(toggle.goal_id, toggle.user_id).map(|g| g.clone());
        self.save(&doc).await?;
        Ok(goal.map(|goal| ToggleOutcome { task, goal }))
    }

    async fn delete_goal_task(&self, edit: &ChecklistEdit, task_id: i64) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.goal_mut(edit.goal_id, edit.user_id).is_none() {
            return Ok(false);
        }
        let before = doc.tasks.len();
        doc.tasks.retain(|t| !(t.id == task_id && t.goal_id == edit.goal_id));
        if doc.tasks.len() == before {
            return Ok(false);
        }
        if edit.recompute_progress {
            doc.recompute_from_checklist(edit.goal_id, edit.user_id, &edit.timestamp);
        }
        self.save(&doc).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{GoalType, Priority};
    use std::sync::Arc;

    fn new_goal(title: &str) -> NewGoal {
        NewGoal {
            user_id: 1,
            title: title.to_string(),
            description: Some("steady".to_string()),
            goal_type: GoalType::Financial,
            target_value: Some(200.0),
            deadline: Some("2025-12-31".to_string()),
            priority: Priority::High,
            created_at: "2025-08-01T00:00:00+00:00".to_string(),
        }
    }

    fn edit(goal_id: i64, recompute_progress: bool) -> ChecklistEdit {
        ChecklistEdit {
            goal_id,
            user_id: 1,
            recompute_progress,
            timestamp: "2025-08-29T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_document_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goals.json");
        let store = JsonGoalStore::new(&path);
        let goal = store.create_goal(&new_goal("Save money")).await.unwrap();
        store
            .add_goal_tasks(&edit(goal.id, false), &["Open account".to_string()], false)
            .await
            .unwrap();

        let reopened = JsonGoalStore::new(&path);
        assert_eq!(reopened.get_goal(goal.id, 1).await.unwrap(), Some(goal.clone()));
        assert_eq!(reopened.list_goal_tasks(goal.id).await.unwrap().len(), 1);
        assert!(!dir.path().join("goals.json.tmp").exists());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["next_id"], 3);
        assert!(raw["progress"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_and_log_written_together() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals.json"));
        let goal = store.create_goal(&new_goal("Save money")).await.unwrap();

        let update = ProgressUpdate {
            goal_id: goal.id,
            user_id: 1,
            current_value: 200.0,
            progress_percentage: 100,
            complete: true,
            notes: None,
            timestamp: "2025-08-28T00:00:00+00:00".to_string(),
        };
        let done = store.apply_progress(&update).await.unwrap().unwrap();
        assert_eq!(done.status, GoalStatus::Completed);
        assert_eq!(store.progress_history(goal.id, 1).await.unwrap().len(), 1);

        let missing = ProgressUpdate { goal_id: 77, ..update };
        assert!(store.apply_progress(&missing).await.unwrap().is_none());
        assert_eq!(store.count_open_goals(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonGoalStore::new(dir.path().join("goals.json")));

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_goal(&new_goal(&format!("Goal {}", i))).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.list_goals(1, None).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_delete_goal_removes_children() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals.json"));
        let goal = store.create_goal(&new_goal("Read")).await.unwrap();
        let tasks = store
            .add_goal_tasks(&edit(goal.id, false), &["A".to_string(), "B".to_string()], false)
            .await
            .unwrap()
            .unwrap();
        let toggle = ChecklistToggle {
            goal_id: goal.id,
            user_id: 1,
            task_id: tasks[0].id,
            recompute_progress: true,
            timestamp: "2025-08-28T00:00:00+00:00".to_string(),
        };
        let outcome = store.toggle_goal_task(&toggle).await.unwrap().unwrap();
        assert_eq!(outcome.goal.progress_percentage, 50);

        assert!(store.delete_goal(goal.id, 1).await.unwrap());
        assert!(store.list_goal_tasks(goal.id).await.unwrap().is_empty());
        assert!(store.progress_history(goal.id, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checklist_edits_recompute_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonGoalStore::new(dir.path().join("goals.json"));
        let goal = store
            .create_goal(&NewGoal { target_value: None, ..new_goal("Read") })
            .await
            .unwrap();
        let tasks = store
            .add_goal_tasks(&edit(goal.id, true), &["A".to_string(), "B".to_string()], false)
            .await
            .unwrap()
            .unwrap();
        let toggle = ChecklistToggle {
            goal_id: goal.id,
            user_id: 1,
            task_id: tasks[0].id,
            recompute_progress: true,
            timestamp: "2025-08-28T00:00:00+00:00".to_string(),
        };
        store.toggle_goal_task(&toggle).await.unwrap();

        let more = vec!["C".to_string(), "D".to_string()];
        store.add_goal_tasks(&edit(goal.id, true), &more, false).await.unwrap();
        assert_eq!(store.get_goal(goal.id, 1).await.unwrap().unwrap().progress_percentage, 25);

        for task in store.list_goal_tasks(goal.id).await.unwrap().iter().skip(1) {
            assert!(store.delete_goal_task(&edit(goal.id, true), task.id).await.unwrap());
        }
        let done = store.get_goal(goal.id, 1).await.unwrap().unwrap();
        assert_eq!(done.progress_percentage, 100);
        assert_eq!(done.status, GoalStatus::Completed);
        assert_eq!(
            store.progress_history(goal.id, 1).await.unwrap()[0].notes.as_deref(),
            Some(CHECKLIST_NOTE)
        );

        assert!(store.add_goal_tasks(&edit(404, true), &more, false).await.unwrap().is_none());
        assert!(!store.delete_goal_task(&edit(404, true), tasks[0].id).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_file_is_empty_and_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("goals.json");
        let store = JsonGoalStore::new(&path);
        assert!(store.list_goals(1, None).await.unwrap().is_empty());

        store.create_goal(&new_goal("Save money")).await.unwrap();
        assert!(path.exists());

        tokio::fs::write(&path, b"{ not json").await.unwrap();
        let err = store.list_goals(1, None).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"), "{}", err);
    }
}
