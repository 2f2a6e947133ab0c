//! Goal service domain logic.
//!
//! Goals are measured one of two ways. A goal with a positive target value
//! is measured by `current / target`, and that ratio is authoritative. A goal
//! without one is measured by its checklist: adding, toggling, deleting or
//! replacing items recomputes progress from the share of completed items.
//!
//! ## Business Rules
//!
//! - Progress is an integer percentage clamped to `[0, 100]`
//! - Reaching 100 completes the goal in the same write that records it
//! - Completed and Achieved goals no longer accept progress updates
//! - Every progress change is appended to the goal's progress log
//! - Deleting a goal removes its log and checklist

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use shared::{
    CreateGoalRequest, GenerateGoalTasksRequest, Goal, GoalProgress, GoalResponse, GoalStats,
    GoalStatus, GoalTask, GoalTasksResponse, UpdateGoalRequest,
};

use super::errors::{DomainError, DomainResult};
use super::planner::PlannerService;
use super::progress::{calculate_progress, checklist_progress, has_measurable_target, is_complete};
use super::validation::{optional, optional_date, required};
use crate::storage::{
    ChecklistEdit, ChecklistToggle, GoalStorage, NewGoal, ProgressUpdate, ToggleOutcome,
};

fn goal_not_found(goal_id: i64) -> DomainError {
    DomainError::not_found(format!("Goal {} not found", goal_id))
}

fn validate_target(target_value: Option<f64>) -> DomainResult<Option<f64>> {
    match target_value {
        Some(t) if !t.is_finite() || t <= 0.0 => {
            Err(DomainError::validation("Target value must be greater than 0"))
        }
        other => Ok(other),
    }
}

/// Open goals without a positive target follow their checklist
fn follows_checklist(goal: &Goal) -> bool {
    !has_measurable_target(goal.target_value) && !goal.status.is_terminal()
}

fn checklist_edit(goal: &Goal) -> ChecklistEdit {
    ChecklistEdit {
        goal_id: goal.id,
        user_id: goal.user_id,
        recompute_progress: follows_checklist(goal),
        timestamp: Utc::now().to_rfc3339(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Totals over a user's goals
pub fn summarize_goals(goals: &[Goal]) -> GoalStats {
    let total_goals = goals.len() as i64;
    let completed_goals = goals.iter().filter(|g| g.status.is_terminal()).count() as i64;
    let open: Vec<&Goal> = goals.iter().filter(|g| g.status.is_open()).collect();
    let average_progress = if open.is_empty() {
        0.0
    } else {
        let sum: i64 = open.iter().map(|g| g.progress_percentage).sum();
        round2(sum as f64 / open.len() as f64)
    };
    GoalStats {
        total_goals,
        completed_goals,
        active_goals: open.len() as i64,
        completion_rate: if total_goals > 0 {
            round2(completed_goals as f64 / total_goals as f64 * 100.0)
        } else {
            0.0
        },
        average_progress,
    }
}

#[derive(Clone)]
pub struct GoalService {
    goals: Arc<dyn GoalStorage>,
    planner: PlannerService,
}

impl GoalService {
    pub fn new(goals: Arc<dyn GoalStorage>, planner: PlannerService) -> Self {
        Self { goals, planner }
    }

    async fn require_goal(&self, goal_id: i64, user_id: i64) -> DomainResult<Goal> {
        self.goals
            .get_goal(goal_id, user_id)
            .await?
            .ok_or_else(|| goal_not_found(goal_id))
    }

    pub async fn create_goal(&self, user_id: i64, request: CreateGoalRequest) -> DomainResult<GoalResponse> {
        info!("Creating goal for user {}: {:?}", user_id, request);

        let new_goal = NewGoal {
            user_id,
            title: required(&request.title, "Title")?,
            description: optional(request.description.as_deref()),
            goal_type: request.goal_type,
            target_value: validate_target(request.target_value)?,
            deadline: optional_date(request.deadline.as_deref(), "Deadline")?,
            priority: request.priority,
            created_at: Utc::now().to_rfc3339(),
        };
        let goal = self.goals.create_goal(&new_goal).await?;

        info!("Created goal {}", goal.id);
        Ok(GoalResponse {
            goal,
            success_message: "Goal created successfully".to_string(),
        })
    }

    pub async fn update_goal(
        &self,
        goal_id: i64,
        user_id: i64,
        request: UpdateGoalRequest,
    ) -> DomainResult<GoalResponse> {
        info!("Updating goal {}: {:?}", goal_id, request);
        let mut goal = self.require_goal(goal_id, user_id).await?;

        if let Some(title) = request.title {
            goal.title = required(&title, "Title")?;
        }
        if let Some(description) = request.description {
            goal.description = optional(Some(description.as_str()));
        }
        if let Some(goal_type) = request.goal_type {
            goal.goal_type = goal_type;
        }
        if let Some(deadline) = request.deadline {
            goal.deadline = optional_date(Some(deadline.as_str()), "Deadline")?;
        }
        if let Some(priority) = request.priority {
            goal.priority = priority;
        }
        if let Some(status) = request.status {
            goal.status = status;
        }
        if request.target_value.is_some() {
            let target = validate_target(request.target_value)?;
            if target != goal.target_value {
                goal.target_value = target;
                goal.progress_percentage = calculate_progress(target, goal.current_value);
                if is_complete(goal.progress_percentage) {
                    goal.status = GoalStatus::Completed;
                }
            }
        }
        goal.updated_at = Utc::now().to_rfc3339();

        if !self.goals.save_goal(&goal).await? {
            return Err(goal_not_found(goal_id));
        }
        Ok(GoalResponse {
            goal,
            success_message: "Goal updated successfully".to_string(),
        })
    }

    pub async fn get_goal(&self, goal_id: i64, user_id: i64) -> DomainResult<Goal> {
        self.require_goal(goal_id, user_id).await
    }

    pub async fn list_goals(&self, user_id: i64, status: Option<GoalStatus>) -> DomainResult<Vec<Goal>> {
        Ok(self.goals.list_goals(user_id, status).await?)
    }

    /// Record a new current value. The goal row, the log entry and any
    /// completion are written together or not at all.
    pub async fn update_progress(
        &self,
        goal_id: i64,
        user_id: i64,
        current_value: f64,
        notes: Option<String>,
    ) -> DomainResult<GoalResponse> {
        info!("Updating progress of goal {} to {}", goal_id, current_value);
        let goal = self.require_goal(goal_id, user_id).await?;

        if goal.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "Goal is already {} and cannot be updated",
                goal.status
            )));
        }
        if !current_value.is_finite() || current_value < 0.0 {
            return Err(DomainError::validation("Current value must be a non-negative number"));
        }

        let progress = if has_measurable_target(goal.target_value) {
            calculate_progress(goal.target_value, current_value)
        } else {
            let tasks = self.goals.list_goal_tasks(goal_id).await?;
            let done = tasks.iter().filter(|t| t.is_completed).count();
            checklist_progress(done, tasks.len())
        };
        let complete = is_complete(progress);

        let update = ProgressUpdate {
            goal_id,
            user_id,
            current_value,
            progress_percentage: progress,
            complete,
            notes: optional(notes.as_deref()),
            timestamp: Utc::now().to_rfc3339(),
        };
        let goal = self
            .goals
            .apply_progress(&update)
            .await?
            .ok_or_else(|| goal_not_found(goal_id))?;

        let success_message = if complete {
            info!("Goal {} completed", goal_id);
            "Goal completed! Congratulations!".to_string()
        } else {
            format!("Progress updated to {}%", progress)
        };
        Ok(GoalResponse { goal, success_message })
    }

    pub async fn complete_goal(&self, goal_id: i64, user_id: i64) -> DomainResult<GoalResponse> {
        let mut goal = self.require_goal(goal_id, user_id).await?;
        goal.status = GoalStatus::Completed;
        goal.updated_at = Utc::now().to_rfc3339();
        if !self.goals.save_goal(&goal).await? {
            return Err(goal_not_found(goal_id));
        }
        info!("Marked goal {} as completed", goal_id);
        Ok(GoalResponse {
            goal,
            success_message: "Goal marked as completed".to_string(),
        })
    }

    pub async fn delete_goal(&self, goal_id: i64, user_id: i64) -> DomainResult<()> {
        if !self.goals.delete_goal(goal_id, user_id).await? {
            return Err(goal_not_found(goal_id));
        }
        info!("Deleted goal {}", goal_id);
        Ok(())
    }

    pub async fn goal_stats(&self, user_id: i64) -> DomainResult<GoalStats> {
        let goals = self.goals.list_goals(user_id, None).await?;
        Ok(summarize_goals(&goals))
    }

    pub async fn progress_history(&self, goal_id: i64, user_id: i64) -> DomainResult<Vec<GoalProgress>> {
        self.require_goal(goal_id, user_id).await?;
        Ok(self.goals.progress_history(goal_id, user_id).await?)
    }

    pub async fn count_open_goals(&self, user_id: Option<i64>) -> DomainResult<i64> {
        Ok(self.goals.count_open_goals(user_id).await?)
    }

    pub async fn list_goal_tasks(&self, goal_id: i64, user_id: i64) -> DomainResult<Vec<GoalTask>> {
        self.require_goal(goal_id, user_id).await?;
        Ok(self.goals.list_goal_tasks(goal_id).await?)
    }

    pub async fn add_goal_task(&self, goal_id: i64, user_id: i64, description: &str) -> DomainResult<GoalTask> {
        let description = required(description, "Task description")?;
        let goal = self.require_goal(goal_id, user_id).await?;
        let tasks = self
            .goals
            .add_goal_tasks(&checklist_edit(&goal), &[description], false)
            .await?
            .ok_or_else(|| goal_not_found(goal_id))?;
        let task = tasks
            .into_iter()
            .max_by_key(|t| t.id)
            .ok_or_else(|| DomainError::Storage(anyhow::anyhow!("Checklist item was not stored")))?;
        info!("Added checklist item {} to goal {}", task.id, goal_id);
        Ok(task)
    }

    pub async fn toggle_goal_task(&self, goal_id: i64, user_id: i64, task_id: i64) -> DomainResult<ToggleOutcome> {
        let goal = self.require_goal(goal_id, user_id).await?;
        let toggle = ChecklistToggle {
            goal_id,
            user_id,
            task_id,
            recompute_progress: follows_checklist(&goal),
            timestamp: Utc::now().to_rfc3339(),
        };
        let outcome = self
            .goals
            .toggle_goal_task(&toggle)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Task {} not found for goal {}", task_id, goal_id)))?;
        info!(
            "Checklist item {} of goal {} is now {}",
            task_id,
            goal_id,
            if outcome.task.is_completed { "done" } else { "open" }
        );
        Ok(outcome)
    }

    pub async fn delete_goal_task(&self, goal_id: i64, user_id: i64, task_id: i64) -> DomainResult<()> {
        let goal = self.require_goal(goal_id, user_id).await?;
        if !self.goals.delete_goal_task(&checklist_edit(&goal), task_id).await? {
            return Err(DomainError::not_found(format!("Task {} not found for goal {}", task_id, goal_id)));
        }
        info!("Deleted checklist item {} of goal {}", task_id, goal_id);
        Ok(())
    }

    /// Plan tasks from the goal's text and store them as its checklist
    pub async fn generate_goal_tasks(
        &self,
        goal_id: i64,
        user_id: i64,
        request: GenerateGoalTasksRequest,
    ) -> DomainResult<GoalTasksResponse> {
        let goal = self.require_goal(goal_id, user_id).await?;
        let description = goal.description.clone().unwrap_or_default();
        let outcome = self.planner.plan(&goal.title, &description, request.source).await;

        if outcome.tasks.is_empty() {
            warn!("No tasks planned for goal {}: {}", goal_id, outcome.status);
            return Ok(GoalTasksResponse {
                tasks: self.goals.list_goal_tasks(goal_id).await?,
                status_message: outcome.status,
            });
        }

        let tasks = self
            .goals
            .add_goal_tasks(&checklist_edit(&goal), &outcome.tasks, request.replace)
            .await?
            .ok_or_else(|| goal_not_found(goal_id))?;
        info!("Stored {} planned tasks for goal {}", outcome.tasks.len(), goal_id);
        Ok(GoalTasksResponse {
            tasks,
            status_message: outcome.status,
        })
    }
}
