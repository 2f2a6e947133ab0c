//! Dashboard summary: one call that gathers the counters shown on the home
//! screen together with the localized header and card titles.

use chrono::NaiveDate;
use tracing::info;

use shared::{DashboardCard, DashboardSummary, UiSettings};

use super::auth_service::AuthService;
use super::errors::DomainResult;
use super::expense_service::ExpenseService;
use super::goal_service::GoalService;
use super::localization::{Localizer, DASHBOARD_CARDS};
use super::medication_service::MedicationService;
use super::task_service::TaskService;

#[derive(Clone)]
pub struct DashboardService {
    auth: AuthService,
    tasks: TaskService,
    medications: MedicationService,
    goals: GoalService,
    expenses: ExpenseService,
}

impl DashboardService {
    pub fn new(
        auth: AuthService,
        tasks: TaskService,
        medications: MedicationService,
        goals: GoalService,
        expenses: ExpenseService,
    ) -> Self {
        Self {
            auth,
            tasks,
            medications,
            goals,
            expenses,
        }
    }

    /// Counters for `user_id` (or every user when `None`) as of `today`
    pub async fn summary(
        &self,
        user_id: Option<i64>,
        today: NaiveDate,
        settings: &UiSettings,
    ) -> DomainResult<DashboardSummary> {
        info!("Building dashboard summary for user {:?}", user_id);
        let localizer = Localizer::from_settings(settings);
        let user_name = self.auth.resolve_user_name(user_id).await?;

        let cards = DASHBOARD_CARDS
            .iter()
            .map(|key| DashboardCard {
                key: key.to_string(),
                title: localizer.text(key, &[]),
            })
            .collect();

        Ok(DashboardSummary {
            title: localizer.text("dashboard_title", &[]),
            welcome: localizer.text("welcome_message", &[("user", &user_name)]),
            user_name,
            pending_tasks: self.tasks.count_pending().await?,
            active_medications: self.medications.count_active(today).await?,
            active_goals: self.goals.count_open_goals(user_id).await?,
            monthly_expense: self.expenses.monthly_total(today).await?,
            cards,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::planner::PlannerService;
    use crate::storage::{
        DbConnection, ExpenseRepository, GoalRepository, MedicationRepository, TaskRepository, UserRepository,
    };
    use shared::{
        CreateGoalRequest, ExpenseInput, ExpenseStatus, Language, MedicationInput, PaymentMethod, Priority,
        RegisterRequest, TaskInput, TaskStatus,
    };

    struct Fixture {
        dashboard: DashboardService,
        auth: AuthService,
        tasks: TaskService,
        medications: MedicationService,
        goals: GoalService,
        expenses: ExpenseService,
    }

    async fn fixture() -> Fixture {
        let db = DbConnection::init_test().await.unwrap();
        let auth = AuthService::new(Arc::new(UserRepository::new(db.clone()))).with_iterations(1_000);
        let tasks = TaskService::new(Arc::new(TaskRepository::new(db.clone())));
        let medications = MedicationService::new(Arc::new(MedicationRepository::new(db.clone())));
        let goals = GoalService::new(Arc::new(GoalRepository::new(db.clone())), PlannerService::default());
        let expenses = ExpenseService::new(Arc::new(ExpenseRepository::new(db)));
        let dashboard = DashboardService::new(
            auth.clone(),
            tasks.clone(),
            medications.clone(),
            goals.clone(),
            expenses.clone(),
        );
        Fixture { dashboard, auth, tasks, medications, goals, expenses }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 28).unwrap()
    }

    #[tokio::test]
    async fn test_empty_dashboard_for_admin() {
        let f = fixture().await;
        let summary = f.dashboard.summary(None, today(), &UiSettings::default()).await.unwrap();
        assert_eq!(summary.user_name, "Admin");
        assert_eq!(summary.title, "🧠 Life Manager Dashboard");
        assert_eq!(summary.welcome, "✨ Welcome Admin! Manage your life efficiently ✨");
        assert_eq!(summary.pending_tasks, 0);
        assert_eq!(summary.monthly_expense, 0.0);
        assert_eq!(summary.cards.len(), DASHBOARD_CARDS.len());
        assert_eq!(summary.cards[0].key, "task_management");
    }

    #[tokio::test]
    async fn test_counters_and_localized_header() {
        let f = fixture().await;
        let user = f
            .auth
            .register(RegisterRequest {
                name: "Rahim".into(),
                email: "rahim@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret1".into(),
                date_of_birth: None,
                phone: None,
            })
            .await
            .unwrap()
            .user;

        for status in [TaskStatus::Pending, TaskStatus::Pending, TaskStatus::Completed] {
            f.tasks
                .create_task(TaskInput {
                    title: "Task".into(),
                    description: String::new(),
                    priority: Priority::Low,
                    status,
                    due_date: None,
                })
                .await
                .unwrap();
        }
        f.medications
            .create_medication(MedicationInput {
                name: "Vitamin D".into(),
                dosage: "1 tab".into(),
                schedule: "Morning".into(),
                start_date: "2025-08-01".into(),
                end_date: None,
            })
            .await
            .unwrap();
        let goal = f
            .goals
            .create_goal(
                user.id,
                CreateGoalRequest {
                    title: "Save".into(),
                    target_value: Some(10.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .goal;
        f.goals
            .create_goal(user.id, CreateGoalRequest { title: "Walk".into(), ..Default::default() })
            .await
            .unwrap();
        f.goals.update_progress(goal.id, user.id, 10.0, None).await.unwrap();
        for (amount, date) in [(40.0, "2025-08-03"), (2.5, "2025-08-28"), (99.0, "2025-07-31")] {
            f.expenses
                .create_expense(ExpenseInput {
                    amount,
                    category: "Food".into(),
                    description: "Groceries".into(),
                    expense_date: date.into(),
                    payment_method: PaymentMethod::Cash,
                    status: ExpenseStatus::Paid,
                    notes: None,
                })
                .await
                .unwrap();
        }

        let settings = UiSettings { language: Language::Bn, ..Default::default() };
        let summary = f.dashboard.summary(Some(user.id), today(), &settings).await.unwrap();
        assert_eq!(summary.user_name, "Rahim");
        assert!(summary.welcome.contains("Rahim"));
        assert!(summary.title.contains("লাইফ"));
        assert_eq!(summary.pending_tasks, 2);
        assert_eq!(summary.active_medications, 1);
        assert_eq!(summary.active_goals, 1);
        assert_eq!(summary.monthly_expense, 42.5);
    }
}
