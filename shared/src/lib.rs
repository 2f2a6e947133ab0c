use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed set of values that travel as display strings, both in
/// JSON and in the database columns.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| format!("Invalid {}: {}", stringify!($name), s))
            }
        }
    };
}

string_enum!(
    /// Priority of a task or goal
    Priority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
);

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

string_enum!(
    /// Lifecycle of a task
    TaskStatus {
        Pending => "Pending",
        InProgress => "In Progress",
        Completed => "Completed",
    }
);

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

string_enum!(
    /// Lifecycle of a goal. `Completed` and `Achieved` are terminal.
    GoalStatus {
        Active => "Active",
        NotStarted => "Not Started",
        InProgress => "In Progress",
        Completed => "Completed",
        Achieved => "Achieved",
    }
);

impl GoalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Completed | GoalStatus::Achieved)
    }

    /// Statuses counted as "active" on the dashboard
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl Default for GoalStatus {
    fn default() -> Self {
        GoalStatus::Active
    }
}

string_enum!(
    GoalType {
        General => "general",
        Fitness => "fitness",
        Career => "career",
        Personal => "personal",
        Financial => "financial",
    }
);

impl Default for GoalType {
    fn default() -> Self {
        GoalType::General
    }
}

string_enum!(
    PaymentMethod {
        Cash => "Cash",
        Card => "Card",
        Bank => "Bank",
        Bkash => "Bkash",
        Nagad => "Nagad",
        Other => "Other",
    }
);

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

string_enum!(
    ExpenseStatus {
        Planned => "Planned",
        Incurred => "Incurred",
        Paid => "Paid",
    }
);

impl Default for ExpenseStatus {
    fn default() -> Self {
        ExpenseStatus::Paid
    }
}

string_enum!(
    /// Client-side date windows used to filter lists
    DatePeriod {
        AllTime => "all_time",
        Today => "today",
        ThisWeek => "this_week",
        ThisMonth => "this_month",
        Last30Days => "last_30_days",
        Last90Days => "last_90_days",
    }
);

impl Default for DatePeriod {
    fn default() -> Self {
        DatePeriod::AllTime
    }
}

string_enum!(
    /// Where a task plan comes from
    PlanSource {
        Rules => "rules",
        Generative => "generative",
    }
);

impl Default for PlanSource {
    fn default() -> Self {
        PlanSource::Rules
    }
}

string_enum!(
    Theme {
        Light => "light",
        Dark => "dark",
    }
);

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

string_enum!(
    Language {
        En => "en",
        Bn => "bn",
    }
);

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A registered user. The password hash never leaves the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// YYYY-MM-DD
    pub date_of_birth: Option<String>,
    /// Digits only, 7-15 characters
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    pub description: String,
    /// YYYY-MM-DD
    pub expense_date: String,
    pub payment_method: PaymentMethod,
    pub status: ExpenseStatus,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Form values for creating or replacing an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub expense_date: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: ExpenseStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseListRequest {
    pub search: Option<String>,
    /// "All" or absent disables the filter
    pub category: Option<String>,
    pub status: Option<ExpenseStatus>,
    #[serde(default)]
    pub period: DatePeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    /// YYYY-MM
    pub month: String,
    pub count: i64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub count: i64,
    pub total: f64,
    pub average: f64,
    /// Share of the overall total, in percent
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseReport {
    pub total_count: i64,
    pub total_amount: f64,
    pub average_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    pub monthly_amount: f64,
    pub monthly: Vec<MonthlyBreakdown>,
    pub categories: Vec<CategoryBreakdown>,
    pub top_expenses: Vec<Expense>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskListRequest {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTaskStatusRequest {
    pub status: TaskStatus,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_value: Option<f64>,
    pub current_value: f64,
    /// Always within [0, 100]
    pub progress_percentage: i64,
    /// YYYY-MM-DD
    pub deadline: Option<String>,
    pub status: GoalStatus,
    pub priority: Priority,
    pub created_at: String,
    pub updated_at: String,
}

/// One entry of the append-only progress log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub id: i64,
    pub goal_id: i64,
    pub user_id: i64,
    pub progress_percentage: i64,
    pub notes: Option<String>,
    pub created_at: String,
}

/// A checklist item under a goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalTask {
    pub id: i64,
    pub goal_id: i64,
    pub task_description: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub goal_type: GoalType,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal_type: Option<GoalType>,
    pub target_value: Option<f64>,
    pub deadline: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProgressRequest {
    pub current_value: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalResponse {
    pub goal: Goal,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalStats {
    pub total_goals: i64,
    pub completed_goals: i64,
    pub active_goals: i64,
    /// Percent of goals completed
    pub completion_rate: f64,
    /// Mean progress of active goals, rounded to two decimals
    pub average_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalTaskInput {
    pub task_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateGoalTasksRequest {
    #[serde(default)]
    pub source: PlanSource,
    /// Remove existing checklist items first
    #[serde(default)]
    pub replace: bool,
}

/// A checklist item after toggling, with the goal as recomputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleGoalTaskResponse {
    pub task: GoalTask,
    pub goal: Goal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalTasksResponse {
    pub tasks: Vec<GoalTask>,
    pub status_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: PlanSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub tasks: Vec<String>,
    pub source: PlanSource,
    pub status_message: String,
}

// ---------------------------------------------------------------------------
// Medications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    pub schedule: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationInput {
    pub name: String,
    pub dosage: String,
    pub schedule: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// `?search=` matches anywhere in the medication name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationListRequest {
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// Dashboard & settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardCard {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub title: String,
    pub user_name: String,
    pub welcome: String,
    pub pending_tasks: i64,
    pub active_medications: i64,
    pub active_goals: i64,
    pub monthly_expense: f64,
    pub cards: Vec<DashboardCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub language: Language,
}

/// Colors used by whichever client renders the screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub bg: String,
    pub fg: String,
    pub card_bg: String,
    pub header_bg: String,
    pub header_fg: String,
    pub footer_bg: String,
    pub footer_fg: String,
    pub entry_bg: String,
    pub entry_fg: String,
    pub button_bg: String,
    pub button_fg: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_round_trip_through_json() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let parsed: GoalStatus = serde_json::from_str("\"Not Started\"").unwrap();
        assert_eq!(parsed, GoalStatus::NotStarted);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("paid".parse::<ExpenseStatus>().unwrap(), ExpenseStatus::Paid);
        assert_eq!("LAST_30_DAYS".parse::<DatePeriod>().unwrap(), DatePeriod::Last30Days);
        assert!("sometime".parse::<DatePeriod>().is_err());
    }

    #[test]
    fn test_terminal_goal_statuses() {
        assert!(GoalStatus::Completed.is_terminal());
        assert!(GoalStatus::Achieved.is_terminal());
        assert!(GoalStatus::NotStarted.is_open());
    }

    #[test]
    fn test_defaults_match_form_defaults() {
        let input: TaskInput = serde_json::from_str(r#"{"title":"Pay rent"}"#).unwrap();
        assert_eq!(input.priority, Priority::Medium);
        assert_eq!(input.status, TaskStatus::Pending);
        assert_eq!(UiSettings::default().theme, Theme::Light);
    }
}
