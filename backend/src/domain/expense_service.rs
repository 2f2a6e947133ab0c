//! Expense tracking: CRUD, filtered listing and the summary report.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use shared::{
    CategoryBreakdown, Expense, ExpenseInput, ExpenseListRequest, ExpenseListResponse, ExpenseReport,
    MonthlyBreakdown,
};

use super::date_filter::first_of_month;
use super::errors::{DomainError, DomainResult};
use super::validation::{format_date, optional, parse_date, positive_amount, required};
use crate::storage::{ExpenseQuery, ExpenseStorage};

pub const INVALID_AMOUNT: &str = "Please enter a valid positive amount";
const REPORT_MONTHS: usize = 6;
const TOP_EXPENSES: usize = 5;

/// Trim and check an expense form; the date comes back normalised
pub fn validate_expense(input: ExpenseInput) -> DomainResult<ExpenseInput> {
    let amount = positive_amount(input.amount, INVALID_AMOUNT)?;
    let category = required(&input.category, "Category")?;
    let description = required(&input.description, "Description")?;
    let date = parse_date(&input.expense_date, "Date")?;
    Ok(ExpenseInput {
        amount,
        category,
        description,
        expense_date: format_date(date),
        payment_method: input.payment_method,
        status: input.status,
        notes: optional(input.notes.as_deref()),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct ExpenseService {
    expenses: Arc<dyn ExpenseStorage>,
}

impl ExpenseService {
    pub fn new(expenses: Arc<dyn ExpenseStorage>) -> Self {
        Self { expenses }
    }

    pub async fn create_expense(&self, input: ExpenseInput) -> DomainResult<Expense> {
        let input = validate_expense(input)?;
        let expense = self.expenses.insert_expense(&input).await?;
        info!("Created expense {} ({} {:.2})", expense.id, expense.category, expense.amount);
        Ok(expense)
    }

    pub async fn update_expense(&self, id: i64, input: ExpenseInput) -> DomainResult<Expense> {
        let input = validate_expense(input)?;
        let expense = self
            .expenses
            .update_expense(id, &input)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Expense {} not found", id)))?;
        info!("Updated expense {}", id);
        Ok(expense)
    }

    pub async fn delete_expense(&self, id: i64) -> DomainResult<()> {
        if !self.expenses.delete_expense(id).await? {
            return Err(DomainError::not_found(format!("Expense {} not found", id)));
        }
        info!("Deleted expense {}", id);
        Ok(())
    }

    pub async fn get_expense(&self, id: i64) -> DomainResult<Expense> {
        self.expenses
            .get_expense(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Expense {} not found", id)))
    }

    pub async fn list_expenses(&self, request: ExpenseListRequest, today: NaiveDate) -> DomainResult<ExpenseListResponse> {
        let query = ExpenseQuery {
            search: request.search,
            category: request.category,
            status: request.status,
            period: request.period,
            today,
        };
        let expenses = self.expenses.list_expenses(&query).await?;
        let total_amount = round2(expenses.iter().map(|e| e.amount).sum());
        Ok(ExpenseListResponse { expenses, total_amount })
    }

    pub async fn recent(&self, limit: u32) -> DomainResult<Vec<Expense>> {
        Ok(self.expenses.recent_expenses(limit).await?)
    }

    pub async fn monthly_total(&self, today: NaiveDate) -> DomainResult<f64> {
        Ok(self.expenses.sum_since(first_of_month(today)).await?)
    }

    /// Delete every expense, returning how many were removed
    pub async fn clear_all(&self) -> DomainResult<u64> {
        let removed = self.expenses.delete_all_expenses().await?;
        info!("Cleared {} expenses", removed);
        Ok(removed)
    }

    pub async fn summary_report(&self, today: NaiveDate) -> DomainResult<ExpenseReport> {
        let expenses = self.expenses.list_expenses(&ExpenseQuery::all(today)).await?;
        Ok(build_report(&expenses, today))
    }
}

/// Aggregate figures over `expenses`
pub fn build_report(expenses: &[Expense], today: NaiveDate) -> ExpenseReport {
    let total_count = expenses.len() as i64;
    let total_amount: f64 = expenses.iter().map(|e| e.amount).sum();
    let average_amount = if expenses.is_empty() { 0.0 } else { total_amount / expenses.len() as f64 };
    let min_amount = expenses.iter().map(|e| e.amount).reduce(f64::min).unwrap_or(0.0);
    let max_amount = expenses.iter().map(|e| e.amount).reduce(f64::max).unwrap_or(0.0);

    let month_start = format_date(first_of_month(today));
    let monthly_amount: f64 = expenses
        .iter()
        .filter(|e| e.expense_date >= month_start)
        .map(|e| e.amount)
        .sum();

    let mut months: BTreeMap<String, (i64, f64)> = BTreeMap::new();
    for expense in expenses {
        let month = expense.expense_date.get(..7).unwrap_or(&expense.expense_date).to_string();
        let entry = months.entry(month).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += expense.amount;
    }
    let monthly = months
        .into_iter()
        .rev()
        .take(REPORT_MONTHS)
        .map(|(month, (count, total))| MonthlyBreakdown { month, count, total: round2(total) })
        .collect();

    let mut by_category: BTreeMap<String, (i64, f64)> = BTreeMap::new();
    for expense in expenses {
        let entry = by_category.entry(expense.category.clone()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += expense.amount;
    }
    let mut categories: Vec<CategoryBreakdown> = by_category
        .into_iter()
        .map(|(category, (count, total))| CategoryBreakdown {
            category,
            count,
            total: round2(total),
            average: round2(total / count as f64),
            percentage: if total_amount > 0.0 { round2(total / total_amount * 100.0) } else { 0.0 },
        })
        .collect();
    categories.sort_by(|a, b| b.total.total_cmp(&a.total));

    let mut top_expenses = expenses.to_vec();
    top_expenses.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    top_expenses.truncate(TOP_EXPENSES);

    ExpenseReport {
        total_count,
        total_amount: round2(total_amount),
        average_amount: round2(average_amount),
        min_amount,
        max_amount,
        monthly_amount: round2(monthly_amount),
        monthly,
        categories,
        top_expenses,
        generated_at: Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DbConnection, ExpenseRepository};
    use shared::{ExpenseStatus, PaymentMethod};

    fn input(amount: f64, category: &str, date: &str) -> ExpenseInput {
        ExpenseInput {
            amount,
            category: category.to_string(),
            description: format!("{} purchase", category),
            expense_date: date.to_string(),
            payment_method: PaymentMethod::Card,
            status: ExpenseStatus::Paid,
            notes: Some("  ".to_string()),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 28).unwrap()
    }

    async fn service() -> ExpenseService {
        let db = DbConnection::init_test().await.unwrap();
        ExpenseService::new(Arc::new(ExpenseRepository::new(db)))
    }

    #[test]
    fn test_validation_messages() {
        let err = validate_expense(input(-1.0, "Food", "2025-08-01")).unwrap_err();
        assert_eq!(err.to_string(), INVALID_AMOUNT);
        let err = validate_expense(input(f64::INFINITY, "Food", "2025-08-01")).unwrap_err();
        assert_eq!(err.to_string(), INVALID_AMOUNT);
        let err = validate_expense(input(1.0, " ", "2025-08-01")).unwrap_err();
        assert_eq!(err.to_string(), "Category is required");
        let err = validate_expense(input(1.0, "Food", "2025/08/01")).unwrap_err();
        assert_eq!(err.to_string(), "Date must be in YYYY-MM-DD format");

        let ok = validate_expense(input(1.0, " Food ", "2025-08-01")).unwrap();
        assert_eq!(ok.category, "Food");
        assert_eq!(ok.notes, None);
    }

    #[tokio::test]
    async fn test_crud_and_not_found() {
        let service = service().await;
        let created = service.create_expense(input(10.0, "Food", "2025-08-01")).await.unwrap();
        let updated = service
            .update_expense(created.id, input(12.0, "Food", "2025-08-02"))
            .await
            .unwrap();
        assert_eq!(updated.amount, 12.0);
        assert_eq!(service.get_expense(created.id).await.unwrap(), updated);

        service.delete_expense(created.id).await.unwrap();
        assert!(matches!(service.get_expense(created.id).await, Err(DomainError::NotFound(_))));
        assert!(matches!(service.delete_expense(created.id).await, Err(DomainError::NotFound(_))));
        assert!(matches!(
            service.update_expense(created.id, input(1.0, "Food", "2025-08-02")).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_totals_and_monthly_sum() {
        let service = service().await;
        service.create_expense(input(10.25, "Food", "2025-08-01")).await.unwrap();
        service.create_expense(input(20.0, "Rent", "2025-08-20")).await.unwrap();
        service.create_expense(input(5.0, "Food", "2025-07-31")).await.unwrap();

        let listed = service
            .list_expenses(ExpenseListRequest { category: Some("Food".into()), ..Default::default() }, today())
            .await
            .unwrap();
        assert_eq!(listed.expenses.len(), 2);
        assert_eq!(listed.total_amount, 15.25);
        assert_eq!(service.monthly_total(today()).await.unwrap(), 30.25);
        assert_eq!(service.recent(2).await.unwrap()[0].expense_date, "2025-08-20");
        assert_eq!(service.clear_all().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_summary_report() {
        let service = service().await;
        for (amount, category, date) in [
            (100.0, "Rent", "2025-08-01"),
            (50.0, "Food", "2025-08-10"),
            (30.0, "Food", "2025-07-05"),
            (20.0, "Transport", "2025-02-11"),
            (1.0, "Food", "2025-01-15"),
            (2.0, "Food", "2024-12-15"),
            (3.0, "Food", "2024-11-15"),
            (4.0, "Food", "2024-10-15"),
        ] {
            service.create_expense(input(amount, category, date)).await.unwrap();
        }

        let report = service.summary_report(today()).await.unwrap();
        assert_eq!(report.total_count, 8);
        assert_eq!(report.total_amount, 210.0);
        assert_eq!(report.average_amount, 26.25);
        assert_eq!(report.min_amount, 1.0);
        assert_eq!(report.max_amount, 100.0);
        assert_eq!(report.monthly_amount, 150.0);

        let months: Vec<&str> = report.monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2025-08", "2025-07", "2025-02", "2025-01", "2024-12", "2024-11"]);
        assert_eq!(report.monthly[0].count, 2);
        assert_eq!(report.monthly[0].total, 150.0);

        assert_eq!(report.categories[0].category, "Rent");
        assert_eq!(report.categories[1].category, "Food");
        assert_eq!(report.categories[1].count, 6);
        assert_eq!(report.categories[1].total, 90.0);
        assert_eq!(report.categories[1].average, 15.0);
        assert_eq!(report.categories[0].percentage, 47.62);

        assert_eq!(report.top_expenses.len(), 5);
        assert_eq!(report.top_expenses[0].amount, 100.0);
        assert_eq!(report.top_expenses[4].amount, 4.0);
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(&[], today());
        assert_eq!(report.total_count, 0);
        assert_eq!(report.average_amount, 0.0);
        assert!(report.categories.is_empty());
        assert!(report.monthly.is_empty());
    }
}
