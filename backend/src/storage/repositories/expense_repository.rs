use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use shared::{Expense, ExpenseInput};

use super::enum_column;
use crate::domain::date_filter::DateWindow;
use crate::domain::validation::format_date;
use crate::storage::connection::DbConnection;
use crate::storage::traits::{ExpenseQuery, ExpenseStorage};

const EXPENSE_COLUMNS: &str =
    "id, amount, category, description, expense_date, payment_method, status, notes, created_at";

/// Repository for expense records
#[derive(Clone)]
pub struct ExpenseRepository {
    db: DbConnection,
}

impl ExpenseRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn expense_from_row(row: &SqliteRow) -> Result<Expense> {
        Ok(Expense {
            id: row.try_get("id")?,
            amount: row.try_get("amount")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            expense_date: row.try_get("expense_date")?,
            payment_method: enum_column(row, "payment_method")?,
            status: enum_column(row, "status")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// WHERE clause and its bind values for a list query
    fn where_clause(query: &ExpenseQuery) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut args = Vec::new();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push("(description LIKE ? OR category LIKE ?)".to_string());
            let pattern = format!("%{}%", search);
            args.push(pattern.clone());
            args.push(pattern);
        }
        if let Some(category) = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "All")
        {
            conditions.push("category = ?".to_string());
            args.push(category.to_string());
        }
        if let Some(status) = query.status {
            conditions.push("status = ?".to_string());
            args.push(status.as_str().to_string());
        }
        if let Some((condition, date)) = query.period.sql_condition("expense_date", query.today) {
            conditions.push(condition);
            args.push(format_date(date));
        }

        if conditions.is_empty() {
            (String::new(), args)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), args)
        }
    }
}

#[async_trait]
impl ExpenseStorage for ExpenseRepository {
    async fn insert_expense(&self, input: &ExpenseInput) -> Result<Expense> {
        let created_at = Utc::now().to_rfc3339();
        let done = sqlx::query(
            r#"
            INSERT INTO expenses (amount, category, description, expense_date, payment_method, status, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.amount)
        .bind(&input.category)
        .bind(&input.description)
        .bind(&input.expense_date)
        .bind(input.payment_method.as_str())
        .bind(input.status.as_str())
        .bind(&input.notes)
        .bind(&created_at)
        .execute(self.db.pool())
        .await?;

        Ok(Expense {
            id: done.last_insert_rowid(),
            amount: input.amount,
            category: input.category.clone(),
            description: input.description.clone(),
            expense_date: input.expense_date.clone(),
            payment_method: input.payment_method,
            status: input.status,
            notes: input.notes.clone(),
            created_at,
        })
    }

    async fn update_expense(&self, id: i64, input: &ExpenseInput) -> Result<Option<Expense>> {
        let done = sqlx::query(
            r#"
            UPDATE expenses
            SET amount = ?, category = ?, description = ?, expense_date = ?,
                payment_method = ?, status = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(input.amount)
        .bind(&input.category)
        .bind(&input.description)
        .bind(&input.expense_date)
        .bind(input.payment_method.as_str())
        .bind(input.status.as_str())
        .bind(&input.notes)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_expense(id).await
    }

    async fn delete_expense(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let row = sqlx::query(&format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(Self::expense_from_row).transpose()
    }

    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>> {
        let (where_clause, args) = Self::where_clause(query);
        let sql = format!(
            "SELECT {} FROM expenses {} ORDER BY expense_date DESC, created_at DESC, id DESC",
            EXPENSE_COLUMNS, where_clause
        );
        debug!("Listing expenses: {} {:?}", sql, args);

        let mut q = sqlx::query(&sql);
        for arg in &args {
            q = q.bind(arg);
        }
        let rows = q.fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::expense_from_row).collect()
    }

    async fn recent_expenses(&self, limit: u32) -> Result<Vec<Expense>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM expenses ORDER BY expense_date DESC, created_at DESC, id DESC LIMIT ?",
            EXPENSE_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(Self::expense_from_row).collect()
    }

    async fn sum_since(&self, since: NaiveDate) -> Result<f64> {
        let total: Option<f64> =
            sqlx::query_scalar("SELECT SUM(amount) FROM expenses WHERE expense_date >= ?")
                .bind(format_date(since))
                .fetch_one(self.db.pool())
                .await?;
        Ok(total.unwrap_or(0.0))
    }

    async fn delete_all_expenses(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM expenses")
            .execute(self.db.pool())
            .await?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{DatePeriod, ExpenseStatus, PaymentMethod};

    fn input(amount: f64, category: &str, description: &str, date: &str) -> ExpenseInput {
        ExpenseInput {
            amount,
            category: category.to_string(),
            description: description.to_string(),
            expense_date: date.to_string(),
            payment_method: PaymentMethod::Cash,
            status: ExpenseStatus::Paid,
            notes: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 28).unwrap()
    }

    async fn seeded() -> ExpenseRepository {
        let repo = ExpenseRepository::new(DbConnection::init_test().await.unwrap());
        repo.insert_expense(&input(12.5, "Food", "Lunch with team", "2025-08-28")).await.unwrap();
        repo.insert_expense(&input(300.0, "Rent", "August rent", "2025-08-01")).await.unwrap();
        let mut planned = input(45.0, "Transport", "Train pass", "2025-07-15");
        planned.status = ExpenseStatus::Planned;
        planned.payment_method = PaymentMethod::Bkash;
        repo.insert_expense(&planned).await.unwrap();
        repo.insert_expense(&input(80.0, "Food", "Groceries", "2025-04-02")).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let repo = seeded().await;
        let all = repo.list_expenses(&ExpenseQuery::all(today())).await.unwrap();
        let dates: Vec<&str> = all.iter().map(|e| e.expense_date.as_str()).collect();
        assert_eq!(dates, vec!["2025-08-28", "2025-08-01", "2025-07-15", "2025-04-02"]);
        assert_eq!(all[2].payment_method, PaymentMethod::Bkash);
    }

    #[tokio::test]
    async fn test_filters_combine() {
        let repo = seeded().await;
        let mut query = ExpenseQuery::all(today());
        query.search = Some("food".to_string());
        assert_eq!(repo.list_expenses(&query).await.unwrap().len(), 2);

        query.period = DatePeriod::ThisMonth;
        let this_month = repo.list_expenses(&query).await.unwrap();
        assert_eq!(this_month.len(), 1);
        assert_eq!(this_month[0].description, "Lunch with team");

        let mut query = ExpenseQuery::all(today());
        query.category = Some("All".to_string());
        query.status = Some(ExpenseStatus::Planned);
        let planned = repo.list_expenses(&query).await.unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].category, "Transport");

        let mut query = ExpenseQuery::all(today());
        query.period = DatePeriod::Today;
        assert_eq!(repo.list_expenses(&query).await.unwrap().len(), 1);
        query.period = DatePeriod::Last90Days;
        assert_eq!(repo.list_expenses(&query).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_delete_and_sums() {
        let repo = seeded().await;
        let since = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        assert_eq!(repo.sum_since(since).await.unwrap(), 312.5);

        let first = repo.recent_expenses(1).await.unwrap().remove(0);
        let updated = repo
            .update_expense(first.id, &input(20.0, "Food", "Dinner", "2025-08-28"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description, "Dinner");
        assert_eq!(updated.created_at, first.created_at);
        assert!(repo.update_expense(9999, &input(1.0, "X", "Y", "2025-01-01")).await.unwrap().is_none());

        assert!(repo.delete_expense(first.id).await.unwrap());
        assert!(!repo.delete_expense(first.id).await.unwrap());
        assert_eq!(repo.delete_all_expenses().await.unwrap(), 3);
        assert_eq!(repo.sum_since(since).await.unwrap(), 0.0);
    }
}
