use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use shared::{Medication, MedicationInput};

use crate::domain::validation::format_date;
use crate::storage::connection::DbConnection;
use crate::storage::traits::MedicationStorage;

/// Repository for medication schedules
#[derive(Clone)]
pub struct MedicationRepository {
    db: DbConnection,
}

impl MedicationRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn medication_from_row(row: &SqliteRow) -> Result<Medication> {
        Ok(Medication {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            dosage: row.try_get("dosage")?,
            schedule: row.try_get("schedule")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
        })
    }
}

#[async_trait]
impl MedicationStorage for MedicationRepository {
    async fn insert_medication(&self, input: &MedicationInput) -> Result<Medication> {
        let done = sqlx::query(
            r#"
            INSERT INTO medications (name, dosage, schedule, start_date, end_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.dosage)
        .bind(&input.schedule)
        .bind(&input.start_date)
        .bind(&input.end_date)
        .execute(self.db.pool())
        .await?;

        Ok(Medication {
            id: done.last_insert_rowid(),
            name: input.name.clone(),
            dosage: input.dosage.clone(),
            schedule: input.schedule.clone(),
            start_date: input.start_date.clone(),
            end_date: input.end_date.clone(),
        })
    }

    async fn update_medication(&self, id: i64, input: &MedicationInput) -> Result<Option<Medication>> {
        let done = sqlx::query(
            r#"
            UPDATE medications
            SET name = ?, dosage = ?, schedule = ?, start_date = ?, end_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.dosage)
        .bind(&input.schedule)
        .bind(&input.start_date)
        .bind(&input.end_date)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_medication(id).await
    }

    async fn delete_medication(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM medications WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn get_medication(&self, id: i64) -> Result<Option<Medication>> {
        let row = sqlx::query(
            "SELECT id, name, dosage, schedule, start_date, end_date FROM medications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;
        row.as_ref().map(Self::medication_from_row).transpose()
    }

    async fn list_medications(&self, search: Option<&str>) -> Result<Vec<Medication>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let mut sql = String::from("SELECT id, name, dosage, schedule, start_date, end_date FROM medications");
        if search.is_some() {
            sql.push_str(" WHERE name LIKE ?");
        }
        sql.push_str(" ORDER BY start_date DESC, id DESC");

        let mut q = sqlx::query(&sql);
        if let Some(search) = search {
            q = q.bind(format!("%{}%", search));
        }
        let rows = q.fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::medication_from_row).collect()
    }

    async fn count_active_medications(&self, today: NaiveDate) -> Result<i64> {
        let today = format_date(today);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM medications
            WHERE start_date <= ? AND (end_date IS NULL OR end_date >= ?)
            "#,
        )
        .bind(&today)
        .bind(&today)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count)
    }
}
