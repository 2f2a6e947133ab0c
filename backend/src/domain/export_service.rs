//! CSV export and import of expenses.
//!
//! Export writes `ID,Amount,Category,Description,Expense Date,Created At`.
//! Import reads that same layout back (the header row is detected) or plain
//! headerless `amount,category,description,expense_date` rows. Rows that fail
//! validation are reported by line number and skipped.

use std::sync::Arc;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::{info, warn};

use shared::{ExpenseInput, ExpenseStatus, ImportResult, PaymentMethod};

use super::errors::{DomainError, DomainResult};
use super::expense_service::{validate_expense, INVALID_AMOUNT};
use crate::storage::{ExpenseQuery, ExpenseStorage};

pub const EXPORT_HEADER: [&str; 6] = ["ID", "Amount", "Category", "Description", "Expense Date", "Created At"];

/// Column positions of amount, category, description and date
#[derive(Debug, Clone, Copy)]
struct Layout {
    amount: usize,
    category: usize,
    description: usize,
    date: usize,
}

const EXPORT_LAYOUT: Layout = Layout { amount: 1, category: 2, description: 3, date: 4 };
const PLAIN_LAYOUT: Layout = Layout { amount: 0, category: 1, description: 2, date: 3 };

impl Layout {
    /// Layout implied by a header row, or `None` when the row is data
    fn from_header(record: &StringRecord) -> Option<Layout> {
        match record.get(0).map(str::to_ascii_lowercase).as_deref() {
            Some("id") => Some(EXPORT_LAYOUT),
            Some("amount") => Some(PLAIN_LAYOUT),
            _ => None,
        }
    }

    fn parse(&self, record: &StringRecord) -> Result<ExpenseInput, String> {
        let field = |index: usize, name: &str| {
            record
                .get(index)
                .map(str::to_string)
                .ok_or_else(|| format!("missing {}", name))
        };
        let amount = field(self.amount, "amount")?
            .parse::<f64>()
            .map_err(|_| INVALID_AMOUNT.to_string())?;
        Ok(ExpenseInput {
            amount,
            category: field(self.category, "category")?,
            description: field(self.description, "description")?,
            expense_date: field(self.date, "date")?,
            payment_method: PaymentMethod::default(),
            status: ExpenseStatus::default(),
            notes: None,
        })
    }
}

#[derive(Clone)]
pub struct ExportService {
    expenses: Arc<dyn ExpenseStorage>,
}

impl ExportService {
    pub fn new(expenses: Arc<dyn ExpenseStorage>) -> Self {
        Self { expenses }
    }

    /// All expenses as CSV text, newest first
    pub async fn export_csv(&self, today: NaiveDate) -> DomainResult<String> {
        let expenses = self.expenses.list_expenses(&ExpenseQuery::all(today)).await?;

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(EXPORT_HEADER).map_err(anyhow::Error::from)?;
        for expense in &expenses {
            writer
                .write_record([
                    expense.id.to_string(),
                    format!("{:.2}", expense.amount),
                    expense.category.clone(),
                    expense.description.clone(),
                    expense.expense_date.clone(),
                    expense.created_at.clone(),
                ])
                .map_err(anyhow::Error::from)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))?;
        let text = String::from_utf8(bytes).map_err(anyhow::Error::from)?;

        info!("Exported {} expenses as CSV", expenses.len());
        Ok(text)
    }

    pub async fn import_csv(&self, data: &str) -> DomainResult<ImportResult> {
        if data.trim().is_empty() {
            return Err(DomainError::validation("The CSV file is empty"));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(data.as_bytes());

        let mut layout = PLAIN_LAYOUT;
        let mut imported = 0;
        let mut errors = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    errors.push(format!("Row {}: {}", index + 1, e));
                    continue;
                }
            };
            let row = record.position().map_or(index as u64 + 1, |p| p.line());

            if index == 0 {
                if let Some(header_layout) = Layout::from_header(&record) {
                    layout = header_layout;
                    continue;
                }
            }
            if record.iter().all(str::is_empty) {
                continue;
            }

            let input = match layout.parse(&record) {
                Ok(input) => input,
                Err(reason) => {
                    errors.push(format!("Row {}: {}", row, reason));
                    continue;
                }
            };
            let input = match validate_expense(input) {
                Ok(input) => input,
                Err(e) => {
                    errors.push(format!("Row {}: {}", row, e));
                    continue;
                }
            };
            self.expenses.insert_expense(&input).await?;
            imported += 1;
        }

        if !errors.is_empty() {
            warn!("Skipped {} CSV rows during import", errors.len());
        }
        info!("Imported {} expenses from CSV", imported);
        Ok(ImportResult { imported, errors })
    }
}
