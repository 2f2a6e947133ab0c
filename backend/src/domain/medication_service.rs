use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use shared::{Medication, MedicationInput, MedicationListRequest};

use super::errors::{DomainError, DomainResult};
use super::validation::{format_date, optional, parse_date, required};
use crate::storage::MedicationStorage;

fn validate_medication(input: MedicationInput) -> DomainResult<MedicationInput> {
    let name = required(&input.name, "Name")?;
    let dosage = required(&input.dosage, "Dosage")?;
    let schedule = required(&input.schedule, "Schedule")?;
    let start = parse_date(&required(&input.start_date, "Start date")?, "Start date")?;
    let end = match optional(input.end_date.as_deref()) {
        Some(raw) => Some(parse_date(&raw, "End date")?),
        None => None,
    };
    if let Some(end) = end {
        if end < start {
            return Err(DomainError::validation("End date cannot be before start date"));
        }
    }
    Ok(MedicationInput {
        name,
        dosage,
        schedule,
        start_date: format_date(start),
        end_date: end.map(format_date),
    })
}

/// Whether `medication` should be taken on `today`
pub fn is_active(medication: &Medication, today: NaiveDate) -> bool {
    let today = format_date(today);
    medication.start_date <= today
        && medication.end_date.as_ref().map_or(true, |end| *end >= today)
}

#[derive(Clone)]
pub struct MedicationService {
    medications: Arc<dyn MedicationStorage>,
}

impl MedicationService {
    pub fn new(medications: Arc<dyn MedicationStorage>) -> Self {
        Self { medications }
    }

    pub async fn create_medication(&self, input: MedicationInput) -> DomainResult<Medication> {
        let input = validate_medication(input)?;
        let medication = self.medications.insert_medication(&input).await?;
        info!("Added medication {}: {}", medication.id, medication.name);
        Ok(medication)
    }

    pub async fn update_medication(&self, id: i64, input: MedicationInput) -> DomainResult<Medication> {
        let input = validate_medication(input)?;
        let medication = self
            .medications
            .update_medication(id, &input)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Medication {} not found", id)))?;
        info!("Updated medication {}", id);
        Ok(medication)
    }

    pub async fn delete_medication(&self, id: i64) -> DomainResult<()> {
        if !self.medications.delete_medication(id).await? {
            return Err(DomainError::not_found(format!("Medication {} not found", id)));
        }
        info!("Deleted medication {}", id);
        Ok(())
    }

    pub async fn get_medication(&self, id: i64) -> DomainResult<Medication> {
        self.medications
            .get_medication(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Medication {} not found", id)))
    }

    pub async fn list_medications(&self, request: &MedicationListRequest) -> DomainResult<Vec<Medication>> {
        Ok(self.medications.list_medications(request.search.as_deref()).await?)
    }

    pub async fn count_active(&self, today: NaiveDate) -> DomainResult<i64> {
        Ok(self.medications.count_active_medications(today).await?)
    }
}
