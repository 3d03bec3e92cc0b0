//! PatientStore implementation over the feature-facts view.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio_postgres::Row;
use uuid::Uuid;

use adherix_common::error::{AdherixError, Result};
use adherix_features::snapshot::{timestamp_version, PatientSnapshot};
use adherix_features::store::PatientStore;

use crate::database::Database;
use crate::schema::TABLE_FEATURE_FACTS;

pub struct PgPatientStore {
    db: Arc<Database>,
}

impl PgPatientStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

/// Column type drift in the view is a `SchemaMismatch`, the same
/// contract the extractor applies to uncoercible values.
fn snapshot_from_row(patient_id: Uuid, row: &Row) -> Result<PatientSnapshot> {
    fn col<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
        row.try_get(name)
            .map_err(|e| AdherixError::SchemaMismatch(format!("column {name}: {e}")))
    }

    Ok(PatientSnapshot {
        patient_id,
        birthdate: col::<Option<NaiveDate>>(row, "birthdate")?,
        sex: col::<Option<String>>(row, "sex")?,
        cd4_count: col::<Option<f64>>(row, "cd4_count")?,
        viral_load: col::<Option<String>>(row, "viral_load")?,
        art_start_date: col::<Option<NaiveDate>>(row, "art_start_date")?,
        last_visit_date: col::<Option<NaiveDate>>(row, "last_visit_date")?,
        missed_appointments_6m: col::<Option<i32>>(row, "missed_appointments_6m")?,
        pickup_adherence: col::<Option<f64>>(row, "pickup_adherence")?,
        distance_to_facility_km: col::<Option<f64>>(row, "distance_to_facility_km")?,
        has_phone: col::<Option<bool>>(row, "has_phone")?,
        has_support_system: col::<Option<bool>>(row, "has_support_system")?,
        regimen: col::<Option<String>>(row, "regimen")?,
        prior_interruptions: col::<Option<i32>>(row, "prior_interruptions")?,
        updated_at: col::<Option<DateTime<Utc>>>(row, "updated_at")?,
    })
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn fetch_snapshot(&self, patient_id: Uuid) -> Result<Option<PatientSnapshot>> {
        let query = format!(
            "SELECT birthdate, sex, cd4_count, viral_load, art_start_date, \
                    last_visit_date, missed_appointments_6m, pickup_adherence, \
                    distance_to_facility_km, has_phone, has_support_system, \
                    regimen, prior_interruptions, updated_at \
             FROM {TABLE_FEATURE_FACTS} WHERE patient_id = $1"
        );
        let row = self
            .db
            .client()
            .query_opt(&query, &[&patient_id])
            .await
            .map_err(|e| AdherixError::Database(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(snapshot_from_row(patient_id, &row)?)),
            None => Ok(None),
        }
    }

    /// Cheap probe: read only the last-modified column. Rows without
    /// one fall back to a full fetch and a content hash.
    async fn head_version(&self, patient_id: Uuid) -> Result<Option<String>> {
        let query = format!(
            "SELECT updated_at FROM {TABLE_FEATURE_FACTS} WHERE patient_id = $1"
        );
        let row = self
            .db
            .client()
            .query_opt(&query, &[&patient_id])
            .await
            .map_err(|e| AdherixError::Database(e.to_string()))?;

        let Some(row) = row else { return Ok(None) };
        let updated_at: Option<DateTime<Utc>> = row
            .try_get("updated_at")
            .map_err(|e| AdherixError::SchemaMismatch(format!("column updated_at: {e}")))?;

        match updated_at {
            Some(ts) => Ok(Some(timestamp_version(ts))),
            None => Ok(self
                .fetch_snapshot(patient_id)
                .await?
                .map(|snap| snap.data_version())),
        }
    }
}
