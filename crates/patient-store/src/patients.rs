use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use stroke_risk::{StrokeAggregate, StrokeRecord, SubgroupTotals};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, gender, age, hypertension, heart_disease, ever_married, \
     work_type, residence_type, avg_glucose_level, bmi, smoking_status, stroke";

/// Patient CRUD, paginated queries and aggregates.
#[derive(Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

/// Reject anything that is not a UUID before it reaches SQL.
pub fn parse_patient_id(raw: &str) -> StoreResult<String> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| {
            tracing::warn!("Invalid patient id rejected");
            StoreError::InvalidPatientId
        })
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PatientFilter) {
    if *filter == PatientFilter::default() {
        return;
    }

    qb.push(" WHERE ");
    let mut conditions = qb.separated(" AND ");
    if let Some(gender) = &filter.gender {
        conditions.push("gender = ").push_bind_unseparated(gender.clone());
    }
    if let Some(stroke) = filter.stroke {
        conditions.push("stroke = ").push_bind_unseparated(stroke);
    }
    if let Some(hypertension) = filter.hypertension {
        conditions.push("hypertension = ").push_bind_unseparated(hypertension);
    }
    if let Some(heart_disease) = filter.heart_disease {
        conditions.push("heart_disease = ").push_bind_unseparated(heart_disease);
    }
    if let Some(smoking_status) = &filter.smoking_status {
        conditions.push("smoking_status = ").push_bind_unseparated(smoking_status.clone());
    }
    if let Some(work_type) = &filter.work_type {
        conditions.push("work_type = ").push_bind_unseparated(work_type.clone());
    }
}

impl PatientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a patient and return its generated id.
    pub async fn create(&self, patient: &NewPatient) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        insert(&self.pool, &id, patient).await?;
        tracing::info!("New patient record created.");
        Ok(id)
    }

    /// Insert many records in one transaction. Returns the number inserted.
    pub async fn insert_many(&self, patients: &[NewPatient]) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        for patient in patients {
            insert(&mut *tx, &Uuid::new_v4().to_string(), patient).await?;
        }
        tx.commit().await?;
        Ok(patients.len() as u64)
    }

    /// Swap the whole collection for `patients` in one transaction. On any
    /// failure the previous records are left in place.
    pub async fn replace_all(&self, patients: &[NewPatient]) -> StoreResult<(u64, u64)> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM patients")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        for patient in patients {
            insert(&mut *tx, &Uuid::new_v4().to_string(), patient).await?;
        }
        tx.commit().await?;
        Ok((deleted, patients.len() as u64))
    }

    pub async fn find(
        &self,
        filter: &PatientFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Patient>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(PATIENT_COLUMNS).push(" FROM patients");
        push_filter(&mut qb, filter);
        // sort column comes from the SortField whitelist
        qb.push(" ORDER BY ")
            .push(page.sort_field.column())
            .push(" ")
            .push(page.sort_order.as_sql())
            .push(", id ASC LIMIT ");
        qb.push_bind(i64::from(page.per_page));
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let patients = qb.build_query_as::<Patient>().fetch_all(&self.pool).await?;
        Ok(patients)
    }

    pub async fn count(&self, filter: &PatientFilter) -> StoreResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM patients");
        push_filter(&mut qb, filter);
        let total = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total)
    }

    /// One page of patients plus paging metadata.
    pub async fn page(
        &self,
        filter: &PatientFilter,
        request: &PageRequest,
    ) -> StoreResult<PatientPage> {
        let patients = self.find(filter, request).await?;
        let total = self.count(filter).await?;
        Ok(PatientPage::new(patients, total, request))
    }

    pub async fn get(&self, id: &str) -> StoreResult<Patient> {
        let id = parse_patient_id(id)?;
        let query = format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS);
        sqlx::query_as::<_, Patient>(&query)
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::PatientNotFound)
    }

    /// Apply a partial update. Returns the number of modified rows.
    pub async fn update(&self, id: &str, update: &PatientUpdate) -> StoreResult<u64> {
        let id = parse_patient_id(id)?;

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE patients SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = &update.gender {
            set.push("gender = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = update.age {
            set.push("age = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.hypertension {
            set.push("hypertension = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.heart_disease {
            set.push("heart_disease = ").push_bind_unseparated(v);
        }
        if let Some(v) = &update.ever_married {
            set.push("ever_married = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &update.work_type {
            set.push("work_type = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &update.residence_type {
            set.push("residence_type = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = update.avg_glucose_level {
            set.push("avg_glucose_level = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.bmi {
            set.push("bmi = ").push_bind_unseparated(v);
        }
        if let Some(v) = &update.smoking_status {
            set.push("smoking_status = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = update.stroke {
            set.push("stroke = ").push_bind_unseparated(v);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.clone());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::PatientNotFound);
        }

        tracing::info!("Patient {} updated.", id);
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let id = parse_patient_id(id)?;
        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(&id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::PatientNotFound);
        }
        tracing::info!("Patient {} deleted.", id);
        Ok(())
    }

    /// Every record with its outcome, for in-memory summaries.
    pub async fn stroke_records(&self) -> StoreResult<Vec<StrokeRecord>> {
        let query = format!("SELECT {} FROM patients", PATIENT_COLUMNS);
        let patients = sqlx::query_as::<_, Patient>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(patients.iter().map(Patient::stroke_record).collect())
    }

    /// Counts and stroke-subgroup averages computed by the database.
    /// A BMI of NULL or 0 is no measurement and stays out of the average.
    pub async fn stroke_aggregate(&self) -> StoreResult<StrokeAggregate> {
        let (total, stroke_cases): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN stroke = 1 THEN 1 ELSE 0 END), 0)
             FROM patients",
        )
        .fetch_one(&self.pool)
        .await?;

        let (count, avg_age, avg_glucose, avg_bmi, hypertension, heart_disease): (
            i64,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<i64>,
            Option<i64>,
        ) = sqlx::query_as(
            "SELECT COUNT(*), AVG(age), AVG(avg_glucose_level), AVG(NULLIF(bmi, 0)),
                    SUM(hypertension), SUM(heart_disease)
             FROM patients WHERE stroke = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        let subgroup = (count > 0).then(|| SubgroupTotals {
            avg_age,
            avg_glucose,
            avg_bmi,
            hypertension_count: hypertension.unwrap_or(0),
            heart_disease_count: heart_disease.unwrap_or(0),
        });

        Ok(StrokeAggregate {
            total,
            stroke_cases,
            subgroup,
        })
    }

    /// Record counts per distinct value of a column, largest group first.
    pub async fn distribution(&self, field: SortField) -> StoreResult<Vec<(String, i64)>> {
        let query = format!(
            "SELECT CAST({col} AS TEXT), COUNT(*) FROM patients
             GROUP BY {col} ORDER BY COUNT(*) DESC, {col} ASC",
            col = field.column()
        );
        let rows: Vec<(Option<String>, i64)> =
            sqlx::query_as(&query).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(value, count)| (value.unwrap_or_else(|| "N/A".to_string()), count))
            .collect())
    }

    /// Minimum, mean and maximum age.
    pub async fn age_range(&self) -> StoreResult<Option<(f64, f64, f64)>> {
        let row: (Option<f64>, Option<f64>, Option<f64>) =
            sqlx::query_as("SELECT MIN(age), AVG(age), MAX(age) FROM patients")
                .fetch_one(&self.pool)
                .await?;
        Ok(match row {
            (Some(min), Some(avg), Some(max)) => Some((min, avg, max)),
            _ => None,
        })
    }
}

async fn insert<'e, E>(executor: E, id: &str, patient: &NewPatient) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO patients (
            id, gender, age, hypertension, heart_disease, ever_married,
            work_type, residence_type, avg_glucose_level, bmi, smoking_status, stroke
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&patient.gender)
    .bind(patient.age)
    .bind(patient.hypertension)
    .bind(patient.heart_disease)
    .bind(&patient.ever_married)
    .bind(&patient.work_type)
    .bind(&patient.residence_type)
    .bind(patient.avg_glucose_level)
    .bind(patient.bmi.filter(|b| !b.is_nan()))
    .bind(&patient.smoking_status)
    .bind(patient.stroke)
    .execute(executor)
    .await?;
    Ok(())
}
