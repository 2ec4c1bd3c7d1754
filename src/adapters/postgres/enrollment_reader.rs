//! PostgreSQL implementation of EnrollmentReader.
//!
//! Contact values are stored normalized, so lookups are plain equality
//! and can use `contact_points_kind_value_idx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::contact::ContactQuery;
use crate::domain::enrollment::{
    BillingType, EnrollmentStatus, GraduationStatus, PaymentFrequency, Person, ProgramProfile,
};
use crate::domain::foundation::{
    DomainError, PersonId, ProgramCode, ProgramProfileId, Timestamp,
};
use crate::ports::EnrollmentReader;

#[derive(Clone)]
pub struct PostgresEnrollmentReader {
    pool: PgPool,
}

impl PostgresEnrollmentReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PersonRow {
    id: Uuid,
    display_name: String,
    date_of_birth: Option<NaiveDate>,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person {
            id: PersonId::from_uuid(row.id),
            display_name: row.display_name,
            date_of_birth: row.date_of_birth,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    person_id: Uuid,
    program: String,
    status: String,
    graduation_status: Option<String>,
    payment_frequency: Option<String>,
    billing_type: Option<String>,
    family_reference_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for ProgramProfile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let program = ProgramCode::new(row.program.as_str()).map_err(|e| {
            DomainError::database(format!("Invalid program on profile {}: {}", row.id, e))
        })?;
        let status = EnrollmentStatus::parse(&row.status).ok_or_else(|| {
            DomainError::database(format!("Invalid enrollment status: {}", row.status))
        })?;

        Ok(ProgramProfile {
            id: ProgramProfileId::from_uuid(row.id),
            person_id: PersonId::from_uuid(row.person_id),
            program,
            status,
            graduation_status: parse_optional(row.graduation_status, GraduationStatus::parse)?,
            payment_frequency: parse_optional(row.payment_frequency, PaymentFrequency::parse)?,
            billing_type: parse_optional(row.billing_type, BillingType::parse)?,
            family_reference_id: row.family_reference_id,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_optional<T>(
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, DomainError> {
    match value {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| DomainError::database(format!("Invalid enum value: {}", raw))),
    }
}

fn into_profiles(rows: Vec<ProfileRow>) -> Result<Vec<ProgramProfile>, DomainError> {
    rows.into_iter().map(ProgramProfile::try_from).collect()
}

const PROFILE_COLUMNS: &str = "id, person_id, program, status, graduation_status, \
     payment_frequency, billing_type, family_reference_id, created_at";

#[async_trait]
impl EnrollmentReader for PostgresEnrollmentReader {
    async fn find_persons_by_contact(
        &self,
        query: &ContactQuery,
    ) -> Result<Vec<Person>, DomainError> {
        let rows: Vec<PersonRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT p.id, p.display_name, p.date_of_birth
            FROM persons p
            JOIN contact_points c ON c.person_id = p.id
            WHERE ($1::TEXT IS NOT NULL AND c.kind = 'email' AND c.value = $1)
               OR ($2::TEXT IS NOT NULL AND c.kind IN ('phone', 'whatsapp') AND c.value = $2)
            ORDER BY p.id
            "#,
        )
        .bind(query.email().map(|e| e.as_str()))
        .bind(query.phone().map(|p| p.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find persons by contact: {}", e)))?;

        Ok(rows.into_iter().map(Person::from).collect())
    }

    async fn find_profiles_by_person_and_program(
        &self,
        person_id: PersonId,
        program: &ProgramCode,
    ) -> Result<Vec<ProgramProfile>, DomainError> {
        let sql = format!(
            "SELECT {} FROM program_profiles WHERE person_id = $1 AND program = $2 ORDER BY id",
            PROFILE_COLUMNS
        );
        let rows: Vec<ProfileRow> = sqlx::query_as(&sql)
            .bind(person_id.as_uuid())
            .bind(program.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find profiles: {}", e)))?;

        into_profiles(rows)
    }

    async fn find_profiles_by_family(
        &self,
        family_reference_id: &str,
        program: &ProgramCode,
    ) -> Result<Vec<ProgramProfile>, DomainError> {
        let sql = format!(
            "SELECT {} FROM program_profiles \
             WHERE family_reference_id = $1 AND program = $2 ORDER BY id",
            PROFILE_COLUMNS
        );
        let rows: Vec<ProfileRow> = sqlx::query_as(&sql)
            .bind(family_reference_id)
            .bind(program.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find family profiles: {}", e)))?;

        into_profiles(rows)
    }
}
