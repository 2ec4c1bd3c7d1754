//! EnrollmentReader port - read access to persons, contacts and enrollments.
//!
//! The registration side of the school owns these records. Reconciliation
//! only reads them, so the port has no write methods.

use async_trait::async_trait;

use crate::domain::contact::ContactQuery;
use crate::domain::enrollment::{Person, ProgramProfile};
use crate::domain::foundation::{DomainError, PersonId, ProgramCode};

/// Read port over identity and enrollment records.
#[async_trait]
pub trait EnrollmentReader: Send + Sync {
    /// Persons owning a contact point equal to the query.
    ///
    /// Email queries match email contact points; phone queries match phone
    /// and whatsapp contact points. Values are compared in normalized form.
    /// Several persons may share one contact (siblings, parents).
    async fn find_persons_by_contact(&self, query: &ContactQuery)
        -> Result<Vec<Person>, DomainError>;

    /// Profiles of one person in one program.
    async fn find_profiles_by_person_and_program(
        &self,
        person_id: PersonId,
        program: &ProgramCode,
    ) -> Result<Vec<ProgramProfile>, DomainError>;

    /// Profiles in one program sharing a family reference.
    async fn find_profiles_by_family(
        &self,
        family_reference_id: &str,
        program: &ProgramCode,
    ) -> Result<Vec<ProgramProfile>, DomainError>;
}
