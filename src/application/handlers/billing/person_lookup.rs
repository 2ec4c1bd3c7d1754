//! PersonLookup - resolves a contact to persons and their enrollments.

use std::sync::Arc;

use crate::domain::contact::ContactQuery;
use crate::domain::enrollment::{Person, ProgramProfile};
use crate::domain::foundation::{DomainError, ProgramCode};
use crate::ports::EnrollmentReader;

/// A person owning the queried contact, with their profiles in the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonEnrollments {
    pub person: Person,
    pub profiles: Vec<ProgramProfile>,
}

/// Contact-to-enrollment lookup.
///
/// Returns every person sharing the contact; picking among them is the
/// caller's job.
pub struct PersonLookup {
    reader: Arc<dyn EnrollmentReader>,
}

impl PersonLookup {
    pub fn new(reader: Arc<dyn EnrollmentReader>) -> Self {
        Self { reader }
    }

    pub async fn lookup(
        &self,
        query: &ContactQuery,
        program: &ProgramCode,
    ) -> Result<Vec<PersonEnrollments>, DomainError> {
        let mut persons = self.reader.find_persons_by_contact(query).await?;
        persons.sort_by_key(|p| p.id);
        persons.dedup_by_key(|p| p.id);

        let mut found = Vec::with_capacity(persons.len());
        for person in persons {
            let profiles = self
                .reader
                .find_profiles_by_person_and_program(person.id, program)
                .await?
                .into_iter()
                .filter(|p| p.is_in_program(program))
                .collect();
            found.push(PersonEnrollments { person, profiles });
        }
        Ok(found)
    }
}
