//! In-memory enrollment records for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::contact::ContactQuery;
use crate::domain::enrollment::{ContactPoint, Person, ProgramProfile};
use crate::domain::foundation::{DomainError, PersonId, ProgramCode, ProgramProfileId};
use crate::ports::EnrollmentReader;

#[derive(Default)]
struct EnrollmentState {
    persons: HashMap<PersonId, Person>,
    contacts: Vec<ContactPoint>,
    profiles: HashMap<ProgramProfileId, ProgramProfile>,
}

/// Enrollment reader backed by in-process maps.
#[derive(Default)]
pub struct InMemoryEnrollmentStore {
    state: RwLock<EnrollmentState>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_person(&self, person: Person) {
        self.state.write().await.persons.insert(person.id, person);
    }

    pub async fn add_contact(&self, contact: ContactPoint) {
        self.state.write().await.contacts.push(contact);
    }

    pub async fn add_profile(&self, profile: ProgramProfile) {
        self.state.write().await.profiles.insert(profile.id, profile);
    }
}

fn sorted(mut profiles: Vec<ProgramProfile>) -> Vec<ProgramProfile> {
    profiles.sort_by_key(|p| p.id);
    profiles
}

#[async_trait]
impl EnrollmentReader for InMemoryEnrollmentStore {
    async fn find_persons_by_contact(
        &self,
        query: &ContactQuery,
    ) -> Result<Vec<Person>, DomainError> {
        let state = self.state.read().await;
        let mut ids: Vec<PersonId> = state
            .contacts
            .iter()
            .filter(|c| {
                query.email().is_some_and(|e| c.matches_email(e))
                    || query.phone().is_some_and(|p| c.matches_phone(p))
            })
            .map(|c| c.person_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.persons.get(&id).cloned())
            .collect())
    }

    async fn find_profiles_by_person_and_program(
        &self,
        person_id: PersonId,
        program: &ProgramCode,
    ) -> Result<Vec<ProgramProfile>, DomainError> {
        let state = self.state.read().await;
        Ok(sorted(
            state
                .profiles
                .values()
                .filter(|p| p.person_id == person_id && p.is_in_program(program))
                .cloned()
                .collect(),
        ))
    }

    async fn find_profiles_by_family(
        &self,
        family_reference_id: &str,
        program: &ProgramCode,
    ) -> Result<Vec<ProgramProfile>, DomainError> {
        let state = self.state.read().await;
        Ok(sorted(
            state
                .profiles
                .values()
                .filter(|p| {
                    p.family_reference_id.as_deref() == Some(family_reference_id)
                        && p.is_in_program(program)
                })
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contact::{NormalizedEmail, NormalizedPhone};
    use crate::domain::enrollment::ContactKind;

    #[tokio::test]
    async fn phone_query_matches_whatsapp_contacts() {
        let store = InMemoryEnrollmentStore::new();
        let person = Person::new("Hodan");
        let phone = NormalizedPhone::parse("+1 612 555 0101").unwrap();
        let mut contact = ContactPoint::phone(person.id, &phone, true);
        contact.kind = ContactKind::Whatsapp;
        store.add_person(person.clone()).await;
        store.add_contact(contact).await;

        let found = store
            .find_persons_by_contact(&ContactQuery::by_phone(phone))
            .await
            .unwrap();

        assert_eq!(found, vec![person]);
    }

    #[tokio::test]
    async fn email_query_does_not_match_phone_contacts() {
        let store = InMemoryEnrollmentStore::new();
        let person = Person::new("Hodan");
        store.add_person(person.clone()).await;
        store
            .add_contact(ContactPoint::phone(
                person.id,
                &NormalizedPhone::parse("6125550101").unwrap(),
                true,
            ))
            .await;

        let found = store
            .find_persons_by_contact(&ContactQuery::by_email(
                NormalizedEmail::parse("hodan@example.com").unwrap(),
            ))
            .await
            .unwrap();

        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn family_lookup_is_scoped_to_program() {
        let store = InMemoryEnrollmentStore::new();
        let mahad = ProgramCode::new("MAHAD").unwrap();
        let dugsi = ProgramCode::new("DUGSI").unwrap();
        let a = ProgramProfile::register(PersonId::new(), mahad.clone()).with_family("fam-1");
        let b = ProgramProfile::register(PersonId::new(), dugsi).with_family("fam-1");
        store.add_profile(a.clone()).await;
        store.add_profile(b).await;

        let found = store.find_profiles_by_family("fam-1", &mahad).await.unwrap();

        assert_eq!(found, vec![a]);
    }
}
