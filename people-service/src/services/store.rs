use crate::dtos::PersonInput;
use crate::models::{now_millis, Person};
use crate::services::PeopleError;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persistence seam for the people routes.
///
/// Implementations own the connection; handlers only ever see this trait.
#[async_trait]
pub trait PeopleStore: Send + Sync {
    /// Inserts one record and returns it as stored.
    async fn create(&self, input: PersonInput) -> Result<Person, PeopleError>;

    /// Every record, in no particular order.
    async fn list_all(&self) -> Result<Vec<Person>, PeopleError>;

    /// Merges `changes` into the record and bumps `updatedAt`. `None` when no
    /// record has this id.
    async fn update_by_id(
        &self,
        id: ObjectId,
        changes: PersonInput,
    ) -> Result<Option<Person>, PeopleError>;

    /// Removes the record and returns it, or `None` when nothing matched.
    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<Person>, PeopleError>;

    async fn health_check(&self) -> Result<(), PeopleError>;

    /// Releases the connection. Called once, after the server has drained.
    async fn shutdown(&self);
}

/// Process-local store with the same semantics as the MongoDB one.
#[derive(Debug, Default)]
pub struct InMemoryPeopleStore {
    people: RwLock<HashMap<ObjectId, Person>>,
}

impl InMemoryPeopleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PeopleStore for InMemoryPeopleStore {
    async fn create(&self, input: PersonInput) -> Result<Person, PeopleError> {
        let person = Person::new(input);
        self.people.write().await.insert(person.id, person.clone());
        Ok(person)
    }

    async fn list_all(&self) -> Result<Vec<Person>, PeopleError> {
        Ok(self.people.read().await.values().cloned().collect())
    }

    async fn update_by_id(
        &self,
        id: ObjectId,
        changes: PersonInput,
    ) -> Result<Option<Person>, PeopleError> {
        let mut people = self.people.write().await;
        Ok(people.get_mut(&id).map(|person| {
            person.apply(changes, now_millis());
            person.clone()
        }))
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<Person>, PeopleError> {
        Ok(self.people.write().await.remove(&id))
    }

    async fn health_check(&self) -> Result<(), PeopleError> {
        Ok(())
    }

    async fn shutdown(&self) {
        let count = self.people.read().await.len();
        tracing::info!(records = count, "In-memory people store discarded");
    }
}
