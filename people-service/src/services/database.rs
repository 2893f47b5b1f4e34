use crate::config::{StoreConfig, DEFAULT_DATABASE};
use crate::dtos::{FieldUpdate, PersonInput};
use crate::models::{now_millis, Person};
use crate::services::{ConnectionMonitor, ConnectionState, PeopleError, PeopleStore};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document},
    event::sdam::SdamEventHandler,
    options::{ClientOptions, FindOneAndUpdateOptions, ReturnDocument},
    Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;
use std::sync::Arc;

/// People store backed by one MongoDB collection.
#[derive(Clone)]
pub struct MongoPeopleStore {
    client: MongoClient,
    db: Database,
    collection: String,
    monitor: Arc<ConnectionMonitor>,
}

impl MongoPeopleStore {
    /// Builds the client and pings the server. An unreachable server is a
    /// startup failure; later outages only surface as connection events.
    pub async fn connect(config: &StoreConfig) -> Result<Self, AppError> {
        let uri = config.uri.as_deref().ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required but not set"))
        })?;

        tracing::info!("Connecting to MongoDB");
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Invalid MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.app_name = Some("people-service".to_string());

        let monitor = Arc::new(ConnectionMonitor::default());
        options.sdam_event_handler = Some(monitor.clone() as Arc<dyn SdamEventHandler>);

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to build MongoDB client: {}", e);
            AppError::from(e)
        })?;

        let db = match &config.database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        let store = Self {
            client,
            db,
            collection: config.collection.clone(),
            monitor,
        };

        store.ping().await.map_err(|e| {
            tracing::error!("Failed to reach MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        tracing::info!(
            database = %store.db.name(),
            collection = %store.collection,
            "Successfully connected to MongoDB database"
        );
        Ok(store)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn people(&self) -> Collection<Person> {
        self.db.collection(&self.collection)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.monitor.state()
    }

    async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

/// Pipeline update: `$set` for provided values, `$unset` for explicit nulls,
/// and `updatedAt` bumped to `max(now, createdAt)` on the server, matching
/// [`crate::models::bumped_updated_at`].
fn update_pipeline(changes: &PersonInput, now: BsonDateTime) -> Vec<Document> {
    let mut set = Document::new();
    let mut unset: Vec<&str> = Vec::new();

    for (field, update) in changes.fields() {
        match update {
            FieldUpdate::Unchanged => {}
            FieldUpdate::Clear => unset.push(field),
            FieldUpdate::Set(value) => {
                // $literal keeps values like "$name" from reading as field paths
                set.insert(field, doc! { "$literal": value.as_str() });
            }
        }
    }
    set.insert("updatedAt", doc! { "$max": [now, "$createdAt"] });

    let mut pipeline = vec![doc! { "$set": set }];
    if !unset.is_empty() {
        pipeline.push(doc! { "$unset": unset });
    }
    pipeline
}

#[async_trait]
impl PeopleStore for MongoPeopleStore {
    async fn create(&self, input: PersonInput) -> Result<Person, PeopleError> {
        let person = Person::new(input);
        self.people()
            .insert_one(&person, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert person: {}", e);
                PeopleError::from(e)
            })?;

        tracing::info!(person_id = %person.id, "Person created");
        Ok(person)
    }

    async fn list_all(&self) -> Result<Vec<Person>, PeopleError> {
        let cursor = self.people().find(doc! {}, None).await.map_err(|e| {
            tracing::error!("Failed to query people: {}", e);
            PeopleError::from(e)
        })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to read people cursor: {}", e);
            PeopleError::from(e)
        })
    }

    async fn update_by_id(
        &self,
        id: ObjectId,
        changes: PersonInput,
    ) -> Result<Option<Person>, PeopleError> {
        let update = update_pipeline(&changes, BsonDateTime::from_chrono(now_millis()));
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .people()
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await
            .map_err(|e| {
                tracing::error!(person_id = %id, "Failed to update person: {}", e);
                PeopleError::from(e)
            })?;

        tracing::info!(person_id = %id, found = updated.is_some(), "Person update applied");
        Ok(updated)
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<Person>, PeopleError> {
        let removed = self
            .people()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(person_id = %id, "Failed to delete person: {}", e);
                PeopleError::from(e)
            })?;

        tracing::info!(person_id = %id, found = removed.is_some(), "Person delete applied");
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), PeopleError> {
        self.ping().await.map_err(|e| {
            tracing::error!("MongoDB health check failed: {}", e);
            PeopleError::from(e)
        })
    }

    async fn shutdown(&self) {
        tracing::info!("Closing MongoDB connection");
        self.client.clone().shutdown().await;
    }
}
