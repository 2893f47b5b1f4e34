#![allow(dead_code)]

use people_service::config::{PeopleConfig, StoreBackend, StoreConfig, DEFAULT_COLLECTION};
use people_service::services::{MongoPeopleStore, PeopleStore};
use people_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn PeopleStore>,
    pub mongo: Option<MongoPeopleStore>,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<std::io::Result<()>>,
}

fn config(backend: StoreBackend, uri: Option<String>, database: Option<String>) -> PeopleConfig {
    PeopleConfig {
        common: CoreConfig { port: 0 }, // Random port for testing
        store: StoreConfig {
            backend,
            uri,
            database,
            collection: DEFAULT_COLLECTION.to_string(),
        },
    }
}

impl TestApp {
    /// Spawn the full server over the in-memory store.
    pub async fn spawn_in_memory() -> Self {
        let app = Application::build(config(StoreBackend::Memory, None, None))
            .await
            .expect("Failed to build test application");
        Self::start(app, None).await
    }

    /// Spawn the full server against a throwaway MongoDB database.
    pub async fn spawn_mongo() -> Self {
        let uri = std::env::var("MONGODB_TEST_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = format!("people_test_{}", Uuid::new_v4().simple());
        let config = config(StoreBackend::Mongo, Some(uri), Some(db_name));

        let mongo = MongoPeopleStore::connect(&config.store)
            .await
            .expect("Failed to connect to MongoDB");
        let app = Application::with_store(&config, Arc::new(mongo.clone()))
            .await
            .expect("Failed to build test application");
        Self::start(app, Some(mongo)).await
    }

    async fn start(app: Application, mongo: Option<MongoPeopleStore>) -> Self {
        let port = app.port();
        let store = app.store();
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(app.run_with_shutdown(async {
            let _ = rx.await;
        }));

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let address = format!("http://127.0.0.1:{}", port);
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            store,
            mongo,
            shutdown: Some(tx),
            server,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Stop the server, drop any test database, and wait for teardown.
    pub async fn cleanup(mut self) {
        if let Some(mongo) = &self.mongo {
            let _ = mongo.database().drop(None).await;
        }
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.server).await;
    }
}
