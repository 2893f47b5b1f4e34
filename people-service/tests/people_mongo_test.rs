//! End-to-end tests against a live MongoDB.
//!
//! Run with `cargo test -- --ignored` and `MONGODB_TEST_URI` pointing at a
//! server (defaults to `mongodb://localhost:27017`).

mod common;

use common::TestApp;
use mongodb::bson::{doc, oid::ObjectId};
use people_service::dtos::PersonResponse;
use people_service::services::ConnectionState;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
#[ignore = "Requires MongoDB at MONGODB_TEST_URI"]
async fn person_lifecycle_against_mongo() {
    let app = TestApp::spawn_mongo().await;
    let client = Client::new();

    // Create
    let response = client
        .post(app.url("/people"))
        .json(&json!({ "name": "Ada", "title": "Engineer" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let ada: PersonResponse = response.json().await.expect("Failed to parse JSON");
    assert_eq!(ada.name.as_deref(), Some("Ada"));
    assert_eq!(ada.image, None);
    assert_eq!(ada.created_at, ada.updated_at);

    // Stored document uses the collection's field names
    let mongo = app.mongo.as_ref().expect("mongo backend");
    let id = ObjectId::parse_str(&ada.id).unwrap();
    let stored = mongo
        .database()
        .collection::<mongodb::bson::Document>("people")
        .find_one(doc! { "_id": id }, None)
        .await
        .unwrap()
        .expect("Person not found in DB");
    assert_eq!(stored.get_str("title").unwrap(), "Engineer");
    assert!(stored.get_datetime("createdAt").is_ok());
    assert!(!stored.contains_key("image"));

    // List
    let people: Vec<PersonResponse> = client
        .get(app.url("/people"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(people, vec![ada.clone()]);

    // Update
    let updated: PersonResponse = client
        .put(app.url(&format!("/people/{}", ada.id)))
        .json(&json!({ "title": "Lead Engineer" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.id, ada.id);
    assert_eq!(updated.created_at, ada.created_at);
    assert!(updated.updated_at >= ada.updated_at);
    assert_eq!(updated.name.as_deref(), Some("Ada"));
    assert_eq!(updated.title.as_deref(), Some("Lead Engineer"));

    // Delete twice
    let response = client
        .delete(app.url(&format!("/people/{}", ada.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let removed: PersonResponse = response.json().await.unwrap();
    assert_eq!(removed, updated);

    let response = client
        .delete(app.url(&format!("/people/{}", ada.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, Value::Null);

    let people: Vec<PersonResponse> = client
        .get(app.url("/people"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(people.is_empty());

    assert_eq!(mongo.connection_state(), ConnectionState::Open);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires MongoDB at MONGODB_TEST_URI"]
async fn update_of_missing_person_returns_null() {
    let app = TestApp::spawn_mongo().await;

    let response = Client::new()
        .put(app.url(&format!("/people/{}", ObjectId::new().to_hex())))
        .json(&json!({ "name": "Nobody" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, Value::Null);

    app.cleanup().await;
}

#[tokio::test]
async fn unreachable_store_fails_startup() {
    use people_service::config::{StoreBackend, StoreConfig};
    use people_service::services::MongoPeopleStore;

    let config = StoreConfig {
        backend: StoreBackend::Mongo,
        uri: Some("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200".to_string()),
        database: None,
        collection: "people".to_string(),
    };

    assert!(MongoPeopleStore::connect(&config).await.is_err());
}
