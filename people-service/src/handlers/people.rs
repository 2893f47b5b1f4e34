use crate::dtos::{PersonInput, PersonResponse};
use crate::models::parse_person_id;
use crate::services::PeopleError;
use crate::startup::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use mongodb::bson::oid::ObjectId;

/// Path ids that fail to decode get the same JSON error body as bad ObjectIds.
fn person_id(raw: Result<Path<String>, PathRejection>) -> Result<ObjectId, PeopleError> {
    let Path(raw) = raw.map_err(|e| PeopleError::Validation(e.body_text()))?;
    parse_person_id(&raw)
}

pub async fn list_people(
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonResponse>>, PeopleError> {
    let people = state.store.list_all().await?;
    tracing::debug!(count = people.len(), "Listed people");
    Ok(Json(people.into_iter().map(PersonResponse::from).collect()))
}

pub async fn create_person(
    State(state): State<AppState>,
    input: PersonInput,
) -> Result<Json<PersonResponse>, PeopleError> {
    let person = state.store.create(input).await?;
    Ok(Json(PersonResponse::from(person)))
}

/// Responds `null` when the id matches nothing.
pub async fn update_person(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    changes: PersonInput,
) -> Result<Json<Option<PersonResponse>>, PeopleError> {
    let id = person_id(id)?;
    let updated = state.store.update_by_id(id, changes).await?;
    Ok(Json(updated.map(PersonResponse::from)))
}

/// Responds `null` when the id matches nothing.
pub async fn delete_person(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Option<PersonResponse>>, PeopleError> {
    let id = person_id(id)?;
    let removed = state.store.delete_by_id(id).await?;
    Ok(Json(removed.map(PersonResponse::from)))
}
