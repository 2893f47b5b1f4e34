use crate::dtos::{FieldUpdate, PersonInput};
use crate::services::PeopleError;
use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A stored person document.
///
/// Timestamps are kept at millisecond precision so the in-process value always
/// equals what a BSON datetime round trip yields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "createdAt",
        with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "updatedAt",
        with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub updated_at: DateTime<Utc>,
}

impl Person {
    /// Builds a new record with a fresh id and equal timestamps. Explicit
    /// `null` fields are simply left absent.
    pub fn new(input: PersonInput) -> Self {
        let now = now_millis();
        Self {
            id: ObjectId::new(),
            name: input.name.into_value(),
            image: input.image.into_value(),
            title: input.title.into_value(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `changes` into the record and bumps `updated_at`.
    pub fn apply(&mut self, changes: PersonInput, now: DateTime<Utc>) {
        merge(&mut self.name, changes.name);
        merge(&mut self.image, changes.image);
        merge(&mut self.title, changes.title);
        self.updated_at = bumped_updated_at(now, self.created_at);
    }
}

/// `updatedAt` after an update: the current time, never earlier than
/// `createdAt`. Both store backends follow this rule.
pub fn bumped_updated_at(now: DateTime<Utc>, created_at: DateTime<Utc>) -> DateTime<Utc> {
    now.max(created_at)
}

fn merge(slot: &mut Option<String>, update: FieldUpdate) {
    match update {
        FieldUpdate::Unchanged => {}
        FieldUpdate::Clear => *slot = None,
        FieldUpdate::Set(value) => *slot = Some(value),
    }
}

/// Current time truncated to what a BSON datetime can hold.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn parse_person_id(raw: &str) -> Result<ObjectId, PeopleError> {
    ObjectId::parse_str(raw).map_err(|_| {
        PeopleError::Validation(format!(
            "Cast to ObjectId failed for value \"{}\" at path \"_id\"",
            raw
        ))
    })
}
