use crate::models::Person;
use crate::services::PeopleError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a request body says about one text field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Key not present: leave the stored value alone.
    #[default]
    Unchanged,
    /// Explicit `null`: remove the stored value.
    Clear,
    Set(String),
}

impl FieldUpdate {
    pub fn into_value(self) -> Option<String> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Unchanged | FieldUpdate::Clear => None,
        }
    }
}

/// Typed body for create and update requests.
///
/// Text fields accept strings, and coerce numbers and booleans to their text
/// form. Objects and arrays are rejected. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonInput {
    pub name: FieldUpdate,
    pub image: FieldUpdate,
    pub title: FieldUpdate,
}

impl PersonInput {
    /// Parses a raw body. An empty body is an empty object.
    pub fn from_slice(body: &[u8]) -> Result<Self, PeopleError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PeopleError::Validation(format!("Malformed JSON body: {}", e)))?;
        Self::try_from(value)
    }

    /// Field name paired with its update, in schema order.
    pub fn fields(&self) -> [(&'static str, &FieldUpdate); 3] {
        [
            ("name", &self.name),
            ("image", &self.image),
            ("title", &self.title),
        ]
    }
}

impl TryFrom<Value> for PersonInput {
    type Error = PeopleError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(PeopleError::Validation(format!(
                    "Request body must be a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };

        Ok(Self {
            name: take_text(&mut object, "name")?,
            image: take_text(&mut object, "image")?,
            title: take_text(&mut object, "title")?,
        })
    }
}

fn take_text(object: &mut Map<String, Value>, field: &str) -> Result<FieldUpdate, PeopleError> {
    match object.remove(field) {
        None => Ok(FieldUpdate::Unchanged),
        Some(Value::Null) => Ok(FieldUpdate::Clear),
        Some(Value::String(s)) => Ok(FieldUpdate::Set(s)),
        Some(Value::Number(n)) => Ok(FieldUpdate::Set(n.to_string())),
        Some(Value::Bool(b)) => Ok(FieldUpdate::Set(b.to_string())),
        Some(other) => Err(PeopleError::Validation(format!(
            "Cast to string failed for {} at path \"{}\"",
            json_type(&other),
            field
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl<S> FromRequest<S> for PersonInput
where
    S: Send + Sync,
{
    type Rejection = PeopleError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| PeopleError::Validation(format!("Failed to read request body: {}", e)))?;
        Self::from_slice(&body)
    }
}

/// Wire form of a person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonResponse {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Person> for PersonResponse {
    fn from(person: Person) -> Self {
        Self {
            id: person.id.to_hex(),
            name: person.name,
            image: person.image,
            title: person.title,
            created_at: person.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: person.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
