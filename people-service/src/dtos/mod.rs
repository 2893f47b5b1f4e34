pub mod person;

pub use person::{FieldUpdate, PersonInput, PersonResponse};
