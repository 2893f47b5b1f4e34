pub mod person;

pub use person::{bumped_updated_at, now_millis, parse_person_id, Person};
