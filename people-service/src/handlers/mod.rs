pub mod health;
pub mod people;

pub use health::{health_check, index, metrics_endpoint};
pub use people::{create_person, delete_person, list_people, update_person};
