pub mod database;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod store;

pub use database::MongoPeopleStore;
pub use error::PeopleError;
pub use metrics::{get_metrics, init_metrics};
pub use monitor::{ConnectionEvent, ConnectionMonitor, ConnectionState};
pub use store::{InMemoryPeopleStore, PeopleStore};
