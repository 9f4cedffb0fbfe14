pub mod memory;
pub mod models;
pub mod pool;
pub mod postgres;
pub mod queries;
pub mod seed;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use store::{RecordStore, StoreError, StoreResult};
