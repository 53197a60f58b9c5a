pub mod collection;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod store;

pub use collection::Collection;
pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query_builder::{AdvancedQuery, Populate, QueryPage};
pub use repository::Repository;
pub use store::{Store, StoreError};
