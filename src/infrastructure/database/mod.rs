pub mod mappers;
pub mod rows;
pub mod schema;
pub mod sqlite_store;

pub use schema::initialize_schema;
pub use sqlite_store::SqliteSyncStore;
