pub mod auth;
pub mod connectivity;
pub mod handler;
pub mod remote;
pub mod sync_store;
