pub mod cached_client;
pub mod client;
pub mod query;
pub mod types;
