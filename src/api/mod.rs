pub mod api_types;
pub mod client;
pub mod service;
pub mod types;
