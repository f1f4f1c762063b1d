pub mod auth;
pub mod backend;
pub mod client;
pub mod observability;
