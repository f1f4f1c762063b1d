mod auth;
mod backend;
mod client;
