pub mod auth;
pub mod config;
pub mod gmail;
pub mod mail;
pub mod pipeline;
pub mod query;
pub mod store;
