//! Agent Studio: guided agent-creation wizard and agent store.

pub mod config;
pub mod error;
pub mod store;
pub mod wizard;
