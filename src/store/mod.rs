//! Persistence layer: the agent system of record.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlAgentStore;
pub use memory::MockAgentStore;
pub use traits::{Agent, AgentStore, CreateAgentRequest, UpdateAgentRequest};
