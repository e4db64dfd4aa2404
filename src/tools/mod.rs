//! Tool System - fixed tool identities, definitions, and routing

mod definition;
mod router;

pub use definition::{Tool, ToolId, query_schema};
pub use router::{AgentToolRouter, ToolRouter};
