//! Named tool servers (`prisma`, `apikey`, `sandbox`) and their dispatch

pub mod catalog;
pub mod client;
pub mod handlers;
pub mod prisma;

pub use catalog::{ServerInfo, ToolInfo, ToolServer, list_servers, search_tools};
pub use client::ToolClient;
pub use prisma::FormState;
