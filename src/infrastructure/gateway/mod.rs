//! Protocol gateway: uniform, contained dispatch to tool providers.

pub mod bindings;
pub mod dispatcher;
pub mod types;

pub use bindings::{register_standard_tools, GatewayClient};
pub use dispatcher::{ProtocolGateway, ToolProvider};
pub use types::{tool_names, ToolCallRequest, ToolCallResult, ToolFailure};
