pub mod rest_handlers;

pub use rest_handlers::{call_tool_handler, health_handler, list_tools_handler};
