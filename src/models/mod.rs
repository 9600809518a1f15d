pub mod result;
pub mod tool;

pub use result::ToolCallResult;
pub use tool::{JsonObject, ResultShape, TargetExtractor, ToolDescriptor, INSTANCE_ARGUMENT};
