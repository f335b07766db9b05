mod message;
mod session;
mod tool;

pub use message::{ModelMessage, ModelRequest, ModelResponse, RequestPart, ResponsePart};
pub use session::{Message, Role, Transcript};
pub use tool::{FunctionCall, ToolCall};
