mod registry;
mod search;

pub use registry::{format_tools_for_llm, RegisteredTool, ToolHandler, ToolRegistry};
pub use search::{handle_search, SEARCH_TOOL};
