pub mod highlight;
pub mod output;

pub use highlight::CodeBuffer;
pub use output::{display_content, display_header, TerminalView};
