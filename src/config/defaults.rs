pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_AGENT_NAME: &str = "faq_agent";
pub const DEFAULT_FAQ_DIRECTORY: &str = "faq";
pub const DEFAULT_FILTER: &str = "data-engineering";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for a course.

Use the search tool to find relevant information from the course FAQ before answering questions.

If you can find specific information through search, use it to provide accurate answers.
If the search doesn't return relevant results, let the user know and provide general guidance.";

pub fn default_stream_timeout() -> u64 {
    30
}

pub fn default_debounce_ms() -> u64 {
    10
}

pub fn default_max_results() -> usize {
    crate::index::DEFAULT_MAX_RESULTS
}
