use crate::index::FaqIndex;
use serde_json::Value;

pub const SEARCH_TOOL: &str = "search";

pub fn handle_search(index: &FaqIndex, args: &Value, max_results: usize) -> Result<Value, String> {
    let query = args
        .get("query")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing required argument: query".to_string())?;

    let hits = index.search(query, max_results);
    serde_json::to_value(hits).map_err(|e| format!("Failed to encode search results: {}", e))
}
