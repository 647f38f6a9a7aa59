//! Consult-memory tool: lets the agent look up remembered site rules.
//!
//! Bridges the tool system with the memory layer: budget limits, banned
//! vendors and site preferences the user taught earlier come back as a
//! bullet list the model can reason over.

use async_trait::async_trait;
use quartermaster_core::error::ToolError;
use quartermaster_core::tool::{Tool, ToolResult};
use quartermaster_memory::{MemoryLayer, DEFAULT_SEARCH_LIMIT};
use std::sync::Arc;
use tracing::warn;

/// Tool name as the model sees it.
pub const CONSULT_MEMORY: &str = "consult_memory";

/// Reply when nothing relevant is stored.
pub const NO_RULES_FOUND: &str = "No specific rules found in memory.";

/// Searches the memory layer and renders hits as `- fact` lines.
pub struct ConsultMemoryTool {
    memory: Arc<MemoryLayer>,
    limit: usize,
}

impl ConsultMemoryTool {
    pub fn new(memory: Arc<MemoryLayer>) -> Self {
        Self {
            memory,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Number of facts returned per lookup.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}

#[async_trait]
impl Tool for ConsultMemoryTool {
    fn name(&self) -> &str {
        CONSULT_MEMORY
    }

    fn description(&self) -> &str {
        "Find site-specific rules, banned vendors, or spending limits remembered from earlier \
         conversations. Input: a search query (e.g. 'rules for Mumbai site'). \
         Output: a list of relevant facts."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look up, e.g. 'budget limit for Mumbai site'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        match self.memory.search(query, self.limit).await {
            Ok(hits) if hits.is_empty() => Ok(ToolResult::ok(NO_RULES_FOUND)),
            Ok(hits) => {
                let output = hits
                    .iter()
                    .map(|h| format!("- {}", h.fact))
                    .collect::<Vec<_>>()
                    .join("\n");
                let facts: Vec<&str> = hits.iter().map(|h| h.fact.as_str()).collect();
                Ok(ToolResult::ok(output).with_data(serde_json::json!(facts)))
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Memory lookup failed");
                Ok(ToolResult {
                    call_id: String::new(),
                    success: false,
                    output: format!("Memory lookup failed: {e}"),
                    data: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::echo_memory;

    #[test]
    fn tool_definition() {
        let (memory, _) = echo_memory();
        let tool = ConsultMemoryTool::new(memory);
        assert_eq!(tool.name(), "consult_memory");
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], serde_json::json!(["query"]));
    }

    #[tokio::test]
    async fn empty_memory_says_so() {
        let (memory, _) = echo_memory();
        let tool = ConsultMemoryTool::new(memory);
        let result = tool
            .execute(serde_json::json!({"query": "rules for Mumbai site"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, NO_RULES_FOUND);
    }

    #[tokio::test]
    async fn renders_hits_as_bullets() {
        let (memory, _) = echo_memory();
        memory.add("Mumbai site budget limit is 50000", None).await.unwrap();
        memory.add("Never buy from ShadyBricks", None).await.unwrap();

        let tool = ConsultMemoryTool::new(memory).with_limit(1);
        let result = tool
            .execute(serde_json::json!({"query": "budget for Mumbai site"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "- Mumbai site budget limit is 50000");
        assert_eq!(result.data.unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_query_returns_error() {
        let (memory, _) = echo_memory();
        let tool = ConsultMemoryTool::new(memory);
        assert!(matches!(
            tool.execute(serde_json::json!({})).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
