//! Shared test helpers: scripted providers, stub tools, an offline memory layer.

use async_trait::async_trait;
use quartermaster_core::error::{ProviderError, ToolError};
use quartermaster_core::message::{Message, MessageToolCall};
use quartermaster_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use quartermaster_core::tool::{Tool, ToolResult};
use quartermaster_memory::{FactExtractor, HashEmbedder, InMemoryVectorStore, MemoryLayer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next result in the queue and records
/// the request. Panics if more calls are made than results provided.
pub struct SequentialMockProvider {
    results: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// A provider that first returns tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls, thought),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let results = self.results.lock().unwrap();
        let call = requests.len();

        if call >= results.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                call,
                results.len()
            );
        }

        requests.push(request);
        results[call].clone()
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response carrying tool calls plus optional thought text.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut message = Message::assistant(thought);
    message.tool_calls = tool_calls;
    ProviderResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a tool call with id `call_{name}`.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// Shared execution counter handed out with a [`StubTool`].
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A tool that always answers with a fixed output.
pub struct StubTool {
    name: &'static str,
    output: String,
    calls: CallCounter,
}

impl StubTool {
    pub fn new(name: &'static str, output: &str) -> (Self, CallCounter) {
        let calls = CallCounter::default();
        let tool = Self {
            name,
            output: output.to_string(),
            calls: calls.clone(),
        };
        (tool, calls)
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Stub tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::ok(self.output.clone()))
    }
}

/// Extraction model that stores the quoted input as the fact.
pub struct EchoExtractor;

#[async_trait]
impl Provider for EchoExtractor {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = &request.messages[0].content;
        let start = prompt.find("Input: \"").map(|i| i + 8).unwrap_or(0);
        let end = prompt.rfind("\"\n").unwrap_or(prompt.len());
        Ok(make_text_response(&prompt[start..end]))
    }
}

/// Extraction model that is always down.
pub struct DownExtractor;

#[async_trait]
impl Provider for DownExtractor {
    fn name(&self) -> &str {
        "down"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// A memory layer over an in-memory store with offline embeddings.
pub fn echo_memory() -> Arc<MemoryLayer> {
    memory_with(Arc::new(EchoExtractor))
}

pub fn memory_with(extractor: Arc<dyn Provider>) -> Arc<MemoryLayer> {
    Arc::new(MemoryLayer::new(
        FactExtractor::new(extractor, "echo"),
        Arc::new(HashEmbedder::new(128)),
        Arc::new(InMemoryVectorStore::new()),
    ))
}
