//! The agent runtime: a bounded tool loop over a chat provider.

use std::sync::Arc;
use quartermaster_core::event::{DomainEvent, EventBus};
use quartermaster_core::message::Message;
use quartermaster_core::provider::{Provider, ProviderRequest};
use quartermaster_core::tool::{ToolCall, ToolRegistry};
use quartermaster_tools::{CONSULT_MEMORY, SEARCH_VENDORS};
use tracing::{debug, info, warn};
use crate::stream_event::{collect_text, AgentEvent};

/// Default maximum model calls per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Final text when the model keeps calling tools past the iteration limit.
pub const MAX_ITERATIONS_REPLY: &str =
    "I've reached the maximum number of tool call iterations. Please provide further guidance.";

/// Tool result sent back when vendors are searched before memory was consulted.
pub const TOOL_ORDER_REFUSAL: &str = "Error: search_vendors was not run. Call consult_memory first \
to check site rules (budget limits, banned vendors), then search vendors again.";

/// Everything one run produced.
#[derive(Debug, Clone, Default)]
pub struct AgentRun {
    pub events: Vec<AgentEvent>,
    /// Model calls made
    pub iterations: usize,
    pub tool_calls_made: usize,
}

impl AgentRun {
    /// The run's text, as the decision parser sees it.
    pub fn text(&self) -> String {
        collect_text(&self.events)
    }
}

/// Orchestrates model calls and tool execution for one procurement turn.
pub struct AgentRuntime {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: usize,
    enforce_tool_order: bool,
    event_bus: Arc<EventBus>,
}

impl AgentRuntime {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            tools,
            system_prompt: system_prompt.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            enforce_tool_order: true,
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Refuse `search_vendors` until `consult_memory` has run in the same turn.
    pub fn with_tool_order_enforced(mut self, enforce: bool) -> Self {
        self.enforce_tool_order = enforce;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run the agent on `user_input`, with `history` as earlier turns.
    ///
    /// Loops until the model answers without tool calls or the iteration
    /// limit is hit. Tool failures are fed back to the model; provider
    /// failures abort the run.
    pub async fn run(
        &self,
        history: &[Message],
        user_input: &str,
    ) -> Result<AgentRun, quartermaster_core::Error> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(user_input));

        info!(model = %self.model, history = history.len(), "Running agent");

        let tool_definitions = self.tools.definitions();
        let mut run = AgentRun::default();
        let mut memory_consulted = false;

        while run.iterations < self.max_iterations {
            run.iterations += 1;
            debug!(iteration = run.iterations, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if response.message.tool_calls.is_empty() {
                run.events.push(AgentEvent::Final {
                    content: response.message.content,
                });
                return Ok(run);
            }

            if !response.message.content.is_empty() {
                run.events.push(AgentEvent::TextDelta {
                    content: response.message.content.clone(),
                });
            }

            let tool_calls = response.message.tool_calls.clone();
            messages.push(response.message);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };
                run.tool_calls_made += 1;
                run.events.push(AgentEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                });

                if self.enforce_tool_order && call.name == SEARCH_VENDORS && !memory_consulted {
                    warn!("search_vendors called before consult_memory, refusing");
                    self.record_result(&mut run, &mut messages, &call, TOOL_ORDER_REFUSAL.into(), false);
                    continue;
                }

                let start = std::time::Instant::now();
                let result = self.tools.execute(&call).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                let (output, success) = match result {
                    Ok(tool_result) => (tool_result.output, tool_result.success),
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "Tool execution failed");
                        (format!("Error: {e}"), false)
                    }
                };

                if call.name == CONSULT_MEMORY {
                    memory_consulted = true;
                }

                self.event_bus.publish(DomainEvent::ToolExecuted {
                    tool_name: call.name.clone(),
                    success,
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });
                self.record_result(&mut run, &mut messages, &call, output, success);
            }
        }

        warn!(iterations = run.iterations, "Max tool iterations reached, forcing text response");
        run.events.push(AgentEvent::Final {
            content: MAX_ITERATIONS_REPLY.into(),
        });
        Ok(run)
    }

    fn record_result(
        &self,
        run: &mut AgentRun,
        messages: &mut Vec<Message>,
        call: &ToolCall,
        output: String,
        success: bool,
    ) {
        messages.push(Message::tool_result(&call.id, &output));
        run.events.push(AgentEvent::ToolResult {
            id: call.id.clone(),
            name: call.name.clone(),
            output,
            success,
        });
    }
}
