//! The conversation state machine.
//!
//! ```text
//!            PROCUREMENT/CHAT, decision PAUSE_APPROVAL_NEEDED
//!   Idle ─────────────────────────────────────────────────▶ PendingApproval
//!    ▲                                                          │
//!    └──────────────── any reply (approve or cancel) ───────────┘
//! ```
//!
//! Every other turn leaves the state where it was. Errors never escape a
//! turn: they become an `Error: ...` reply.

use std::collections::HashMap;
use std::sync::Arc;
use chrono::Utc;
use quartermaster_config::AppConfig;
use quartermaster_core::event::{DomainEvent, EventBus};
use quartermaster_core::message::{SessionId, Transcript};
use quartermaster_core::procurement::{Decision, Intent, PendingOrder};
use quartermaster_core::provider::Provider;
use quartermaster_memory::MemoryLayer;
use quartermaster_tools::{procurement_registry, VendorCatalog};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use crate::decision::extract_decision;
use crate::intent::IntentClassifier;
use crate::prompts::agent_instruction;
use crate::runtime::AgentRuntime;
use crate::stream_event::AgentEvent;

pub const INGESTION_TRACE: &str = "Action: INGESTION via MemoryLayer";
pub const APPROVED_TRACE: &str = "User manually approved.";
pub const DENIED_TRACE: &str = "User denied.";

/// Past exchanges replayed to the agent when none is configured.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

/// Where a session is in the approval cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    PendingApproval(PendingOrder),
}

impl ConversationState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::PendingApproval(_) => Phase::PendingApproval,
        }
    }

    pub fn pending_order(&self) -> Option<&PendingOrder> {
        match self {
            Self::Idle => None,
            Self::PendingApproval(order) => Some(order),
        }
    }
}

/// [`ConversationState`] without its payload, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    PendingApproval,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("IDLE"),
            Self::PendingApproval => f.write_str("PENDING_APPROVAL"),
        }
    }
}

/// One user's conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub state: ConversationState,
    pub transcript: Transcript,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: ConversationState::Idle,
            transcript: Transcript::new(),
        }
    }
}

/// What one turn hands back to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub response: String,
    /// Live reasoning: action taken, tool traffic, raw agent text
    pub reasoning: String,
    pub intent: Intent,
    /// State after the turn
    pub state: Phase,
    /// Agent events, empty for turns that did not run the agent
    #[serde(skip)]
    pub events: Vec<AgentEvent>,
}

pub struct AgentOrchestrator {
    classifier: IntentClassifier,
    memory: Arc<MemoryLayer>,
    runtime: AgentRuntime,
    affirmative: Vec<String>,
    history_turns: usize,
    event_bus: Arc<EventBus>,
}

impl AgentOrchestrator {
    pub fn new(
        classifier: IntentClassifier,
        memory: Arc<MemoryLayer>,
        runtime: AgentRuntime,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            classifier,
            memory,
            runtime,
            affirmative: ["yes", "y", "approve", "ok"].map(String::from).to_vec(),
            history_turns: DEFAULT_HISTORY_TURNS,
            event_bus,
        }
    }

    /// Wire an orchestrator from configuration, one chat provider for
    /// classification and the agent.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        memory: Arc<MemoryLayer>,
        catalog: Arc<dyn VendorCatalog>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let llm = &config.llm;
        let tools = procurement_registry(memory.clone(), catalog, config.memory.search_limit);
        let runtime = AgentRuntime::new(
            provider.clone(),
            llm.wire_model(),
            Arc::new(tools),
            agent_instruction(),
            event_bus.clone(),
        )
        .with_temperature(llm.temperature)
        .with_max_tokens(llm.max_tokens)
        .with_max_iterations(config.agent.max_iterations)
        .with_tool_order_enforced(config.agent.enforce_tool_order);
        let classifier = IntentClassifier::new(provider, llm.wire_model());

        Self::new(classifier, memory, runtime, event_bus)
            .with_affirmative(config.approval.affirmative.clone())
            .with_history_turns(config.agent.history_turns)
    }

    /// How many past exchanges the agent sees. The session keeps the full transcript.
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// Replies that approve a pending order, matched trimmed and case-insensitively.
    pub fn with_affirmative(mut self, replies: Vec<String>) -> Self {
        self.affirmative = replies
            .into_iter()
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }

    pub fn is_affirmative(&self, reply: &str) -> bool {
        let reply = reply.trim().to_lowercase();
        self.affirmative.iter().any(|a| *a == reply)
    }

    pub fn memory(&self) -> &Arc<MemoryLayer> {
        &self.memory
    }

    /// Run one turn: classify, act, record it in the transcript.
    pub async fn handle_turn(&self, session: &mut Session, input: &str) -> TurnReply {
        let has_pending = session.state.pending_order().is_some();
        let classification = self.classifier.classify_detailed(input, has_pending).await;
        self.event_bus.publish(DomainEvent::IntentClassified {
            session_id: session.id.to_string(),
            intent: classification.intent,
            fell_back: classification.fell_back,
            timestamp: Utc::now(),
        });
        info!(session = %session.id, intent = %classification.intent, "Handling turn");

        let reply = match classification.intent {
            Intent::ApprovalReply => self.resolve_approval(session, input),
            Intent::StoreFact => self.learn(session, input).await,
            Intent::ProcurementRequest | Intent::Chat => {
                self.run_agent(session, input, classification.intent).await
            }
        };

        session.transcript.record_turn(input, &reply.response);
        reply
    }

    async fn learn(&self, session: &Session, input: &str) -> TurnReply {
        let (response, reasoning) = match self.memory.add(input, None).await {
            Ok(fact) => {
                self.event_bus.publish(DomainEvent::MemoryStored {
                    fact: fact.clone(),
                    timestamp: Utc::now(),
                });
                (format!("Learned: {fact}"), INGESTION_TRACE.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Failed to learn");
                self.publish_error("learn", &e.to_string());
                (
                    format!("Error: Failed to learn: {e}"),
                    format!("{INGESTION_TRACE} failed: {e}"),
                )
            }
        };

        TurnReply {
            response,
            reasoning,
            intent: Intent::StoreFact,
            state: session.state.phase(),
            events: Vec::new(),
        }
    }

    async fn run_agent(&self, session: &mut Session, input: &str, intent: Intent) -> TurnReply {
        let run = match self.runtime.run(session.transcript.recent(self.history_turns), input).await {
            Ok(run) => run,
            Err(e) => {
                warn!(session = %session.id, error = %e, "Agent run failed");
                self.publish_error("agent", &e.to_string());
                return TurnReply {
                    response: format!("Error: {e}"),
                    reasoning: e.to_string(),
                    intent,
                    state: session.state.phase(),
                    events: Vec::new(),
                };
            }
        };

        let text = run.text();
        let reasoning = reasoning_trace(&run.events, &text);

        let response = match extract_decision(&text) {
            Ok(decision) if decision.needs_approval() => {
                info!(vendor = %decision.selected_vendor, total_cost = decision.total_cost, "Order paused for approval");
                self.event_bus.publish(DomainEvent::OrderPaused {
                    session_id: session.id.to_string(),
                    vendor: decision.selected_vendor.clone(),
                    total_cost: decision.total_cost,
                    timestamp: Utc::now(),
                });
                let response = approval_request(&decision);
                session.state = ConversationState::PendingApproval(decision);
                response
            }
            Ok(decision) => {
                info!(vendor = %decision.selected_vendor, total_cost = decision.total_cost, "Order placed");
                order_placed(&decision)
            }
            Err(e) => {
                debug!(reason = %e, "No decision in agent output, returning raw text");
                text
            }
        };

        TurnReply {
            response,
            reasoning,
            intent,
            state: session.state.phase(),
            events: run.events,
        }
    }

    fn resolve_approval(&self, session: &mut Session, input: &str) -> TurnReply {
        let ConversationState::PendingApproval(order) = std::mem::take(&mut session.state) else {
            return TurnReply {
                response: "No order is waiting for approval.".into(),
                reasoning: String::new(),
                intent: Intent::ApprovalReply,
                state: Phase::Idle,
                events: Vec::new(),
            };
        };

        let approved = self.is_affirmative(input);
        self.event_bus.publish(DomainEvent::ApprovalResolved {
            session_id: session.id.to_string(),
            vendor: order.selected_vendor.clone(),
            approved,
            timestamp: Utc::now(),
        });
        info!(session = %session.id, vendor = %order.selected_vendor, approved, "Approval resolved");

        let (response, reasoning) = if approved {
            (
                format!("Order Confirmed.\nPlaced order with {}.", order.selected_vendor),
                APPROVED_TRACE,
            )
        } else {
            ("Order Cancelled.".to_string(), DENIED_TRACE)
        };

        TurnReply {
            response,
            reasoning: reasoning.into(),
            intent: Intent::ApprovalReply,
            state: session.state.phase(),
            events: Vec::new(),
        }
    }

    fn publish_error(&self, context: &str, message: &str) {
        self.event_bus.publish(DomainEvent::ErrorOccurred {
            context: context.into(),
            error_message: message.into(),
            timestamp: Utc::now(),
        });
    }
}

/// Reply asking the user to approve a paused order.
pub fn approval_request(decision: &Decision) -> String {
    format!(
        "Approval Required\nReason: {}\nCost: {}\nProceed? (y/n)",
        decision.reasoning, decision.total_cost
    )
}

/// Reply summarising an order the agent placed on its own.
pub fn order_placed(decision: &Decision) -> String {
    format!(
        "Order Placed\nVendor: {}\nCost: {}\nReason: {}",
        decision.selected_vendor, decision.total_cost, decision.reasoning
    )
}

/// Tool traffic followed by the agent's raw text.
fn reasoning_trace(events: &[AgentEvent], text: &str) -> String {
    let mut lines = Vec::new();
    for event in events {
        match event {
            AgentEvent::ToolCall { name, input, .. } => lines.push(format!("Tool call: {name} {input}")),
            AgentEvent::ToolResult { name, output, success, .. } => {
                let status = if *success { "ok" } else { "failed" };
                lines.push(format!("Tool result ({name}, {status}): {output}"));
            }
            AgentEvent::TextDelta { .. } | AgentEvent::Final { .. } => {}
        }
    }
    lines.push(format!("Agent Response:\n{text}"));
    lines.join("\n")
}

/// Isolated sessions over one shared orchestrator and memory collection.
///
/// Turns within a session serialize on the session's mutex; different
/// sessions run independently.
pub struct SessionManager {
    orchestrator: Arc<AgentOrchestrator>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new(orchestrator: Arc<AgentOrchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn orchestrator(&self) -> &Arc<AgentOrchestrator> {
        &self.orchestrator
    }

    /// Open a fresh session.
    pub async fn create(&self) -> SessionId {
        let id = SessionId::new();
        self.session(&id).await;
        id
    }

    /// Run one turn in session `id`, creating the session if needed.
    pub async fn handle(&self, id: &SessionId, input: &str) -> TurnReply {
        let session = self.session(id).await;
        let mut session = session.lock().await;
        self.orchestrator.handle_turn(&mut session, input).await
    }

    pub async fn pending_order(&self, id: &SessionId) -> Option<PendingOrder> {
        let session = self.sessions.read().await.get(id).cloned()?;
        let session = session.lock().await;
        session.state.pending_order().cloned()
    }

    pub async fn transcript(&self, id: &SessionId) -> Option<Transcript> {
        let session = self.sessions.read().await.get(id).cloned()?;
        let session = session.lock().await;
        Some(session.transcript.clone())
    }

    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn session(&self, id: &SessionId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return session.clone();
        }
        self.sessions
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id.clone()))))
            .clone()
    }
}
