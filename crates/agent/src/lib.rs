//! The procurement agent: intent classification, the tool loop, and the
//! approval state machine.
//!
//! One conversation turn runs in order:
//!
//! 1. **Classify** the utterance (a pending order short-circuits to an approval reply)
//! 2. **Act**: store a fact, run the agent, or resolve the pending order
//! 3. **Respond** with a [`TurnReply`] and record the turn in the transcript
//!
//! The agent loop continues until the model answers with text only or the
//! iteration limit is reached; its answer must end with a JSON decision block.

pub mod assembly;
pub mod decision;
pub mod intent;
pub mod orchestrator;
pub mod prompts;
pub mod runtime;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembly::build_memory_layer;
pub use decision::extract_decision;
pub use intent::{Classification, IntentClassifier};
pub use orchestrator::{AgentOrchestrator, ConversationState, Phase, Session, SessionManager, TurnReply};
pub use runtime::{AgentRun, AgentRuntime};
pub use stream_event::{collect_text, AgentEvent};
