//! Domain event system: decoupled observation of conversation turns.
//!
//! The orchestrator publishes an event whenever something a user or operator
//! might care about happens. Subscribers (the CLI's reasoning trace, tests)
//! react without the orchestrator knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::procurement::Intent;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A user utterance was classified
    IntentClassified {
        session_id: String,
        intent: Intent,
        /// True when the classifier failed and fell back to CHAT
        fell_back: bool,
        timestamp: DateTime<Utc>,
    },

    /// A fact was extracted and persisted
    MemoryStored {
        fact: String,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed by the agent runtime
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The agent asked for approval and the session is now waiting
    OrderPaused {
        session_id: String,
        vendor: String,
        total_cost: f64,
        timestamp: DateTime<Utc>,
    },

    /// A pending order was approved or cancelled
    ApprovalResolved {
        session_id: String,
        vendor: String,
        approved: bool,
        timestamp: DateTime<Utc>,
    },

    /// An error was turned into an error reply
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::IntentClassified { .. } => "intent_classified",
            Self::MemoryStored { .. } => "memory_stored",
            Self::ToolExecuted { .. } => "tool_executed",
            Self::OrderPaused { .. } => "order_paused",
            Self::ApprovalResolved { .. } => "approval_resolved",
            Self::ErrorOccurred { .. } => "error_occurred",
        }
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // no subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
