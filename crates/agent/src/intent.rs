//! Intent classification.
//!
//! A pending approval short-circuits everything: the next utterance is an
//! answer to it, whatever it says. Otherwise one model call picks a label.
//! A failed call falls back to [`Intent::Chat`] so the conversation keeps
//! going.

use quartermaster_core::procurement::Intent;
use quartermaster_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, warn};
use crate::prompts::classification_prompt;

/// The classifier's answer plus whether it came from the fallback branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub fell_back: bool,
}

pub struct IntentClassifier {
    provider: Arc<dyn Provider>,
    model: String,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn classify(&self, user_input: &str, has_pending_order: bool) -> Intent {
        self.classify_detailed(user_input, has_pending_order).await.intent
    }

    pub async fn classify_detailed(&self, user_input: &str, has_pending_order: bool) -> Classification {
        if has_pending_order {
            return Classification {
                intent: Intent::ApprovalReply,
                fell_back: false,
            };
        }

        let request = ProviderRequest::prompt(&self.model, classification_prompt(user_input));
        match self.provider.complete(request).await {
            Ok(response) => {
                let intent = parse_label(&response.message.content);
                debug!(intent = %intent, "Classified input");
                Classification {
                    intent,
                    fell_back: false,
                }
            }
            Err(e) => {
                warn!(error = %e, "Intent classification failed, falling back to CHAT");
                Classification {
                    intent: Intent::Chat,
                    fell_back: true,
                }
            }
        }
    }
}

/// Map a model reply to an intent. STORE_FACT is checked before PROCUREMENT.
pub fn parse_label(reply: &str) -> Intent {
    let label = reply.trim().to_uppercase();
    if label.contains("STORE_FACT") {
        Intent::StoreFact
    } else if label.contains("PROCUREMENT") {
        Intent::ProcurementRequest
    } else {
        Intent::Chat
    }
}
