//! Fact extraction: condense a user utterance into one storable rule.

use quartermaster_core::error::ProviderError;
use quartermaster_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// Build the extraction prompt for `user_input`.
pub fn extraction_prompt(user_input: &str) -> String {
    format!(
        "Extract the key constraints, rules, or facts from the following user input. \
Focus on numerical limits, banned items, preferred vendors, or site-specific instructions.\n\
Return ONLY the extracted facts as a single concise sentence.\n\n\
Input: \"{user_input}\"\n\n\
Facts:"
    )
}

/// Turns free-form input ("for the Mumbai site never spend more than 50k")
/// into a concise fact via one model call.
pub struct FactExtractor {
    provider: Arc<dyn Provider>,
    model: String,
}

impl FactExtractor {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// One model call. The reply is trimmed and returned as-is.
    pub async fn extract(&self, user_input: &str) -> Result<String, ProviderError> {
        let request = ProviderRequest::prompt(&self.model, extraction_prompt(user_input));
        let response = self.provider.complete(request).await?;
        let fact = response.message.content.trim().to_string();
        debug!(model = %self.model, fact = %fact, "Extracted fact");
        Ok(fact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quartermaster_core::message::Message;
    use quartermaster_core::provider::ProviderResponse;
    use std::sync::Mutex;

    struct Recording {
        reply: Result<String, ProviderError>,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl Provider for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().map(|text| ProviderResponse {
                message: Message::assistant(text),
                usage: None,
                model: "m".into(),
            })
        }
    }

    #[test]
    fn prompt_embeds_input() {
        let prompt = extraction_prompt("Mumbai limit is 50k");
        assert!(prompt.contains("Input: \"Mumbai limit is 50k\""));
        assert!(prompt.contains("single concise sentence"));
        assert!(prompt.trim_end().ends_with("Facts:"));
    }

    #[tokio::test]
    async fn extract_trims_reply() {
        let provider = Arc::new(Recording {
            reply: Ok("  The Mumbai site budget limit is 50000.\n".into()),
            seen: Mutex::new(Vec::new()),
        });
        let extractor = FactExtractor::new(provider.clone(), "llama3-70b-8192");
        let fact = extractor.extract("for mumbai never spend more than 50k").await.unwrap();
        assert_eq!(fact, "The Mumbai site budget limit is 50000.");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "llama3-70b-8192");
        assert!(seen[0].messages[0].content.contains("for mumbai never spend more than 50k"));
    }

    #[tokio::test]
    async fn extract_propagates_provider_error() {
        let provider = Arc::new(Recording {
            reply: Err(ProviderError::Timeout("120s".into())),
            seen: Mutex::new(Vec::new()),
        });
        let extractor = FactExtractor::new(provider, "m");
        assert!(matches!(
            extractor.extract("x").await,
            Err(ProviderError::Timeout(_))
        ));
    }
}
