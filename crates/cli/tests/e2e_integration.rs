//! End-to-end integration tests for the Quartermaster procurement assistant.
//!
//! These tests exercise the full pipeline from user input to reply: intent
//! classification, fact ingestion into an on-disk collection, the agent's
//! tool loop over real tools, decision parsing, and the approval cycle.

use std::path::Path;
use std::sync::{Arc, Mutex};

use quartermaster_agent::{build_memory_layer, AgentOrchestrator, Phase, Session, SessionManager};
use quartermaster_config::AppConfig;
use quartermaster_core::error::ProviderError;
use quartermaster_core::event::EventBus;
use quartermaster_core::message::{Message, MessageToolCall, Role, SessionId};
use quartermaster_core::procurement::Intent;
use quartermaster_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use quartermaster_tools::{JsonVendorCatalog, NO_RULES_FOUND};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every request it saw.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();
        if call >= responses.len() {
            panic!("ScriptedProvider exhausted: call #{call}, have {}", responses.len());
        }
        requests.push(request);
        Ok(responses[call].clone())
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock".into(),
    }
}

fn tool_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut msg = Message::assistant(thought);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: None,
        model: "mock".into(),
    }
}

fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const CATALOG: &str = r#"[
  {"vendor": "UltraTech", "product": "Cement (OPC 53)", "price": 400},
  {"vendor": "ACC", "product": "Cement (OPC 53)", "price": 410},
  {"vendor": "TATA Steel", "product": "TMT Steel Rods", "price": 68}
]"#;

const PAUSE_ANSWER: &str = "Memory says the Mumbai site limit is 50000. UltraTech is the cheapest \
cement at 400 per bag, so 200 bags cost 80000, which exceeds the limit.\n\
```json\n\
{\"selected_vendor\": \"UltraTech\", \"price_per_unit\": 400, \"total_cost\": 80000, \
\"status\": \"PAUSE_APPROVAL_NEEDED\", \"reasoning\": \"Total 80000 exceeds the Mumbai limit of 50000\"}\n\
```";

/// Offline config: hash embeddings, store and catalog under `dir`.
fn offline_config(dir: &Path) -> AppConfig {
    std::fs::write(dir.join("mock_vendors.json"), CATALOG).unwrap();
    let mut config = AppConfig::default();
    config.embedding.provider = "hash".into();
    config.embedding.dimensions = 256;
    config.memory.db_path = dir.join("memory_db");
    config.vendors.catalog_path = dir.join("mock_vendors.json");
    config
}

fn orchestrator(config: &AppConfig, provider: Arc<ScriptedProvider>) -> AgentOrchestrator {
    let memory = build_memory_layer(config, provider.clone(), None).unwrap();
    let catalog = Arc::new(JsonVendorCatalog::new(&config.vendors.catalog_path));
    AgentOrchestrator::from_config(config, provider, memory, catalog, Arc::new(EventBus::default()))
}

fn tool_messages(request: &ProviderRequest) -> Vec<String> {
    request
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.clone())
        .collect()
}

// ── E2E: Cement scenario ─────────────────────────────────────────────────

#[tokio::test]
async fn e2e_cement_order_over_budget_pauses_then_approves() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());

    let provider = Arc::new(ScriptedProvider::new(vec![
        // turn 1: classify, extract
        text_response("STORE_FACT"),
        text_response("Mumbai site budget limit is 50000"),
        // turn 2: classify, then the agent loop
        text_response("PROCUREMENT_REQUEST"),
        tool_response(
            vec![make_tool_call(
                "consult_memory",
                serde_json::json!({"query": "rules for Mumbai site"}),
            )],
            "Checking site rules first.",
        ),
        tool_response(
            vec![make_tool_call("search_vendors", serde_json::json!({"product_name": "cement"}))],
            "",
        ),
        text_response(PAUSE_ANSWER),
    ]));
    let orch = orchestrator(&config, provider.clone());
    let mut session = Session::new(SessionId::from("site-office"));

    let reply = orch
        .handle_turn(&mut session, "For the Mumbai site, never spend more than 50000 on one order")
        .await;
    assert_eq!(reply.intent, Intent::StoreFact);
    assert_eq!(reply.response, "Learned: Mumbai site budget limit is 50000");
    assert!(config.memory.collection_path().exists());

    let reply = orch
        .handle_turn(&mut session, "Order 200 bags of cement for the Mumbai site")
        .await;
    assert_eq!(reply.intent, Intent::ProcurementRequest);
    assert_eq!(reply.state, Phase::PendingApproval);
    assert_eq!(
        reply.response,
        "Approval Required\nReason: Total 80000 exceeds the Mumbai limit of 50000\nCost: 80000\nProceed? (y/n)"
    );
    assert!(reply.reasoning.contains("Tool call: consult_memory"));
    assert!(reply.reasoning.contains("Agent Response:\nChecking site rules first."));

    // the agent saw the remembered rule and the catalog prices
    let final_request = provider.request(5);
    let results = tool_messages(&final_request);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], "- Mumbai site budget limit is 50000");
    assert!(results[1].contains("UltraTech"));
    assert!(!results[1].contains("TATA Steel"));
    assert_eq!(final_request.tools.len(), 3);

    let reply = orch.handle_turn(&mut session, "y").await;
    assert_eq!(reply.intent, Intent::ApprovalReply);
    assert_eq!(reply.response, "Order Confirmed.\nPlaced order with UltraTech.");
    assert_eq!(reply.state, Phase::Idle);

    // the approval reply never reached the model
    assert_eq!(provider.calls(), 6);
    assert_eq!(session.transcript.len(), 6);
}

#[tokio::test]
async fn e2e_denial_cancels_and_next_request_runs_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());

    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("PROCUREMENT_REQUEST"),
        text_response(PAUSE_ANSWER),
        text_response("CHAT"),
        text_response("You're welcome!"),
    ]));
    let orch = orchestrator(&config, provider.clone());
    let mut session = Session::new(SessionId::new());

    orch.handle_turn(&mut session, "Order 200 bags of cement").await;
    let reply = orch.handle_turn(&mut session, "No, hold off").await;
    assert_eq!(reply.response, "Order Cancelled.");
    assert_eq!(reply.state, Phase::Idle);

    let reply = orch.handle_turn(&mut session, "thanks").await;
    assert_eq!(reply.intent, Intent::Chat);
    assert_eq!(reply.response, "You're welcome!");
    assert_eq!(provider.calls(), 4);
}

#[tokio::test]
async fn e2e_vendor_search_before_memory_is_redirected() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());

    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("PROCUREMENT_REQUEST"),
        tool_response(
            vec![make_tool_call("search_vendors", serde_json::json!({"product_name": "cement"}))],
            "",
        ),
        tool_response(
            vec![make_tool_call("consult_memory", serde_json::json!({"query": "cement rules"}))],
            "",
        ),
        text_response(
            "No rules apply.\n{\"selected_vendor\": \"UltraTech\", \"price_per_unit\": 400, \"total_cost\": 4000, \"status\": \"ORDER_PLACED\", \"reasoning\": \"No limit on file\"}",
        ),
    ]));
    let orch = orchestrator(&config, provider.clone());
    let mut session = Session::new(SessionId::new());

    let reply = orch.handle_turn(&mut session, "Buy 10 bags of cement").await;
    assert_eq!(
        reply.response,
        "Order Placed\nVendor: UltraTech\nCost: 4000\nReason: No limit on file"
    );

    let results = tool_messages(&provider.request(3));
    assert!(results[0].contains("Call consult_memory first"));
    assert_eq!(results[1], NO_RULES_FOUND);
}

#[tokio::test]
async fn e2e_rules_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());

    let first = Arc::new(ScriptedProvider::new(vec![
        text_response("STORE_FACT"),
        text_response("Pune site prefers UltraTech cement"),
        text_response("STORE_FACT"),
        text_response("Mumbai site budget limit is 50000"),
        text_response("STORE_FACT"),
        text_response("Never buy from ShadyBricks"),
    ]));
    let orch = orchestrator(&config, first);
    let mut session = Session::new(SessionId::new());
    for input in [
        "Pune prefers UltraTech",
        "Mumbai limit is 50k",
        "Don't use ShadyBricks",
    ] {
        let reply = orch.handle_turn(&mut session, input).await;
        assert!(reply.response.starts_with("Learned: "));
    }
    drop(orch);

    let second = Arc::new(ScriptedProvider::new(vec![
        text_response("PROCUREMENT_REQUEST"),
        tool_response(
            vec![make_tool_call(
                "consult_memory",
                serde_json::json!({"query": "budget limit for Mumbai site"}),
            )],
            "",
        ),
        text_response("Noted the limit."),
    ]));
    let orch = orchestrator(&config, second.clone());
    assert_eq!(orch.memory().count().await.unwrap(), 3);

    let reply = orch
        .handle_turn(&mut Session::new(SessionId::new()), "Order cement for Mumbai")
        .await;
    assert_eq!(reply.response, "Noted the limit.");
    let results = tool_messages(&second.request(2));
    assert!(results[0].contains("Mumbai site budget limit is 50000"));
}

#[tokio::test]
async fn e2e_sessions_keep_their_own_pending_orders() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());

    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("PROCUREMENT_REQUEST"),
        text_response(PAUSE_ANSWER),
        text_response("CHAT"),
        text_response("Hello from the other site."),
    ]));
    let manager = SessionManager::new(Arc::new(orchestrator(&config, provider)));
    let mumbai = manager.create().await;
    let pune = manager.create().await;

    manager.handle(&mumbai, "Order 200 bags of cement").await;
    let reply = manager.handle(&pune, "hello").await;
    assert_eq!(reply.response, "Hello from the other site.");

    assert!(manager.pending_order(&mumbai).await.is_some());
    assert!(manager.pending_order(&pune).await.is_none());

    let reply = manager.handle(&mumbai, "APPROVE").await;
    assert_eq!(reply.response, "Order Confirmed.\nPlaced order with UltraTech.");
    assert!(manager.pending_order(&mumbai).await.is_none());
}
