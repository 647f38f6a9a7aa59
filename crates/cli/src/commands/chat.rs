//! `quartermaster chat` and `quartermaster ask`: conversation turns.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use quartermaster_agent::{SessionManager, TurnReply};
use quartermaster_core::event::EventBus;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

const EXIT_WORDS: &[&str] = &["exit", "quit"];

pub async fn run(config_path: Option<&Path>, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let event_bus = Arc::new(EventBus::default());
    let orchestrator = super::build_orchestrator(&config, event_bus.clone())?;
    spawn_event_logger(&event_bus);

    let sessions = SessionManager::new(orchestrator.clone());
    let session = sessions.create().await;
    let remembered = orchestrator.memory().count().await?;

    println!();
    println!("  Quartermaster: procurement assistant");
    println!();
    println!("  Model:     {}", config.llm.model_string());
    println!("  Memory:    {} ({} facts)", config.memory.collection_path().display(), remembered);
    println!("  Vendors:   {}", config.vendors.catalog_path.display());
    println!();
    println!("  Teach a rule (\"Mumbai site budget limit is 50000\") or ask to buy something.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            prompt()?;
            continue;
        }
        if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
            break;
        }

        eprint!("  ...");
        let reply = sessions.handle(&session, input).await;
        eprint!("\r     \r");
        print_reply(&reply, verbose);
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

pub async fn ask(
    config_path: Option<&Path>,
    message: &str,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let event_bus = Arc::new(EventBus::default());
    let orchestrator = super::build_orchestrator(&config, event_bus.clone())?;
    spawn_event_logger(&event_bus);

    let sessions = SessionManager::new(orchestrator);
    let session = sessions.create().await;
    let reply = sessions.handle(&session, message).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        for line in reply.response.lines() {
            println!("{line}");
        }
        if verbose {
            print_reasoning(&reply);
        }
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_reply(reply: &TurnReply, verbose: bool) {
    println!();
    for line in reply.response.lines() {
        println!("  Quartermaster > {line}");
    }
    if verbose {
        print_reasoning(reply);
    }
    println!();
}

fn print_reasoning(reply: &TurnReply) {
    println!();
    println!("  [{} | {}]", reply.intent, reply.state);
    for line in reply.reasoning.lines() {
        println!("    {line}");
    }
}

/// Log domain events at debug level for the life of the process.
fn spawn_event_logger(event_bus: &EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(event = event.event_type(), "{:?}", event),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}
