//! Command-line entry point.
//!
//! Reads one JSON-encoded command per line from stdin, dispatches each
//! through its own message bus and prints the outcome as a JSON line.
//!
//! Input is never trusted as an internal caller: a command whose metadata
//! names no principal runs as the unprivileged `anonymous` principal.

use std::io::{self, BufRead, Write};

use domain::{Command, CommandMetadata};
use serde_json::json;
use service::{CommandOutput, Config, Dependencies, bootstrap, new_bus, telemetry};
use store::InMemoryBackend;

const ANONYMOUS: &str = "anonymous";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration and tracing
    let config = Config::from_env();
    telemetry::init_tracing(&config);

    // 2. Backend and handler registry
    let backend = InMemoryBackend::with_lock_timeout(config.lock_timeout);
    let deps = Dependencies::production(&config);
    let registry = bootstrap(&deps, &config)?;

    tracing::info!("reading commands from stdin");

    // 3. One bus per command
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(&line) {
            Ok(command) => {
                let command = from_stdin(command);
                let mut bus = new_bus(backend.clone(), &registry);
                match bus.handle(command) {
                    Ok(output) => json!({
                        "ok": output_json(&output),
                        "failed_handlers": bus.failures().len(),
                    }),
                    Err(err) => json!({ "error": err.to_string(), "kind": err.kind().to_string() }),
                }
            }
            Err(err) => json!({ "error": err.to_string(), "kind": "validation" }),
        };
        writeln!(out, "{response}")?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Gives commands without a principal the anonymous one.
fn from_stdin(mut command: Command) -> Command {
    if command.metadata().username.is_none() {
        let timestamp = command.metadata().timestamp;
        *command.metadata_mut() = CommandMetadata {
            timestamp,
            ..CommandMetadata::by(ANONYMOUS)
        };
    }
    command
}

fn output_json(output: &CommandOutput) -> serde_json::Value {
    match output {
        CommandOutput::None => serde_json::Value::Null,
        CommandOutput::Token(token) => json!({ "token": token }),
        CommandOutput::WishlistId(id) => json!({ "wishlist_id": id }),
        CommandOutput::ItemId(id) => json!({ "item_id": id }),
    }
}
