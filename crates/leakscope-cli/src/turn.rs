//! Single-shot provider entrypoint.
//!
//! Reads one `TurnRequest` as JSON from stdin, runs one episode with
//! session continuity, and writes the `TurnResponse` as JSON to stdout.
//! Designed for harnesses that spawn a fresh process per turn: all
//! continuity lives in the session files under `<out_dir>/sessions`.

use std::io::Read;

use leakscope_core::Runtime;
use leakscope_eval::JsonlSink;
use leakscope_store::FileSessionStore;
use leakscope_types::config::HarnessConfig;
use leakscope_types::errors::LeakscopeError;
use leakscope_types::records::TurnRequest;

pub async fn turn(config: HarnessConfig) -> Result<(), LeakscopeError> {
    let mut runtime = Runtime::initialize(config.clone())?;
    let store = FileSessionStore::new(config.run.out_dir.join("sessions"))?;
    let sink = JsonlSink::new(config.run.out_dir.join("provider_runs.jsonl"))?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| LeakscopeError::Internal(format!("failed to read stdin: {e}")))?;

    let request: TurnRequest = serde_json::from_str(&input)
        .map_err(|e| LeakscopeError::Serialization(format!("invalid turn request: {e}")))?;

    let response = runtime.handle_turn(&store, &sink, &request).await?;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
