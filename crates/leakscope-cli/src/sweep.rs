//! Multi-condition sweep driver.
//!
//! Runs the same sampled-episode batch under all four memory x tool-access
//! conditions, tagging every record with its condition for later analysis.
//! One JSONL output file covers the whole sweep.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use leakscope_core::Runtime;
use leakscope_eval::{JsonlSink, ResponseScorer, ScoreTally};
use leakscope_types::config::HarnessConfig;
use leakscope_types::errors::LeakscopeError;
use leakscope_types::records::TurnVars;
use leakscope_types::traits::EpisodeSink;

use crate::run::{clip, sample_prompt};

/// The sweep grid: (condition id, memory enabled, tool access enabled).
const CONDITIONS: [(&str, bool, bool); 4] = [
    ("C1", true, true),
    ("C2", true, false),
    ("C3", false, true),
    ("C4", false, false),
];

pub async fn sweep(config: HarnessConfig) -> Result<(), LeakscopeError> {
    let runtime = Runtime::initialize(config.clone())?;

    let run_id = Utc::now().format("%Y%m%d_%H%M%S");
    let out_path = config.run.out_dir.join(format!("sweep_{run_id}.jsonl"));
    let sink = JsonlSink::new(&out_path)?;
    let scorer = ResponseScorer::new();

    let mut global = ScoreTally::default();
    let mut per_condition: Vec<(&str, ScoreTally)> = Vec::new();

    for (idx, &(condition_id, memory_enabled, tool_access_enabled)) in
        CONDITIONS.iter().enumerate()
    {
        // Different seed per condition, but reproducible.
        let condition_seed = config.run.seed + idx as u64 * 1000;
        let tally = run_condition(
            &runtime,
            &sink,
            &scorer,
            &config,
            condition_id,
            memory_enabled,
            tool_access_enabled,
            condition_seed,
        )
        .await?;

        global.absorb(tally);
        per_condition.push((condition_id, tally));
    }

    println!("\n=== Sweep Summary (per condition) ===");
    for (condition_id, tally) in &per_condition {
        println!("{condition_id}: {tally}");
    }

    println!("\n=== Sweep Summary (global) ===");
    println!("{global}");
    println!("\nSaved sweep logs: {}", out_path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_condition(
    runtime: &Runtime,
    sink: &JsonlSink,
    scorer: &ResponseScorer,
    config: &HarnessConfig,
    condition_id: &str,
    memory_enabled: bool,
    tool_access_enabled: bool,
    seed: u64,
) -> Result<ScoreTally, LeakscopeError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tally = ScoreTally::default();

    println!(
        "\n=== Condition {condition_id} | memory={memory_enabled} | tool_access={tool_access_enabled} ==="
    );

    let vars = TurnVars {
        memory_enabled: Some(memory_enabled),
        tool_access_enabled: Some(tool_access_enabled),
        ..TurnVars::default()
    };

    for i in 0..config.run.n_episodes {
        let mut state = runtime.seed_state(&vars);
        let prompt = sample_prompt(&mut rng);

        let record = runtime.engine().run_episode(&mut state, prompt).await?;
        let score = scorer.score(&record.model_final_output);
        tally.record(score.label);

        let mut value = serde_json::to_value(&record)?;
        value["score"] = serde_json::to_value(&score)?;
        value["condition_id"] = json!(condition_id);
        value["sweep"] = json!({
            "memory_enabled": memory_enabled,
            "tool_access_enabled": tool_access_enabled,
            "seed": seed,
        });
        sink.append(&value)?;

        println!(
            "[{}/{}] {} | used_tool={} | prompt='{}'",
            i + 1,
            config.run.n_episodes,
            score.label.as_str(),
            record.tool_used,
            clip(prompt, 48)
        );
    }

    Ok(tally)
}
