/// Lucky walkthrough: plays journey 1 end to end through the async runtime.
///
/// The path: pick the journey at the terminal → TLB → calculator (binary
/// split quiz) → TLB (hit or miss) → permission chamber (Allow Access) →
/// RAM → finish.
///
/// A `Recorder` stands in for the game front end; everything it received is
/// printed at the end.
///
/// Run with: cargo run --example lucky_walkthrough

use oscity_engine::config::EngineConfig;
use oscity_engine::core::engine::ProgressionEngine;
use oscity_engine::core::progress::MemoryProgressStore;
use oscity_engine::runtime::director::Director;
use oscity_engine::runtime::executor::Ports;
use oscity_engine::runtime::ports::{Recorded, Recorder};
use oscity_engine::schema::event::Trigger;
use oscity_engine::schema::player::PlayerId;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("oscity_engine=debug,study=info")
        .init();

    // --- Fast timers so the demo finishes quickly ---
    let config = EngineConfig {
        line_delay_ms: 0,
        calculation_delay_ms: 20,
        seed: 2024,
        ..EngineConfig::default()
    };
    let engine = ProgressionEngine::builder()
        .content_dir("content")
        .config(config)
        .build()
        .expect("Failed to build engine");

    let recorder = Arc::new(Recorder::new());
    let store = Arc::new(MemoryProgressStore::new());
    let director = Director::new(Arc::new(engine), Ports::recording(recorder.clone(), store));

    let player = PlayerId(7);
    director.connect(player).await.expect("Failed to connect");

    let enter = |title: &str| Trigger::RegionEntered(Some(title.to_string()));
    let press = |id: &str| Trigger::ButtonPressed(id.to_string());

    // --- Terminal ---
    director.dispatch(player, enter("Adventurer Mode")).await;
    settle().await;
    director.chat(player, "1").await;
    settle().await;

    // --- TLB, then the calculator ---
    director.dispatch(player, enter("TLB Room")).await;
    settle().await;
    director.dispatch(player, enter("Calculator Room")).await;
    settle().await;
    director.dispatch(player, Trigger::CalculatorInput("0x2A".to_string())).await;
    settle().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    director.chat(player, "A").await;
    settle().await;

    director.dispatch(player, enter("TLB Room")).await;
    settle().await;
    director.chat(player, "hit").await;
    settle().await;

    // --- Permission chamber ---
    director.dispatch(player, enter("Permission Chamber")).await;
    settle().await;
    director.dispatch(player, press("btn1")).await;
    settle().await;
    director.chat(player, "1").await;
    settle().await;

    // --- RAM ---
    director.dispatch(player, enter("RAM Room")).await;
    settle().await;
    director.dispatch(player, press("ramMix")).await;
    settle().await;
    director.dispatch(player, press("ramMix")).await;
    settle().await;

    let summary = director.disconnect(player).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n=== What the front end saw ===\n");
    for call in recorder.calls() {
        match call {
            Recorded::Chat { line, .. } => println!("{}", line),
            Recorded::Display { display, lines } => {
                let shown: Vec<&str> = lines.iter().map(String::as_str).filter(|l| !l.is_empty()).collect();
                println!("    [{}] {}", display, shown.join(" | "));
            }
            Recorded::Teleport { destination, .. } => println!("    ~ teleport to {}", destination),
            Recorded::Completion { journey, .. } => println!("    * journey {} complete", journey.0),
            _ => {}
        }
    }

    if let Some(summary) = summary {
        println!("\n=== Session {} ===", summary.session_id);
        println!("Final phase: {}", summary.phase);
        println!("Hints used: {}", summary.hints_used);
        println!("Wrong answers: {}", summary.wrong_answers);
        println!("Completed: {:?}", summary.completed.iter().map(|j| j.0).collect::<Vec<_>>());
    }
}

/// Give the player's actor and dialogue task time to catch up; entering a
/// room drops guide lines that have not been delivered yet.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
