//! Replays a generated race in memory, printing the leaderboard each tick.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin simulate
//! ```
//!
//! `SIM_STEP_SECS` sets the simulated time between ticks (default 300) and
//! `SIM_ATHLETES` the field size (default 12).

use std::sync::Arc;

use race::{
    clock::{Clock, ManualClock},
    live::LiveEngine,
    poller::Poller,
    store::MemoryStore,
    timing::format_elapsed,
};
use rand::SeedableRng;
use test_data::builders::ScenarioBuilder;
use time::Duration;
use tracing_subscriber::EnvFilter;

const LEADERBOARD_ROWS: usize = 5;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let step = Duration::seconds(env_or("SIM_STEP_SECS", 300i64).max(1));
    let athletes = env_or("SIM_ATHLETES", 12usize);

    let mut rng = rand::rngs::StdRng::seed_from_u64(12345);
    let scenario = ScenarioBuilder::sprint_race()
        .with_athletes(athletes)
        .build_data(&mut rng);
    let Some(end) = scenario.last_crossing() else {
        anyhow::bail!("generated race has no crossings");
    };

    let store = Arc::new(MemoryStore::new());
    scenario.seed_memory_empty(&store).await;
    let clock = Arc::new(ManualClock::new(scenario.gun - step));
    let poller = Poller::new(
        store.clone(),
        clock.clone(),
        LiveEngine::default(),
        scenario.template_id(),
    );

    println!(
        "{}: {} athletes, {} crossings",
        scenario.snapshot.template.name,
        scenario.snapshot.athletes.len(),
        scenario.timeline.len()
    );

    let mut previous = clock.now();
    while previous < end {
        clock.advance(step);
        let now = clock.now();
        let recorded = scenario.replay(store.as_ref(), previous, now).await?;
        previous = now;

        let view = poller.tick().await?;
        println!(
            "\n[race clock {}] {recorded} new crossings",
            format_elapsed(Some(scenario.gun), Some(now))
        );
        for entry in view.leaderboard.iter().take(LEADERBOARD_ROWS) {
            println!(
                "  {:>2}. {:<24} {:<10} {:>8.0} m",
                entry.rank,
                entry.name,
                format!("{:?}", entry.status).to_lowercase(),
                entry.distance_covered
            );
        }
    }

    println!("\nAll athletes finished.");
    Ok(())
}
