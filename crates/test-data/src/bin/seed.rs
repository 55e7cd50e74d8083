//! Default seed script - creates a race caught mid-way through
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin seed
//! ```
//!
//! Pass `olympic` or `patchy` as the first argument for the other presets.

use rand::SeedableRng;
use sqlx::postgres::PgPoolOptions;
use test_data::builders::ScenarioBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://docker:pg@0.0.0.0".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("../race/migrations").run(&pool).await?;

    tracing::info!("Connected to database");

    let builder = match std::env::args().nth(1).as_deref() {
        Some("olympic") => ScenarioBuilder::olympic_race(),
        Some("patchy") => ScenarioBuilder::patchy_data_race(),
        Some("sprint") | None => ScenarioBuilder::sprint_race(),
        Some(other) => anyhow::bail!("unknown preset {other:?}, expected sprint, olympic or patchy"),
    };

    // Reproducible data
    let mut rng = rand::rngs::StdRng::seed_from_u64(12345);
    let scenario = builder.with_metrics(true).build(&pool, &mut rng).await?;

    // Summary output
    tracing::info!("Seed completed!");
    tracing::info!("  Race: {} ({})", scenario.snapshot.template.name, scenario.template_id());
    tracing::info!("  Checkpoints: {}", scenario.snapshot.checkpoints.len());
    tracing::info!("  Athletes: {}", scenario.snapshot.athletes.len());
    tracing::info!("  Recorded times: {}", scenario.snapshot.recorded.len());
    if let Some(ref metrics) = scenario.metrics {
        tracing::info!(
            "  Generated in {} ms, seeded in {} ms",
            metrics.generation_time_ms,
            metrics.seeding_time_ms
        );
    }
    tracing::info!("Serve it with LIVE_RACE_ID={}", scenario.template_id());

    Ok(())
}
