//! Join simulator entry point.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use classroom_loadtest::{SimulationConfig, Summary, run};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Simulate a class of students joining sessions at once.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Plan file (`{ "baseURL": ..., "sessions": [...] }`).
    #[arg(default_value = "loadtest.json")]
    plan: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom_loadtest=info".into()),
        )
        .init();

    let args = Args::parse();
    let plan = SimulationConfig::from_file(&args.plan)?;
    info!(
        base_url = %plan.base_url,
        sessions = plan.sessions.len(),
        students = plan.student_count(),
        "Starting join simulation"
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let attempts = run(&client, &plan).await;
    let summary = Summary::from_attempts(&attempts);
    println!("{summary}");

    Ok(())
}
