//! Round-trip timing for session operations.
//!
//! Run with: cargo run --release -p bench-demo
//!
//! Hits the Redis server at `REDIS_URL` (default `redis://127.0.0.1:6379`).
//! All data changes are live. `BENCH_LOOPS` sets the iteration count.

use std::time::Instant;

use drsession_session::{Session, SessionConfig, SessionStore, storage::redis::DEFAULT_URL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOOPS: u32 = 20_000;

async fn time_it<F, Fut>(label: &str, loops: u32, mut op: F) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let start = Instant::now();
    for _ in 0..loops {
        op().await?;
    }
    let elapsed = start.elapsed();
    println!("TESTING: {label}");
    println!(
        "{loops} loops took {:.3} seconds ({:.3}ms per loop)\n",
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() * 1000.0 / f64::from(loops)
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let loops = std::env::var("BENCH_LOOPS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_LOOPS);

    let store = SessionStore::connect(&url, SessionConfig::default().with_prefix("drsession-test:")).await?;
    let session: Session = store.build_session("abc123");
    let s = &session;

    println!("--==[ DRSession ]==--\n");
    println!("Hitting Redis at {url}.");
    println!("All data changes are live.\n");

    time_it("set a value", loops, move || async move { anyhow::Ok(s.set("foo", "bar").await?) }).await?;
    time_it("read a value", loops, move || async move {
        s.get("foo").await?;
        anyhow::Ok(())
    })
    .await?;
    time_it("does a value exist?", loops, move || async move {
        s.contains("foo").await?;
        anyhow::Ok(())
    })
    .await?;
    time_it("remove a value", loops, move || async move { anyhow::Ok(s.delete("foo").await?) }).await?;
    time_it("save (does nothing)", loops, move || async move {
        s.save();
        anyhow::Ok(())
    })
    .await?;

    session.destroy().await?;
    tracing::info!("Benchmark finished");
    Ok(())
}
