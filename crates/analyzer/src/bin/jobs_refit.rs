//! Weekly re-fit job. Parameter re-estimation cadence and model are left to
//! a future iteration; this binary exists as the documented extension
//! point so the scheduled entry point is stable now.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    tracing::info!("jobs-refit invoked: no re-fit model is implemented yet, exiting");
    Ok(())
}
