use std::sync::Arc;

use async_trait::async_trait;
use granite_benchmark::BenchmarkRunner;
use granite_core::{BenchConfig, BenchmarkReport, Result, RunOutcome};
use tracing::{error, info};

use crate::state::AppState;

#[async_trait]
pub trait SuiteRunner: Send + Sync {
    async fn run(&self, target: BenchConfig) -> Result<BenchmarkReport>;
}

/// Runs the default suite against a real inference server
pub struct LiveSuite;

#[async_trait]
impl SuiteRunner for LiveSuite {
    async fn run(&self, target: BenchConfig) -> Result<BenchmarkReport> {
        let mut runner = BenchmarkRunner::new(target);
        runner.run_all_tests().await;
        Ok(runner.into_report())
    }
}

/// Background body of `POST /benchmark`. The run slot is released even if the suite panics.
pub async fn run_job(state: Arc<AppState>, target: BenchConfig) {
    info!(host = %target.host, port = target.port, "Benchmark job started");

    let runner = state.runner.clone();
    let outcome = match tokio::spawn(async move { runner.run(target).await }).await {
        Ok(Ok(report)) => {
            info!(tests = report.results.len(), "Benchmark job finished");
            RunOutcome::Completed(report)
        }
        Ok(Err(e)) => {
            error!("Benchmark job failed: {}", e);
            RunOutcome::failed(e)
        }
        Err(e) => {
            error!("Benchmark job aborted: {}", e);
            RunOutcome::failed(e)
        }
    };

    state.finish(outcome);
}
