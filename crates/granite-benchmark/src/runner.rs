use std::time::Instant;

use granite_core::{BenchConfig, BenchmarkRecord, BenchmarkReport, BenchmarkSummary};
use tracing::{info, warn};

use crate::chat::{ChatClient, ChatCompletion};
use crate::monitor::{process_thread_count, ResourceMonitor};
use crate::suite::{TestCase, DEFAULT_SUITE, DEFAULT_TEMPERATURE};

/// Runs inference tests against one server and keeps every record in order
pub struct BenchmarkRunner {
    client: ChatClient,
    config: BenchConfig,
    results: Vec<BenchmarkRecord>,
}

impl BenchmarkRunner {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            client: ChatClient::new(&config),
            config,
            results: Vec::new(),
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub async fn health(&self) -> bool {
        self.client.health().await
    }

    /// Runs one request with resource sampling. Failures become a failed record, never an error.
    pub async fn run_inference_test(
        &mut self,
        test_name: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> BenchmarkRecord {
        let record = self.measure(test_name, prompt, max_tokens, temperature).await;

        match &record.error {
            Some(e) => warn!(test = test_name, "Inference test failed: {}", e),
            None => info!(
                test = test_name,
                tokens_per_second = record.tokens_per_second,
                total_time_sec = record.total_time_sec,
                "Inference test complete"
            ),
        }

        self.results.push(record.clone());
        record
    }

    async fn measure(
        &self,
        test_name: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> BenchmarkRecord {
        let mut monitor = ResourceMonitor::from_config(&self.config);
        if let Err(e) = monitor.start() {
            return BenchmarkRecord::failed(test_name, e);
        }

        let start = Instant::now();
        let outcome = self.client.complete(prompt, max_tokens, temperature).await;
        let total_time_sec = start.elapsed().as_secs_f64();
        // stop() joins the sampler thread
        let resources = tokio::task::spawn_blocking(move || monitor.stop())
            .await
            .unwrap_or_default();

        let completion = match outcome {
            Ok(c) => c,
            Err(e) => return BenchmarkRecord::failed(test_name, e),
        };

        let (tokens_per_second, first_token_latency_ms) = throughput(&completion, total_time_sec);
        let thread_count = self.inference_thread_count().await;

        BenchmarkRecord {
            test_name: test_name.to_string(),
            prompt_tokens: completion.usage.prompt_tokens,
            completion_tokens: completion.usage.completion_tokens,
            total_time_sec,
            tokens_per_second,
            first_token_latency_ms,
            avg_cpu_percent: resources.avg_cpu,
            peak_cpu_percent: resources.peak_cpu,
            avg_memory_gb: resources.avg_memory_gb,
            peak_memory_gb: resources.peak_memory_gb,
            thread_count,
            success: true,
            error: None,
        }
    }

    async fn inference_thread_count(&self) -> u32 {
        let name = self.config.process_name.clone();
        tokio::task::spawn_blocking(move || process_thread_count(&name))
            .await
            .unwrap_or(0)
    }

    pub async fn run_suite(&mut self, suite: &[TestCase]) {
        info!(tests = suite.len(), server = self.client.base_url(), "Starting benchmark suite");

        for (i, case) in suite.iter().enumerate() {
            info!("Test {}: {}...", i + 1, case.label);
            self.run_inference_test(case.name, case.prompt, case.max_tokens, DEFAULT_TEMPERATURE)
                .await;
        }

        info!("Benchmark complete");
    }

    pub async fn run_all_tests(&mut self) {
        self.run_suite(DEFAULT_SUITE).await;
    }

    pub fn results(&self) -> &[BenchmarkRecord] {
        &self.results
    }

    pub fn summary(&self) -> Option<BenchmarkSummary> {
        BenchmarkSummary::from_records(&self.results)
    }

    pub fn into_report(self) -> BenchmarkReport {
        BenchmarkReport::new(self.results)
    }
}

/// Server-reported timings win; otherwise tokens/s is derived from wall time and latency is unknown
fn throughput(completion: &ChatCompletion, total_time_sec: f64) -> (f64, f64) {
    match &completion.timings {
        Some(t) => match t.predicted_per_second {
            Some(tps) => (tps, t.prompt_ms.unwrap_or(0.0)),
            None => (wall_rate(completion, total_time_sec), t.prompt_ms.unwrap_or(0.0)),
        },
        None => (wall_rate(completion, total_time_sec), 0.0),
    }
}

fn wall_rate(completion: &ChatCompletion, total_time_sec: f64) -> f64 {
    if total_time_sec > 0.0 {
        completion.usage.completion_tokens as f64 / total_time_sec
    } else {
        0.0
    }
}
