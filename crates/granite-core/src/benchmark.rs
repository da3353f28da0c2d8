use serde::{Deserialize, Serialize};

/// Local time in ISO-8601 without offset, e.g. `2025-10-02T14:03:11.204518`
pub fn timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Outcome of one inference test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub test_name: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_time_sec: f64,
    pub tokens_per_second: f64,
    pub first_token_latency_ms: f64,
    pub avg_cpu_percent: f64,
    pub peak_cpu_percent: f64,
    pub avg_memory_gb: f64,
    pub peak_memory_gb: f64,
    pub thread_count: u32,
    pub success: bool,
    pub error: Option<String>,
}

impl BenchmarkRecord {
    /// A zeroed record carrying only the test name and the failure reason
    pub fn failed(test_name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            test_name: test_name.into(),
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// CPU and memory statistics sampled while a request was in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub avg_cpu: f64,
    pub peak_cpu: f64,
    pub avg_memory_gb: f64,
    pub peak_memory_gb: f64,
}

impl ResourceStats {
    pub fn from_samples(cpu_samples: &[f64], memory_samples: &[f64]) -> Self {
        Self {
            avg_cpu: mean(cpu_samples),
            peak_cpu: peak(cpu_samples),
            avg_memory_gb: mean(memory_samples),
            peak_memory_gb: peak(memory_samples),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn peak(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub total_tests: usize,
    pub successful: usize,
    pub failed: usize,
    pub avg_speed_tokens_per_sec: f64,
    pub avg_cpu_percent: f64,
    pub peak_memory_gb: f64,
}

impl BenchmarkSummary {
    /// Aggregates successful records. Returns `None` when nothing succeeded.
    pub fn from_records(records: &[BenchmarkRecord]) -> Option<Self> {
        let successful: Vec<&BenchmarkRecord> = records.iter().filter(|r| r.success).collect();
        if successful.is_empty() {
            return None;
        }

        let n = successful.len() as f64;
        let avg_speed_tokens_per_sec = successful.iter().map(|r| r.tokens_per_second).sum::<f64>() / n;
        let avg_cpu_percent = successful.iter().map(|r| r.avg_cpu_percent).sum::<f64>() / n;
        let peak_memory_gb = successful
            .iter()
            .map(|r| r.peak_memory_gb)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            total_tests: records.len(),
            successful: successful.len(),
            failed: records.len() - successful.len(),
            avg_speed_tokens_per_sec,
            avg_cpu_percent,
            peak_memory_gb,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu_count: usize,
    pub total_memory_gb: f64,
}

/// Results of a full suite run, as exported to disk or served by the trigger API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_info: Option<SystemInfo>,
    pub results: Vec<BenchmarkRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<BenchmarkSummary>,
}

impl BenchmarkReport {
    pub fn new(results: Vec<BenchmarkRecord>) -> Self {
        let summary = BenchmarkSummary::from_records(&results);
        Self {
            timestamp: timestamp(),
            system_info: None,
            results,
            summary,
        }
    }

    pub fn with_system_info(mut self, info: SystemInfo) -> Self {
        self.system_info = Some(info);
        self
    }
}

/// Latest state stored by the trigger server: either a report or the reason the run failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Completed(BenchmarkReport),
    Failed { error: String, timestamp: String },
}

impl RunOutcome {
    pub fn failed(error: impl ToString) -> Self {
        Self::Failed {
            error: error.to_string(),
            timestamp: timestamp(),
        }
    }
}
