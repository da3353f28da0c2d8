use std::io::{self, Write};
use std::path::Path;

use granite_core::{BenchmarkRecord, BenchmarkReport, BenchmarkSummary, Result, SystemInfo};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utilization {
    Low,
    Moderate,
    Good,
}

impl Utilization {
    pub fn from_avg_cpu(avg_cpu: f64) -> Self {
        if avg_cpu < 30.0 {
            Utilization::Low
        } else if avg_cpu > 60.0 {
            Utilization::Good
        } else {
            Utilization::Moderate
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Utilization::Low => {
                "WARNING: Low CPU utilization - may not be using all allocated threads"
            }
            Utilization::Moderate => "Moderate CPU utilization",
            Utilization::Good => "Good CPU utilization",
        }
    }
}

fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{:=<60}", "")
}

pub fn write_results(
    out: &mut impl Write,
    records: &[BenchmarkRecord],
    system: &SystemInfo,
    expected_threads: u32,
) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "No results to display");
    }

    writeln!(out)?;
    rule(out)?;
    writeln!(out, "BENCHMARK RESULTS")?;
    rule(out)?;

    for r in records {
        writeln!(out, "\nTest: {}", r.test_name)?;
        if r.success {
            writeln!(out, "  Status: SUCCESS")?;
            writeln!(out, "  Tokens: {} prompt + {} completion", r.prompt_tokens, r.completion_tokens)?;
            writeln!(out, "  Speed: {:.2} tokens/sec", r.tokens_per_second)?;
            writeln!(out, "  Latency: {:.1}ms first token", r.first_token_latency_ms)?;
            writeln!(out, "  Total Time: {:.2}s", r.total_time_sec)?;
            writeln!(out, "  CPU Usage: {:.1}% avg, {:.1}% peak", r.avg_cpu_percent, r.peak_cpu_percent)?;
            writeln!(out, "  Memory: {:.2}GB avg, {:.2}GB peak", r.avg_memory_gb, r.peak_memory_gb)?;
            writeln!(out, "  Threads: {}", r.thread_count)?;
        } else {
            writeln!(out, "  Status: FAILED")?;
            writeln!(out, "  Error: {}", r.error.as_deref().unwrap_or("unknown"))?;
        }
    }

    let Some(summary) = BenchmarkSummary::from_records(records) else {
        return Ok(());
    };

    writeln!(out)?;
    rule(out)?;
    writeln!(out, "SUMMARY")?;
    rule(out)?;
    writeln!(out, "Total Tests: {}", summary.total_tests)?;
    writeln!(out, "Successful: {}", summary.successful)?;
    writeln!(out, "Failed: {}", summary.failed)?;
    writeln!(out, "\nAverage Speed: {:.2} tokens/sec", summary.avg_speed_tokens_per_sec)?;
    writeln!(out, "Average CPU Usage: {:.1}%", summary.avg_cpu_percent)?;
    writeln!(out, "Peak Memory Usage: {:.2}GB", summary.peak_memory_gb)?;

    writeln!(out)?;
    rule(out)?;
    writeln!(out, "RESOURCE UTILIZATION ANALYSIS")?;
    rule(out)?;
    writeln!(out, "Total CPU Cores: {}", system.cpu_count)?;
    writeln!(out, "CPU Usage: {:.1}% of total capacity", summary.avg_cpu_percent)?;
    if system.cpu_count > 0 {
        let expected_pct = expected_threads as f64 / system.cpu_count as f64 * 100.0;
        writeln!(
            out,
            "Expected with {} threads: ~{:.0}% ({}/{} cores)",
            expected_threads, expected_pct, expected_threads, system.cpu_count
        )?;
    }

    let first_threads = records.iter().find(|r| r.success).map(|r| r.thread_count).unwrap_or(0);
    if first_threads > 0 {
        writeln!(out, "Actual Threads Used: {}", first_threads)?;
    }

    writeln!(out, "{}", Utilization::from_avg_cpu(summary.avg_cpu_percent).message())
}

pub fn print_results(records: &[BenchmarkRecord], system: &SystemInfo, expected_threads: u32) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // stdout closed means nobody is reading
    let _ = write_results(&mut out, records, system, expected_threads);
}

pub fn export_json(path: &Path, report: &BenchmarkReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    info!("Results exported to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> SystemInfo {
        SystemInfo {
            cpu_count: 96,
            total_memory_gb: 256.0,
        }
    }

    fn ok_record(name: &str, cpu: f64, threads: u32) -> BenchmarkRecord {
        BenchmarkRecord {
            test_name: name.to_string(),
            prompt_tokens: 10,
            completion_tokens: 20,
            total_time_sec: 1.5,
            tokens_per_second: 13.33,
            avg_cpu_percent: cpu,
            peak_cpu_percent: cpu + 5.0,
            peak_memory_gb: 12.0,
            thread_count: threads,
            success: true,
            ..Default::default()
        }
    }

    fn render(records: &[BenchmarkRecord]) -> String {
        let mut buf = Vec::new();
        write_results(&mut buf, records, &system(), 48).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn utilization_thresholds() {
        assert_eq!(Utilization::from_avg_cpu(29.9), Utilization::Low);
        assert_eq!(Utilization::from_avg_cpu(30.0), Utilization::Moderate);
        assert_eq!(Utilization::from_avg_cpu(60.0), Utilization::Moderate);
        assert_eq!(Utilization::from_avg_cpu(60.1), Utilization::Good);
    }

    #[test]
    fn empty_results() {
        assert_eq!(render(&[]), "No results to display\n");
    }

    #[test]
    fn renders_success_failure_and_analysis() {
        let text = render(&[
            ok_record("short_prompt_warmup", 55.0, 49),
            BenchmarkRecord::failed("code_generation", "API returned status 500"),
        ]);
        assert!(text.contains("Test: short_prompt_warmup\n  Status: SUCCESS"));
        assert!(text.contains("Tokens: 10 prompt + 20 completion"));
        assert!(text.contains("Status: FAILED\n  Error: API returned status 500"));
        assert!(text.contains("Successful: 1\nFailed: 1"));
        assert!(text.contains("Expected with 48 threads: ~50% (48/96 cores)"));
        assert!(text.contains("Actual Threads Used: 49"));
        assert!(text.ends_with("Moderate CPU utilization\n"));
    }

    #[test]
    fn all_failed_skips_summary() {
        let text = render(&[BenchmarkRecord::failed("a", "refused")]);
        assert!(!text.contains("SUMMARY"));
    }

    #[test]
    fn export_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchmark_results.json");
        let report = BenchmarkReport::new(vec![ok_record("a", 70.0, 48)]).with_system_info(system());

        export_json(&path, &report).unwrap();

        let written: BenchmarkReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);
        assert_eq!(written.system_info.unwrap().cpu_count, 96);
    }
}
