use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use granite_core::{BenchConfig, GraniteError, ResourceStats, Result, SystemInfo};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::{debug, instrument, warn};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Default)]
struct Samples {
    cpu: Vec<f64>,
    memory_gb: Vec<f64>,
}

/// Samples host CPU and memory on a background thread between `start` and `stop`
pub struct ResourceMonitor {
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Samples>>,
}

impl ResourceMonitor {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(Duration::from_millis(config.sample_interval_ms))
    }

    #[instrument(skip(self), fields(interval_ms = self.poll_interval.as_millis()))]
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            self.stop();
        }

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let interval = self.poll_interval;

        let handle = thread::Builder::new()
            .name("resource-monitor".to_string())
            .spawn(move || sample_loop(&running, interval))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                GraniteError::Monitor(e.to_string())
            })?;

        self.handle = Some(handle);
        debug!("Resource monitor started");
        Ok(())
    }

    pub fn stop(&mut self) -> ResourceStats {
        self.running.store(false, Ordering::SeqCst);

        let samples = match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                warn!("Resource monitor thread panicked");
                Samples::default()
            }),
            None => Samples::default(),
        };

        debug!(
            cpu_samples = samples.cpu.len(),
            memory_samples = samples.memory_gb.len(),
            "Resource monitor stopped"
        );
        ResourceStats::from_samples(&samples.cpu, &samples.memory_gb)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn sample_loop(running: &AtomicBool, interval: Duration) -> Samples {
    let mut sys = System::new();
    let mut samples = Samples::default();

    // CPU usage is the delta between two refreshes
    sys.refresh_cpu_usage();

    while running.load(Ordering::SeqCst) {
        thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
        samples.cpu.push(sys.global_cpu_usage() as f64);

        sys.refresh_memory();
        samples.memory_gb.push(sys.used_memory() as f64 / GIB);

        thread::sleep(interval);
    }

    samples
}

/// Thread count of the first process whose name contains `name`, or 0 when none matches
pub fn process_thread_count(name: &str) -> u32 {
    let mut sys = System::new();
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::everything());

    sys.processes()
        .values()
        .find(|p| p.name().to_string_lossy().contains(name))
        .and_then(|p| p.tasks().map(|tasks| tasks.len() as u32))
        .unwrap_or(0)
}

pub fn system_info() -> SystemInfo {
    let mut sys = System::new_all();
    sys.refresh_all();

    SystemInfo {
        cpu_count: sys.cpus().len(),
        total_memory_gb: sys.total_memory() as f64 / GIB,
    }
}
