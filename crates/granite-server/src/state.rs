use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use granite_core::{BenchConfig, RunOutcome, TriggerServerConfig};

use crate::job::{LiveSuite, SuiteRunner};

#[derive(Debug, Default)]
struct JobState {
    running: bool,
    latest: Option<RunOutcome>,
}

pub struct AppState {
    job: Mutex<JobState>,
    pub runner: Arc<dyn SuiteRunner>,
    pub server: TriggerServerConfig,
    pub bench: BenchConfig,
}

impl AppState {
    pub fn new(server: TriggerServerConfig, bench: BenchConfig) -> Self {
        Self::with_runner(server, bench, Arc::new(LiveSuite))
    }

    pub fn with_runner(
        server: TriggerServerConfig,
        bench: BenchConfig,
        runner: Arc<dyn SuiteRunner>,
    ) -> Self {
        Self {
            job: Mutex::new(JobState::default()),
            runner,
            server,
            bench,
        }
    }

    fn job(&self) -> MutexGuard<'_, JobState> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the single run slot. Returns false when a run is already in progress.
    pub fn try_begin(&self) -> bool {
        let mut job = self.job();
        if job.running {
            return false;
        }
        job.running = true;
        true
    }

    pub fn finish(&self, outcome: RunOutcome) {
        let mut job = self.job();
        job.latest = Some(outcome);
        job.running = false;
    }

    /// `(running, has_results)` read under one lock
    pub fn status(&self) -> (bool, bool) {
        let job = self.job();
        (job.running, job.latest.is_some())
    }

    pub fn latest(&self) -> Option<RunOutcome> {
        self.job().latest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_run_at_a_time() {
        let state = AppState::new(TriggerServerConfig::default(), BenchConfig::default());
        assert!(state.try_begin());
        assert!(!state.try_begin());
        assert_eq!(state.status(), (true, false));

        state.finish(RunOutcome::failed("connection refused"));
        assert_eq!(state.status(), (false, true));
        assert!(state.try_begin());
    }
}
