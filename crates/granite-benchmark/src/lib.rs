pub mod agent;
pub mod chat;
pub mod embed_client;
pub mod monitor;
pub mod report;
pub mod runner;
pub mod suite;

#[cfg(test)]
mod test_support;

pub use agent::{run_smoke, AgentRunner, AgentProfile, SmokeOutcome, AgentTask};
pub use chat::{ChatClient, ChatCompletion};
pub use embed_client::{EmbedClient, TimedEmbedding};
pub use monitor::{process_thread_count, system_info, ResourceMonitor};
pub use report::{export_json, print_results, write_results, Utilization};
pub use runner::BenchmarkRunner;
pub use suite::{TestCase, DEFAULT_SUITE, DEFAULT_TEMPERATURE};
