pub mod benchmark;
pub mod config;
pub mod embed;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod similarity;

pub use benchmark::{
    timestamp, BenchmarkRecord, BenchmarkReport, BenchmarkSummary, ResourceStats, RunOutcome,
    SystemInfo,
};
pub use config::{
    AgentSmokeConfig, BenchConfig, EmbedServerConfig, TriggerServerConfig,
    DEFAULT_QUERY_INSTRUCTION,
};
pub use embed::{format_query, EmbedRequest, EmbedResponse};
pub use error::{GraniteError, Result};
