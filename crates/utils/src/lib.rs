mod logger;
mod api_stats;

pub use logger::{LoggerManager, RPC_STATS_TARGET, BUNDLE_TARGET};
pub use api_stats::{
    record_rpc_request, record_rpc_failure,
    get_api_stats, log_api_stats, ApiStatsSnapshot, CounterSnapshot,
};
