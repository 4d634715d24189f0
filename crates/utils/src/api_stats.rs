//! RPC 请求统计模块
//!
//! 统计发往 Direct Route 服务和链节点的 RPC 请求及失败次数

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

const ONE_SECOND: Duration = Duration::from_secs(1);
const ONE_MINUTE: Duration = Duration::from_secs(60);
const ONE_HOUR: Duration = Duration::from_secs(3600);

/// 各时间窗口内的事件数
#[derive(Debug, Clone, Copy, Default)]
struct WindowCounts {
    last_1s: u64,
    last_1m: u64,
    last_1h: u64,
    total: u64,
}

/// 时间窗口统计器，只保留最近一小时的时间戳
struct TimeWindowCounter {
    timestamps: RwLock<VecDeque<Instant>>,
    total: AtomicU64,
}

impl TimeWindowCounter {
    fn new() -> Self {
        Self {
            timestamps: RwLock::new(VecDeque::with_capacity(1024)),
            total: AtomicU64::new(0),
        }
    }

    fn record(&self) {
        let now = Instant::now();
        self.total.fetch_add(1, Ordering::Relaxed);

        let mut timestamps = self.timestamps.write();
        timestamps.push_back(now);
        Self::prune(&mut timestamps, now);
    }

    fn prune(timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) <= ONE_HOUR {
                break;
            }
            timestamps.pop_front();
        }
    }

    fn get_counts(&self) -> WindowCounts {
        let now = Instant::now();
        let timestamps = self.timestamps.read();

        let mut counts = WindowCounts {
            total: self.total.load(Ordering::Relaxed),
            ..Default::default()
        };

        // 时间戳按时间顺序排列，从最新的往回数
        for ts in timestamps.iter().rev() {
            let age = now.duration_since(*ts);
            if age > ONE_HOUR {
                break;
            }
            counts.last_1h += 1;
            if age <= ONE_MINUTE {
                counts.last_1m += 1;
            }
            if age <= ONE_SECOND {
                counts.last_1s += 1;
            }
        }

        counts
    }
}

/// RPC 统计器
pub struct ApiStats {
    /// 启动时间
    start_time: Instant,
    /// RPC 请求统计
    rpc: TimeWindowCounter,
    /// RPC 失败统计（传输失败或服务端返回错误）
    rpc_failures: TimeWindowCounter,
}

impl ApiStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            rpc: TimeWindowCounter::new(),
            rpc_failures: TimeWindowCounter::new(),
        }
    }

    /// 记录 RPC 请求
    pub fn record_rpc(&self) {
        self.rpc.record();
    }

    /// 记录 RPC 失败
    pub fn record_rpc_failure(&self) {
        self.rpc_failures.record();
    }

    /// 获取统计快照
    pub fn get_stats(&self) -> ApiStatsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();

        ApiStatsSnapshot {
            uptime_seconds: uptime,
            rpc: Self::snapshot(&self.rpc, uptime),
            rpc_failures: Self::snapshot(&self.rpc_failures, uptime),
        }
    }

    fn snapshot(counter: &TimeWindowCounter, uptime: u64) -> CounterSnapshot {
        let counts = counter.get_counts();
        let avg_per_sec = if uptime > 0 { counts.total as f64 / uptime as f64 } else { 0.0 };

        CounterSnapshot {
            last_1s: counts.last_1s,
            last_1m: counts.last_1m,
            last_1h: counts.last_1h,
            total: counts.total,
            avg_per_sec,
        }
    }

    /// 输出统计日志
    pub fn log_stats(&self) {
        let s = self.get_stats();

        info!(
            target: "rpc_stats",
            uptime_secs = s.uptime_seconds,
            rpc_1m = s.rpc.last_1m,
            rpc_total = s.rpc.total,
            rpc_avg = format!("{:.2}", s.rpc.avg_per_sec),
            failures_1m = s.rpc_failures.last_1m,
            failures_total = s.rpc_failures.total,
            "RPC统计"
        );
    }
}

impl Default for ApiStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 单项计数器快照
#[derive(Debug, Clone)]
pub struct CounterSnapshot {
    pub last_1s: u64,
    pub last_1m: u64,
    pub last_1h: u64,
    pub total: u64,
    pub avg_per_sec: f64,
}

/// RPC 统计快照
#[derive(Debug, Clone)]
pub struct ApiStatsSnapshot {
    pub uptime_seconds: u64,
    pub rpc: CounterSnapshot,
    pub rpc_failures: CounterSnapshot,
}

impl ApiStatsSnapshot {
    /// 失败率（0.0 - 1.0）
    pub fn failure_rate(&self) -> f64 {
        if self.rpc.total == 0 {
            0.0
        } else {
            self.rpc_failures.total as f64 / self.rpc.total as f64
        }
    }
}

impl std::fmt::Display for ApiStatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "运行{}s | RPC: {}次(avg {:.2}/s) | 失败: {}次({:.1}%)",
            self.uptime_seconds,
            self.rpc.total,
            self.rpc.avg_per_sec,
            self.rpc_failures.total,
            self.failure_rate() * 100.0,
        )
    }
}

/// 全局 RPC 统计实例
pub static API_STATS: Lazy<ApiStats> = Lazy::new(ApiStats::new);

/// 记录 RPC 请求
pub fn record_rpc_request() {
    API_STATS.record_rpc();
}

/// 记录 RPC 失败
pub fn record_rpc_failure() {
    API_STATS.record_rpc_failure();
}

/// 获取统计快照
pub fn get_api_stats() -> ApiStatsSnapshot {
    API_STATS.get_stats()
}

/// 输出统计日志
pub fn log_api_stats() {
    API_STATS.log_stats();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_stats() {
        let stats = ApiStats::new();

        for _ in 0..10 {
            stats.record_rpc();
        }
        for _ in 0..2 {
            stats.record_rpc_failure();
        }

        let snapshot = stats.get_stats();
        assert_eq!(snapshot.rpc.total, 10);
        assert_eq!(snapshot.rpc.last_1m, 10);
        assert_eq!(snapshot.rpc_failures.total, 2);
        assert!((snapshot.failure_rate() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failure_rate_without_requests() {
        let snapshot = ApiStats::new().get_stats();
        assert_eq!(snapshot.failure_rate(), 0.0);
        assert!(snapshot.to_string().contains("RPC: 0次"));
    }
}
