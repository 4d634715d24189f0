use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, fmt, Layer};
use tracing_subscriber::filter::{EnvFilter, FilterFn};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_appender::{non_blocking, rolling};
use time::macros::offset;

/// RPC 统计日志的 target
pub const RPC_STATS_TARGET: &str = "rpc_stats";
/// Bundle 生命周期日志的 target（发送、查询、上链确认）
pub const BUNDLE_TARGET: &str = "bundle";

/// 日志管理器 - 基于target分类的日志系统
pub struct LoggerManager {
    _guards: Vec<non_blocking::WorkerGuard>,
}

impl LoggerManager {
    /// 初始化日志系统
    ///
    /// - `level`: `RUST_LOG` 风格的过滤指令，如 `info` 或 `info,direct_route=debug`，
    ///   无法解析时使用 info
    /// - `log_dir`: 日志目录
    ///
    /// 日志分类：
    /// - app.log: 通用应用日志
    /// - rpc_stats.log: RPC 请求统计专用日志
    /// - bundle.log: Bundle 发送与确认日志
    pub fn init(level: &str, log_dir: &str) -> Self {
        let mut guards = Vec::new();

        // 创建日志目录
        fs::create_dir_all(log_dir).ok();

        // 配置时区为东八区 (UTC+8 上海时间)
        let timer = OffsetTime::new(
            offset!(+8),
            time::format_description::well_known::Rfc3339,
        );

        // 1. 控制台输出，rpc_stats 只输出 INFO 及以上的汇总
        let console_layer = fmt::layer()
            .compact()
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(Self::build_filter(level))
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() != RPC_STATS_TARGET || metadata.level() <= &tracing::Level::INFO
            }));

        // 2. 通用应用日志 (app.log)
        let (app_writer, app_guard) = non_blocking(rolling::daily(log_dir, "app.log"));
        guards.push(app_guard);

        let app_layer = fmt::layer()
            .compact()
            .with_writer(app_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(Self::build_filter(level))
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() != RPC_STATS_TARGET
            }));

        // 3. RPC 统计日志 (rpc_stats.log)
        let (rpc_stats_writer, rpc_stats_guard) =
            non_blocking(rolling::daily(log_dir, "rpc_stats.log"));
        guards.push(rpc_stats_guard);

        let rpc_stats_layer = fmt::layer()
            .compact()
            .with_writer(rpc_stats_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() == RPC_STATS_TARGET
            }));

        // 4. Bundle 日志 (bundle.log)，同时也会进入 app.log
        let (bundle_writer, bundle_guard) = non_blocking(rolling::daily(log_dir, "bundle.log"));
        guards.push(bundle_guard);

        let bundle_layer = fmt::layer()
            .compact()
            .with_writer(bundle_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer)
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() == BUNDLE_TARGET
            }));

        // 初始化tracing订阅器
        tracing_subscriber::registry()
            .with(console_layer)
            .with(app_layer)
            .with(rpc_stats_layer)
            .with(bundle_layer)
            .init();

        Self { _guards: guards }
    }

    fn build_filter(directives: &str) -> EnvFilter {
        EnvFilter::try_new(directives.trim()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        assert_eq!(LoggerManager::build_filter(" debug ").to_string(), "debug");

        let filter = LoggerManager::build_filter("info,direct_route=debug").to_string();
        assert!(filter.contains("direct_route=debug"));
        assert!(filter.contains("info"));

        // 无法解析的级别回退到 info
        assert_eq!(LoggerManager::build_filter("direct_route=loud").to_string(), "info");
    }
}
