//! 启动辅助：panic hook 与退出信号

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 设置全局 panic hook
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("========================================");
        error!("!!! Demo 发生 PANIC !!!");
        error!("========================================");
        if let Some(location) = panic_info.location() {
            error!(
                "发生位置: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            error!("Panic 消息: {}", s);
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            error!("Panic 消息: {}", s);
        }
        error!("========================================");
    }));
}

/// 监听 Ctrl-C，收到后取消 `token`
///
/// 所有以该令牌派生的调用上下文随之取消，正在进行的 RPC 调用返回取消错误。
pub fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("收到 Ctrl-C，正在取消进行中的请求..."),
                    Err(e) => {
                        warn!("无法监听 Ctrl-C 信号: {}", e);
                        return;
                    }
                }
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}
