//! 调用上下文
//!
//! 每次 RPC 调用都带一个 `CallContext`，用于取消和设置截止时间。
//! 取消一个上下文只影响在该上下文（及其子上下文）下进行的调用。

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CancelCause, DirectRouteError, Result};

/// 调用上下文：取消令牌 + 可选截止时间
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// 永不取消、没有截止时间的上下文
    pub fn background() -> Self {
        Self::default()
    }

    /// 使用外部的取消令牌（例如进程级的 Ctrl-C 令牌）
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// 从现在起 `timeout` 后超时
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// 设置截止时间，已有更早的截止时间时保留更早的那个
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// 派生子上下文：父上下文取消会传递给子上下文，反之不会
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 上下文已结束的原因，未结束时返回 `None`
    pub fn done_cause(&self) -> Option<CancelCause> {
        if self.token.is_cancelled() {
            return Some(CancelCause::Token);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(CancelCause::Deadline),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done_cause().is_some()
    }

    /// 在上下文约束下执行 `fut`
    ///
    /// 取消或超时先发生时丢弃 `fut` 并返回 `Cancelled`。
    pub(crate) async fn run<F, T>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(cause) = self.done_cause() {
            return Err(DirectRouteError::Cancelled { operation, cause });
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(DirectRouteError::Cancelled {
                operation,
                cause: CancelCause::Token,
            }),
            _ = deadline => Err(DirectRouteError::Cancelled {
                operation,
                cause: CancelCause::Deadline,
            }),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn never() -> Result<u64> {
        std::future::pending().await
    }

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = CallContext::background();
        let value = ctx.run("test", async { Ok(7u64) }).await.unwrap();
        assert_eq!(value, 7);
        assert!(!ctx.is_done());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let ctx = CallContext::background();
        ctx.cancel();

        let err = ctx.run("test", never()).await.unwrap_err();
        assert!(matches!(
            err,
            DirectRouteError::Cancelled { operation: "test", cause: CancelCause::Token }
        ));
    }

    #[tokio::test]
    async fn test_deadline_aborts_pending_call() {
        let ctx = CallContext::background().with_timeout(Duration::from_millis(20));

        let err = ctx.run("test", never()).await.unwrap_err();
        assert!(matches!(err, DirectRouteError::Cancelled { cause: CancelCause::Deadline, .. }));
    }

    #[tokio::test]
    async fn test_cancel_while_in_flight() {
        let ctx = CallContext::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = ctx.run("test", never()).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = CallContext::background();
        let child = parent.child();

        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());

        let other_child = parent.child();
        parent.cancel();
        assert!(other_child.is_done());
    }

    #[tokio::test]
    async fn test_with_deadline_keeps_earliest() {
        let now = Instant::now();
        let ctx = CallContext::background()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }
}
