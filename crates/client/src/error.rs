//! 客户端错误类型

use ethers::providers::ProviderError;
use std::fmt;
use thiserror::Error;

/// 取消原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// 调用方主动取消
    Token,
    /// 超过截止时间
    Deadline,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelCause::Token => write!(f, "context cancelled"),
            CancelCause::Deadline => write!(f, "deadline exceeded"),
        }
    }
}

/// Direct Route 客户端错误
#[derive(Debug, Error)]
pub enum DirectRouteError {
    #[error("Connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("{operation} aborted: {cause}")]
    Cancelled {
        operation: &'static str,
        cause: CancelCause,
    },

    #[error("RPC call {method} failed: {source}")]
    Rpc {
        method: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("Client closed, cannot call {method}")]
    Closed { method: &'static str },
}

impl DirectRouteError {
    /// 是否由取消或超时引起
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DirectRouteError::Cancelled { .. })
    }

    /// 出错的远程方法名（连接错误没有方法名）
    pub fn method(&self) -> Option<&'static str> {
        match self {
            DirectRouteError::Cancelled { operation, .. } => Some(operation),
            DirectRouteError::Rpc { method, .. } | DirectRouteError::Closed { method } => {
                Some(method)
            }
            DirectRouteError::Connection { .. } => None,
        }
    }

    pub(crate) fn connection(endpoint: &str, reason: impl fmt::Display) -> Self {
        DirectRouteError::Connection {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = DirectRouteError> = std::result::Result<T, E>;
