//! Direct Route 客户端
//!
//! Direct Route 服务的 Bundle 提交客户端：一组类型化的 JSON-RPC 调用，
//! 传输层由 `ethers` 提供。
//!
//! ## 模块结构
//!
//! - `client`: 客户端本体，每个方法对应一个远程方法
//! - `types`: 请求/响应类型
//! - `builder`: Bundle 请求参数构建器
//! - `context`: 调用上下文（取消 + 截止时间）
//! - `transport`: 带 `Request-Source` 请求头的 HTTP 传输层，以及 WebSocket
//!
//! ## 远程方法
//!
//! ```text
//! eth_sendBundle          SendBundleArgs -> H256
//! eth_bundlePrice         ()             -> U256
//! txpool_getBundleByHash  H256           -> Bundle
//! eth_validatorStatus     ()             -> Status
//! ```

mod builder;
mod client;
mod context;
mod error;
pub mod serde_helpers;
mod transport;
mod types;

pub use builder::BundleArgsBuilder;
pub use client::{methods, DirectRouteClient};
pub use context::CallContext;
pub use error::{CancelCause, DirectRouteError, Result};
pub use transport::{
    DialOptions, DialedTransport, DialedTransportError, RequestSourceHttp, DEFAULT_REQUEST_TIMEOUT,
    REQUEST_SOURCE, REQUEST_SOURCE_HEADER,
};
pub use types::{Bundle, BundleTransaction, SendBundleArgs, Status};

/// 通过 `dial` 建立的客户端
pub type DialedDirectRouteClient = DirectRouteClient<DialedTransport>;
