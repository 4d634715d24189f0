//! Direct Route 客户端
//!
//! 每个方法对应一个远程 RPC 方法，只做一次往返：
//! 不重试、不缓存、不做本地校验，业务规则全部由服务端负责。

use ethers::providers::JsonRpcClient;
use ethers::types::{H256, U256};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::context::CallContext;
use crate::error::{DirectRouteError, Result};
use crate::serde_helpers::Quantity;
use crate::transport::{DialOptions, DialedTransport};
use crate::types::{Bundle, SendBundleArgs, Status};

/// 远程方法名
pub mod methods {
    pub const SEND_BUNDLE: &str = "eth_sendBundle";
    pub const BUNDLE_PRICE: &str = "eth_bundlePrice";
    pub const GET_BUNDLE_BY_HASH: &str = "txpool_getBundleByHash";
    pub const VALIDATOR_STATUS: &str = "eth_validatorStatus";
}

/// Direct Route 客户端
///
/// 持有一个 `JsonRpcClient` 传输层。`close` 之后新的调用返回
/// `DirectRouteError::Closed`；`close` 之前已经发出的调用持有自己的
/// 传输层引用，会正常完成。
pub struct DirectRouteClient<P> {
    transport: RwLock<Option<Arc<P>>>,
}

impl DirectRouteClient<DialedTransport> {
    /// 连接到 `endpoint`（http/https/ws/wss），使用默认选项
    pub async fn dial(endpoint: &str) -> Result<Self> {
        Self::dial_with_context(&CallContext::background(), endpoint).await
    }

    /// 连接到 `endpoint`，上下文在连接完成前取消或超时则返回 `Cancelled`
    pub async fn dial_with_context(ctx: &CallContext, endpoint: &str) -> Result<Self> {
        Self::dial_with_options(ctx, endpoint, &DialOptions::default()).await
    }

    pub async fn dial_with_options(
        ctx: &CallContext,
        endpoint: &str,
        options: &DialOptions,
    ) -> Result<Self> {
        let transport = ctx
            .run("dial", DialedTransport::connect(endpoint, options))
            .await?;
        debug!(
            "Direct Route 客户端初始化: endpoint={}, ws={}, request_source={:?}",
            endpoint,
            transport.is_ws(),
            options.request_source
        );

        Ok(Self::new(transport))
    }
}

impl<P: JsonRpcClient> DirectRouteClient<P> {
    /// 包装一个已建立的传输层，不发起任何网络请求
    pub fn new(transport: P) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// 与其它组件共享同一个传输层
    pub fn from_shared(transport: Arc<P>) -> Self {
        Self {
            transport: RwLock::new(Some(transport)),
        }
    }

    /// 当前传输层，已关闭时返回 `None`
    pub fn transport(&self) -> Option<Arc<P>> {
        self.transport.read().clone()
    }

    /// 发送 Bundle，返回服务端分配的 Bundle 哈希
    pub async fn send_bundle(&self, ctx: &CallContext, args: &SendBundleArgs) -> Result<H256> {
        self.call(ctx, methods::SEND_BUNDLE, [args]).await
    }

    /// 当前 Bundle 价格（构造 Bundle 交易时使用的 gas price）
    pub async fn bundle_price(&self, ctx: &CallContext) -> Result<U256> {
        let price: Quantity = self.call(ctx, methods::BUNDLE_PRICE, ()).await?;
        Ok(price.into_inner())
    }

    /// 按哈希查询 Bundle
    ///
    /// 服务端不区分“不存在”和其它错误，任何错误都应视为“无法获取”。
    pub async fn get_bundle_by_hash(&self, ctx: &CallContext, hash: H256) -> Result<Bundle> {
        self.call(ctx, methods::GET_BUNDLE_BY_HASH, [hash]).await
    }

    /// 验证者状态
    pub async fn get_status(&self, ctx: &CallContext) -> Result<Status> {
        self.call(ctx, methods::VALIDATOR_STATUS, ()).await
    }

    /// 释放传输层，可重复调用
    pub fn close(&self) {
        if self.transport.write().take().is_some() {
            debug!("Direct Route 客户端已关闭");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.transport.read().is_none()
    }

    async fn call<T, R>(&self, ctx: &CallContext, method: &'static str, params: T) -> Result<R>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let transport = self
            .transport()
            .ok_or(DirectRouteError::Closed { method })?;

        let started = Instant::now();
        let result = ctx
            .run(method, async move {
                transport
                    .request(method, params)
                    .await
                    .map_err(|e| DirectRouteError::Rpc {
                        method,
                        source: e.into(),
                    })
            })
            .await;

        match &result {
            Ok(_) => debug!("{} 完成, 耗时 {:?}", method, started.elapsed()),
            Err(e) => debug!("{} 失败, 耗时 {:?}: {}", method, started.elapsed(), e),
        }

        result
    }
}

impl<P> Debug for DirectRouteClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectRouteClient")
            .field("closed", &self.transport.read().is_none())
            .finish()
    }
}
