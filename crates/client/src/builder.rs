//! Bundle 构建器
//!
//! 用于构建 `eth_sendBundle` 的请求参数

use ethers::types::{Bytes, H256, U64};

use crate::types::SendBundleArgs;

/// Bundle 构建器
///
/// 未设置的约束保持缺省，不会以 0 值发送给服务端。
#[derive(Debug, Clone, Default)]
pub struct BundleArgsBuilder {
    /// 签名后的交易列表
    txs: Vec<Bytes>,
    /// 最大区块号
    max_block_number: Option<u64>,
    /// 最小时间戳
    min_timestamp: Option<u64>,
    /// 最大时间戳
    max_timestamp: Option<u64>,
    /// 允许回滚的交易哈希
    reverting_tx_hashes: Vec<H256>,
}

impl BundleArgsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置最大区块号（超过此区块后 Bundle 失效）
    pub fn max_block_number(mut self, block: u64) -> Self {
        self.max_block_number = Some(block);
        self
    }

    /// 添加签名后的交易
    pub fn push_transaction(mut self, signed_tx: impl Into<Bytes>) -> Self {
        self.txs.push(signed_tx.into());
        self
    }

    /// 添加多笔签名后的交易
    pub fn push_transactions(mut self, signed_txs: impl IntoIterator<Item = Bytes>) -> Self {
        self.txs.extend(signed_txs);
        self
    }

    /// 设置最小时间戳（Bundle 只在此时间之后有效）
    pub fn min_timestamp(mut self, timestamp: u64) -> Self {
        self.min_timestamp = Some(timestamp);
        self
    }

    /// 设置最大时间戳（Bundle 只在此时间之前有效）
    pub fn max_timestamp(mut self, timestamp: u64) -> Self {
        self.max_timestamp = Some(timestamp);
        self
    }

    /// 添加允许回滚的交易哈希
    /// 这些交易失败时整个 Bundle 仍然有效
    pub fn allow_revert(mut self, tx_hash: H256) -> Self {
        if !self.reverting_tx_hashes.contains(&tx_hash) {
            self.reverting_tx_hashes.push(tx_hash);
        }
        self
    }

    /// 构建请求参数
    pub fn build(self) -> SendBundleArgs {
        SendBundleArgs {
            txs: self.txs,
            max_block_number: self.max_block_number.map(U64::from),
            min_timestamp: self.min_timestamp,
            max_timestamp: self.max_timestamp,
            reverting_tx_hashes: self.reverting_tx_hashes,
        }
    }

    /// 获取交易数量
    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }

    /// 检查 Bundle 是否为空
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}
