//! Direct Route 类型定义

use ethers::types::{Address, Bytes, H256, U256, U64};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::serde_helpers::{
    deserialize_quantity, deserialize_quantity_opt, deserialize_u64_quantity, null_as_default,
};

/// `eth_sendBundle` 请求参数
///
/// 所有可选字段在缺省时都不会出现在请求里，服务端据此区分
/// “没有约束”和“约束为 0”。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBundleArgs {
    /// 签名后的交易（按执行顺序）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txs: Vec<Bytes>,
    /// Bundle 可被打包的最大区块号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_block_number: Option<U64>,
    /// 最小时间戳（秒，含）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_timestamp: Option<u64>,
    /// 最大时间戳（秒，含）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timestamp: Option<u64>,
    /// 允许回滚的交易哈希，不在此列表中的交易失败会使整个 Bundle 失效
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reverting_tx_hashes: Vec<H256>,
}

/// 服务端保存的 Bundle
///
/// 服务端用 Go 结构体字段名直接编码（`Txs`、`MaxBlockNumber` ...），
/// 这里同时接受 camelCase 和 PascalCase。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "txs", alias = "Txs", default, deserialize_with = "null_as_default")]
    pub txs: Vec<BundleTransaction>,
    #[serde(
        rename = "maxBlockNumber",
        alias = "MaxBlockNumber",
        default,
        deserialize_with = "deserialize_quantity_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_block_number: Option<U256>,
    #[serde(
        rename = "minTimestamp",
        alias = "MinTimestamp",
        default,
        deserialize_with = "deserialize_u64_quantity"
    )]
    pub min_timestamp: u64,
    #[serde(
        rename = "maxTimestamp",
        alias = "MaxTimestamp",
        default,
        deserialize_with = "deserialize_u64_quantity"
    )]
    pub max_timestamp: u64,
    #[serde(
        rename = "revertingTxHashes",
        alias = "RevertingTxHashes",
        default,
        deserialize_with = "null_as_default"
    )]
    pub reverting_tx_hashes: Vec<H256>,
    #[serde(rename = "hash", alias = "Hash")]
    pub hash: H256,
    #[serde(
        rename = "price",
        alias = "Price",
        default,
        deserialize_with = "deserialize_quantity"
    )]
    pub price: U256,
}

impl Bundle {
    /// 交易是否被标记为允许回滚
    pub fn allows_revert(&self, tx_hash: &H256) -> bool {
        self.reverting_tx_hashes.contains(tx_hash)
    }

    pub fn tx_hashes(&self) -> Vec<H256> {
        self.txs.iter().map(|tx| tx.hash).collect()
    }
}

/// Bundle 内已解码的交易
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleTransaction {
    /// 交易类型 (0 = legacy, 1 = EIP-2930, 2 = EIP-1559)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U256>,
    #[serde(default)]
    pub nonce: U256,
    /// 合约创建交易没有接收者
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub gas: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub input: Bytes,
    #[serde(default)]
    pub v: U64,
    #[serde(default)]
    pub r: U256,
    #[serde(default)]
    pub s: U256,
    pub hash: H256,
}

/// 验证者状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub validators: HashMap<String, i64>,
}
