use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Direct Route 默认服务地址
pub const DEFAULT_DIRECT_ROUTE_URL: &str = "https://api.nodereal.io/direct-route";
/// BSC 主网 BUSD 合约
pub const DEFAULT_TOKEN_ADDRESS: &str = "0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56";

/// Demo 程序配置
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub chain: ChainConfig,
    pub direct_route: DirectRouteConfig,
    pub accounts: AccountsConfig,
    pub transfer: TransferConfig,
    pub polling: PollingConfig,
    pub log: LogConfig,
}

/// 支持的区块链枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedChain {
    Bsc = 56,
    BscTestnet = 97,
}

impl SupportedChain {
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            56 => Some(SupportedChain::Bsc),
            97 => Some(SupportedChain::BscTestnet),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SupportedChain::Bsc => "BSC",
            SupportedChain::BscTestnet => "BSC Testnet",
        }
    }

    pub fn native_token(&self) -> &'static str {
        match self {
            SupportedChain::Bsc => "BNB",
            SupportedChain::BscTestnet => "tBNB",
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            SupportedChain::Bsc => "https://bsc-dataseed.binance.org",
            SupportedChain::BscTestnet => "https://data-seed-prebsc-1-s1.binance.org:8545",
        }
    }
}

/// 链配置（用于查询 nonce 和交易回执）
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    /// 原生代币符号 (BNB/tBNB)
    pub native_token: String,
}

impl ChainConfig {
    pub fn for_chain(chain_id: u64, rpc_url: Option<String>) -> Self {
        match SupportedChain::from_chain_id(chain_id) {
            Some(chain) => Self {
                chain_id,
                name: chain.name().to_string(),
                rpc_url: rpc_url.unwrap_or_else(|| chain.default_rpc_url().to_string()),
                native_token: chain.native_token().to_string(),
            },
            None => Self {
                chain_id,
                name: format!("chain-{}", chain_id),
                rpc_url: rpc_url.unwrap_or_default(),
                native_token: "ETH".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectRouteConfig {
    /// Direct Route 服务地址
    pub url: String,
    /// `Request-Source` 请求头，`None` 使用客户端默认值
    pub request_source: Option<String>,
    /// 单次请求超时 (秒)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AccountsConfig {
    pub account1_private_key: Option<String>,
    pub account2_private_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// 原生币转账金额 (Gwei)
    pub value_gwei: u64,
    /// 原生币转账 gas limit
    pub native_gas_limit: u64,
    /// 代币转账 gas limit
    pub token_gas_limit: u64,
    /// BEP-20 代币合约地址
    pub token_address: String,
    /// 代币转账数量 (最小单位)
    pub token_amount: u64,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Bundle 最早生效时间 = 当前时间 + min_delay_secs（仅代币 Bundle 使用）
    pub min_delay_secs: u64,
    /// Bundle 过期时间 = 当前时间 + max_delay_secs
    pub max_delay_secs: u64,
    /// 查询交易回执的间隔 (秒)
    pub interval_secs: u64,
    /// 原生币 Bundle 最多查询次数
    pub native_attempts: u32,
    /// 代币 Bundle 最多查询次数
    pub token_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
}

impl DemoConfig {
    /// 从 `.env` 和环境变量加载
    pub fn load() -> Result<Self> {
        // 加载 .env 文件
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源解析配置，空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // 链配置
        let chain_id = parse_or(&get, "CHAIN_ID", 56u64)?;
        let chain = ChainConfig::for_chain(chain_id, get("BSC_RPC_URL"));
        if chain.rpc_url.is_empty() {
            anyhow::bail!("BSC_RPC_URL not set for unsupported chain {}", chain_id);
        }

        let direct_route = DirectRouteConfig {
            url: get("DIRECT_ROUTE_URL").unwrap_or_else(|| DEFAULT_DIRECT_ROUTE_URL.to_string()),
            request_source: get("REQUEST_SOURCE"),
            timeout_secs: parse_or(&get, "DIRECT_ROUTE_TIMEOUT_SECS", 30)?,
        };

        let accounts = AccountsConfig {
            account1_private_key: get("ACCOUNT1_PRIVATE_KEY"),
            account2_private_key: get("ACCOUNT2_PRIVATE_KEY"),
        };

        let transfer = TransferConfig {
            value_gwei: parse_or(&get, "TRANSFER_VALUE_GWEI", 100)?,
            native_gas_limit: parse_or(&get, "NATIVE_GAS_LIMIT", 23_000)?,
            token_gas_limit: parse_or(&get, "TOKEN_GAS_LIMIT", 70_000)?,
            token_address: get("TOKEN_ADDRESS").unwrap_or_else(|| DEFAULT_TOKEN_ADDRESS.to_string()),
            token_amount: parse_or(&get, "TOKEN_AMOUNT", 1)?,
        };

        let polling = PollingConfig {
            min_delay_secs: parse_or(&get, "BUNDLE_MIN_DELAY_SECS", 20)?,
            max_delay_secs: parse_or(&get, "BUNDLE_MAX_DELAY_SECS", 80)?,
            interval_secs: parse_or(&get, "RECEIPT_POLL_INTERVAL_SECS", 3)?,
            native_attempts: parse_or(&get, "NATIVE_POLL_ATTEMPTS", 21)?,
            token_attempts: parse_or(&get, "TOKEN_POLL_ATTEMPTS", 30)?,
        };

        let log = LogConfig {
            level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            dir: get("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        };

        Ok(Self {
            chain,
            direct_route,
            accounts,
            transfer,
            polling,
            log,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<DemoConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DemoConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.chain.chain_id, 56);
        assert_eq!(config.chain.native_token, "BNB");
        assert_eq!(config.chain.rpc_url, "https://bsc-dataseed.binance.org");
        assert_eq!(config.direct_route.url, DEFAULT_DIRECT_ROUTE_URL);
        assert_eq!(config.direct_route.request_source, None);
        assert_eq!(config.transfer.native_gas_limit, 23_000);
        assert_eq!(config.transfer.token_gas_limit, 70_000);
        assert_eq!(config.polling.max_delay_secs, 80);
        assert_eq!(config.polling.native_attempts, 21);
        assert_eq!(config.polling.token_attempts, 30);
        assert!(config.accounts.account1_private_key.is_none());
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let config = config_from(&[
            ("CHAIN_ID", "97"),
            ("DIRECT_ROUTE_URL", "http://localhost:9000"),
            ("REQUEST_SOURCE", "my-bot/1.0"),
            ("ACCOUNT1_PRIVATE_KEY", "  "),
            ("TOKEN_POLL_ATTEMPTS", "5"),
        ])
        .unwrap();

        assert_eq!(config.chain.name, "BSC Testnet");
        assert_eq!(config.direct_route.url, "http://localhost:9000");
        assert_eq!(config.direct_route.request_source.as_deref(), Some("my-bot/1.0"));
        assert!(config.accounts.account1_private_key.is_none());
        assert_eq!(config.polling.token_attempts, 5);
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[("NATIVE_GAS_LIMIT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("NATIVE_GAS_LIMIT"));
    }

    #[test]
    fn test_unknown_chain_requires_rpc() {
        assert!(config_from(&[("CHAIN_ID", "1337")]).is_err());

        let config = config_from(&[("CHAIN_ID", "1337"), ("BSC_RPC_URL", "http://localhost:8545")])
            .unwrap();
        assert_eq!(config.chain.name, "chain-1337");
    }
}
