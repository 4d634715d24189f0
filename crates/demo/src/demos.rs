//! Direct Route 演示流程
//!
//! - `bundle_price_demo`: 查询 Bundle 价格
//! - `status_demo`: 查询验证者状态
//! - `get_bundle_demo`: 按哈希查询 Bundle
//! - `send_native_by_bundle_demo`: 两个账户互转原生币，两笔交易要么都成功要么都失败
//! - `send_token_by_bundle_demo`: 两个账户互转 BEP-20 代币，第二笔允许失败，
//!   Bundle 只在 [now+min_delay, now+max_delay] 内有效

use anyhow::{bail, Context, Result};
use config_crate::DemoConfig;
use direct_route::{
    BundleArgsBuilder, CallContext, DialOptions, DialedDirectRouteClient, SendBundleArgs,
    REQUEST_SOURCE,
};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, BlockNumber, H256, U256};
use ethers::utils::{format_units, parse_units};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use utils::BUNDLE_TARGET;

use crate::account::{ExtAccount, SignedTransfer};
use crate::bep20::{transfer_calldata, Bep20Token};

/// 演示运行环境
pub struct DemoEnv {
    pub config: DemoConfig,
    pub direct: DialedDirectRouteClient,
    pub chain: Arc<Provider<Http>>,
    pub ctx: CallContext,
}

impl DemoEnv {
    pub async fn new(config: DemoConfig, ctx: CallContext) -> Result<Self> {
        let options = DialOptions {
            request_source: Some(
                config
                    .direct_route
                    .request_source
                    .clone()
                    .unwrap_or_else(|| REQUEST_SOURCE.to_string()),
            ),
            request_timeout: Some(Duration::from_secs(config.direct_route.timeout_secs)),
        };
        let direct =
            DialedDirectRouteClient::dial_with_options(&ctx, &config.direct_route.url, &options)
                .await
                .context("连接 Direct Route 失败")?;

        let chain = Provider::<Http>::try_from(config.chain.rpc_url.as_str())
            .with_context(|| format!("无效的链 RPC 地址: {}", config.chain.rpc_url))?;

        info!(
            "🔗 Direct Route: {} | 链: {} (chain_id={}) | RPC: {}",
            config.direct_route.url, config.chain.name, config.chain.chain_id, config.chain.rpc_url
        );

        Ok(Self {
            config,
            direct,
            chain: Arc::new(chain),
            ctx,
        })
    }

    pub fn close(&self) {
        self.direct.close();
    }

    fn accounts(&self) -> Result<(ExtAccount, ExtAccount)> {
        let chain_id = self.config.chain.chain_id;
        let key1 = self
            .config
            .accounts
            .account1_private_key
            .as_deref()
            .context("ACCOUNT1_PRIVATE_KEY not set")?;
        let key2 = self
            .config
            .accounts
            .account2_private_key
            .as_deref()
            .context("ACCOUNT2_PRIVATE_KEY not set")?;

        let account1 = ExtAccount::from_hex_key(key1, chain_id).context("ACCOUNT1_PRIVATE_KEY")?;
        let account2 = ExtAccount::from_hex_key(key2, chain_id).context("ACCOUNT2_PRIVATE_KEY")?;
        Ok((account1, account2))
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256> {
        let nonce = tokio::select! {
            _ = self.ctx.token().cancelled() => bail!("查询 nonce 已取消"),
            nonce = self.chain.get_transaction_count(address, Some(BlockNumber::Pending.into())) => nonce,
        };
        nonce.with_context(|| format!("查询 {:?} 的 pending nonce 失败", address))
    }
}

/// 查询 Bundle 价格
pub async fn bundle_price_demo(env: &DemoEnv) -> Result<U256> {
    let price = env.direct.bundle_price(&env.ctx).await?;
    info!(
        "💰 Bundle 价格: {} wei ({} Gwei)",
        price,
        format_units(price, "gwei").unwrap_or_else(|_| "?".to_string())
    );
    Ok(price)
}

/// 查询验证者状态
pub async fn status_demo(env: &DemoEnv) -> Result<()> {
    let status = env.direct.get_status(&env.ctx).await?;
    info!("📊 Direct Route 状态: {}", status.status);

    let mut validators: Vec<_> = status.validators.iter().collect();
    validators.sort();
    for (validator, state) in validators {
        info!("   验证者 {} -> {}", validator, state);
    }
    Ok(())
}

/// 按哈希查询 Bundle 并打印
pub async fn get_bundle_demo(env: &DemoEnv, hash: &str) -> Result<()> {
    let hash = H256::from_str(hash.trim()).map_err(|e| anyhow::anyhow!("无效的 Bundle 哈希 {:?}: {:?}", hash, e))?;
    let bundle = env.direct.get_bundle_by_hash(&env.ctx, hash).await?;
    info!(target: BUNDLE_TARGET, "Bundle {:?}: {}", hash, serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

/// 两个账户互转原生币
pub async fn send_native_by_bundle_demo(env: &DemoEnv) -> Result<()> {
    let (account1, account2) = env.accounts()?;
    let price = env.direct.bundle_price(&env.ctx).await?;

    let n1 = env.pending_nonce(account1.address()).await?;
    let n2 = env.pending_nonce(account2.address()).await?;

    let value: U256 = parse_units(env.config.transfer.value_gwei, "gwei")?.into();
    let gas_limit = env.config.transfer.native_gas_limit;

    let tx1 = account1.sign_transfer(account2.address(), value, None, n1, gas_limit, price)?;
    let tx2 = account2.sign_transfer(account1.address(), value, None, n2, gas_limit, price)?;

    info!(
        "📦 原生币 Bundle: {:?} -> {:?} / {:?} -> {:?}, 每笔 {} Gwei {}",
        account1.address(),
        account2.address(),
        account2.address(),
        account1.address(),
        env.config.transfer.value_gwei,
        env.config.chain.native_token
    );

    let args = BundleArgsBuilder::new()
        .push_transaction(tx1.raw.clone())
        .push_transaction(tx2.raw.clone())
        .max_timestamp(unix_now() + env.config.polling.max_delay_secs)
        .build();

    submit_and_confirm(env, &args, &[&tx1, &tx2], env.config.polling.native_attempts).await
}

/// 两个账户互转 BEP-20 代币，第二笔交易允许回滚
pub async fn send_token_by_bundle_demo(env: &DemoEnv) -> Result<()> {
    let (account1, account2) = env.accounts()?;
    let token_address = Address::from_str(&env.config.transfer.token_address)
        .with_context(|| format!("无效的代币地址: {}", env.config.transfer.token_address))?;

    let token = Bep20Token::new(token_address, env.chain.clone());
    match token.symbol().call().await {
        Ok(symbol) => info!("🪙 代币: {} ({:?})", symbol, token_address),
        Err(e) => warn!("查询代币符号失败 {:?}: {}", token_address, e),
    }

    let price = env.direct.bundle_price(&env.ctx).await?;
    let n1 = env.pending_nonce(account1.address()).await?;
    let n2 = env.pending_nonce(account2.address()).await?;

    let amount = U256::from(env.config.transfer.token_amount);
    let gas_limit = env.config.transfer.token_gas_limit;

    let data1 = transfer_calldata(account2.address(), amount);
    let data2 = transfer_calldata(account1.address(), amount);

    let tx1 = account1.sign_transfer(token_address, U256::zero(), Some(data1), n1, gas_limit, price)?;
    let tx2 = account2.sign_transfer(token_address, U256::zero(), Some(data2), n2, gas_limit, price)?;

    let now = unix_now();
    let args = BundleArgsBuilder::new()
        .push_transaction(tx1.raw.clone())
        .push_transaction(tx2.raw.clone())
        .min_timestamp(now + env.config.polling.min_delay_secs)
        .max_timestamp(now + env.config.polling.max_delay_secs)
        .allow_revert(tx2.hash)
        .build();

    info!(
        "📦 代币 Bundle: 数量 {} | 生效窗口 [{}, {}] | 允许回滚 {:?}",
        amount,
        now + env.config.polling.min_delay_secs,
        now + env.config.polling.max_delay_secs,
        tx2.hash
    );

    submit_and_confirm(env, &args, &[&tx1, &tx2], env.config.polling.token_attempts).await
}

/// 发送 Bundle，回查并等待所有交易上链
async fn submit_and_confirm(
    env: &DemoEnv,
    args: &SendBundleArgs,
    txs: &[&SignedTransfer],
    attempts: u32,
) -> Result<()> {
    let bundle_hash = env.direct.send_bundle(&env.ctx, args).await.context("发送 Bundle 失败")?;
    info!("✅ Bundle 发送成功, hash {:?}", bundle_hash);

    let bundle = env
        .direct
        .get_bundle_by_hash(&env.ctx, bundle_hash)
        .await
        .context("查询 Bundle 失败")?;
    info!(target: BUNDLE_TARGET, "Bundle {:?}: {}", bundle_hash, serde_json::to_string(&bundle)?);

    let hashes: Vec<H256> = txs.iter().map(|tx| tx.hash).collect();
    if wait_for_receipts(env, &hashes, attempts).await? {
        info!("🎉 Bundle 已上链确认");
        Ok(())
    } else {
        bail!("Bundle 未能在 {} 次查询内上链确认", attempts)
    }
}

/// 轮询交易回执，全部找到返回 `true`，次数用完返回 `false`
async fn wait_for_receipts(env: &DemoEnv, hashes: &[H256], attempts: u32) -> Result<bool> {
    let interval = Duration::from_secs(env.config.polling.interval_secs);

    for attempt in 1..=attempts {
        let mut confirmed = 0;
        for hash in hashes {
            match env.chain.get_transaction_receipt(*hash).await {
                Ok(Some(receipt)) => {
                    debug!("交易 {:?} 已打包, 区块 {:?}, 状态 {:?}", hash, receipt.block_number, receipt.status);
                    confirmed += 1;
                }
                Ok(None) => {}
                Err(e) => debug!("查询回执失败 {:?}: {}", hash, e),
            }
        }

        if confirmed == hashes.len() {
            return Ok(true);
        }
        debug!("第 {}/{} 次查询: {}/{} 笔交易已上链", attempt, attempts, confirmed, hashes.len());

        tokio::select! {
            _ = env.ctx.token().cancelled() => bail!("等待交易回执已取消"),
            _ = tokio::time::sleep(interval) => {}
        }
    }

    Ok(false)
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
