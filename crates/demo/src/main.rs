//! Direct Route 演示程序
//!
//! ```text
//! direct_route_demo price
//! direct_route_demo status
//! direct_route_demo get-bundle <HASH>
//! direct_route_demo send-native
//! direct_route_demo send-token
//! ```
//!
//! 配置从 `.env` 和环境变量读取。

mod account;
mod bep20;
mod bootstrap;
mod demos;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config_crate::DemoConfig;
use direct_route::CallContext;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use utils::{log_api_stats, LoggerManager};

use crate::demos::DemoEnv;

#[derive(Parser, Debug)]
#[command(name = "direct_route_demo", version, about = "Direct Route bundle demo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query the current bundle price
    Price,
    /// Query validator status
    Status,
    /// Look up a bundle by hash
    GetBundle {
        /// Bundle hash (0x-prefixed)
        hash: String,
    },
    /// Two accounts swap native coin in one bundle
    SendNative,
    /// Two accounts swap a BEP-20 token in one bundle, the second transfer may revert
    SendToken,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = DemoConfig::load()?;

    let _guards = LoggerManager::init(&config.log.level, &config.log.dir);
    bootstrap::setup_panic_hook();

    info!("========================================");
    info!("🚀 Direct Route Demo 启动: {:?}", cli.command);
    info!("========================================");

    let shutdown = CancellationToken::new();
    bootstrap::spawn_shutdown_listener(shutdown.clone());
    let ctx = CallContext::from_token(shutdown.clone());

    let env = DemoEnv::new(config, ctx).await?;
    let result = run(&env, &cli.command).await;

    env.close();
    shutdown.cancel();
    log_api_stats();

    if let Err(e) = &result {
        error!("❌ 执行失败: {:#}", e);
    }
    result
}

async fn run(env: &DemoEnv, command: &Command) -> Result<()> {
    match command {
        Command::Price => demos::bundle_price_demo(env).await.map(|_| ()),
        Command::Status => demos::status_demo(env).await,
        Command::GetBundle { hash } => demos::get_bundle_demo(env, hash).await,
        Command::SendNative => demos::send_native_by_bundle_demo(env).await,
        Command::SendToken => demos::send_token_by_bundle_demo(env).await,
    }
}
