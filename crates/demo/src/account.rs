//! 外部账户：私钥加载与交易签名

use anyhow::{Context, Result};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::keccak256;

/// 签名后的交易
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    /// RLP 编码的签名交易
    pub raw: Bytes,
    /// 交易哈希
    pub hash: H256,
}

/// 外部账户 (EOA)
#[derive(Debug, Clone)]
pub struct ExtAccount {
    wallet: LocalWallet,
}

impl ExtAccount {
    /// 从十六进制私钥创建账户，`0x` 前缀可选
    pub fn from_hex_key(hex_key: &str, chain_id: u64) -> Result<Self> {
        let hex_key = hex_key.trim();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let raw = hex::decode(hex_key).context("私钥不是合法的十六进制字符串")?;
        let wallet = LocalWallet::from_bytes(&raw)
            .context("无效的私钥")?
            .with_chain_id(chain_id);

        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// 签名一笔 legacy (EIP-155) 交易
    ///
    /// `gas_price` 使用 Direct Route 返回的 Bundle 价格。
    pub fn sign_transfer(
        &self,
        to: Address,
        value: U256,
        data: Option<Bytes>,
        nonce: U256,
        gas_limit: u64,
        gas_price: U256,
    ) -> Result<SignedTransfer> {
        let mut request = TransactionRequest::new()
            .from(self.address())
            .to(to)
            .value(value)
            .nonce(nonce)
            .gas(gas_limit)
            .gas_price(gas_price)
            .chain_id(self.wallet.chain_id());
        if let Some(data) = data {
            request = request.data(data);
        }

        let tx: TypedTransaction = request.into();
        let signature = self
            .wallet
            .sign_transaction_sync(&tx)
            .context("交易签名失败")?;
        let raw = tx.rlp_signed(&signature);
        let hash = H256::from(keccak256(&raw));

        Ok(SignedTransfer { raw, hash })
    }
}
