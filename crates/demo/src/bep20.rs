//! BEP-20 代币 ABI 绑定

use ethers::abi::AbiEncode;
use ethers::prelude::*;

abigen!(
    Bep20Token,
    r#"[
        function transfer(address recipient, uint256 amount) external returns (bool)
        function balanceOf(address account) external view returns (uint256)
        function decimals() external view returns (uint8)
        function symbol() external view returns (string)
    ]"#
);

/// `transfer(recipient, amount)` 的调用数据
pub fn transfer_calldata(recipient: Address, amount: U256) -> Bytes {
    TransferCall { recipient, amount }.encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_calldata() {
        let recipient = Address::repeat_byte(0x22);
        let data = transfer_calldata(recipient, U256::from(1));

        // transfer(address,uint256) 选择器
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[16..36], recipient.as_bytes());
        assert_eq!(data[67], 1);
    }
}
