//! 数值反序列化辅助
//!
//! 服务端用 Go 的 `*big.Int` 编码价格和区块号，序列化出来是 JSON 数字；
//! 其它节点实现常用 `0x` 十六进制字符串。这里两种都接受。

use ethers::types::U256;
use serde::de::{self, Deserializer, Unexpected};
use serde::Deserialize;
use serde_json::{Number, Value};

/// 任意精度非负整数
///
/// 接受 JSON 整数、十进制字符串、`0x` 十六进制字符串（`"0x"` 视为 0）。
/// `serde_json` 开启了 `arbitrary_precision`，超过 `u64` 的 JSON 整数保留原始数字。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quantity(pub U256);

impl Quantity {
    pub fn into_inner(self) -> U256 {
        self.0
    }
}

impl From<Quantity> for U256 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => quantity_from_number(&n).map(Quantity).map_err(de::Error::custom),
            Value::String(s) => parse_quantity(&s).map(Quantity).map_err(de::Error::custom),
            other => Err(de::Error::invalid_type(
                unexpected(&other),
                &"a non-negative integer, decimal string or 0x-prefixed hex string",
            )),
        }
    }
}

fn quantity_from_number(n: &Number) -> Result<U256, String> {
    if let Some(v) = n.as_u64() {
        return Ok(U256::from(v));
    }
    // 负数、小数、指数形式都不是合法的数量
    let digits = n.to_string();
    U256::from_dec_str(&digits).map_err(|_| format!("quantity {} is not a non-negative integer", digits))
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
    }
}

/// 解析十进制或 `0x` 十六进制字符串
pub fn parse_quantity(s: &str) -> Result<U256, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return Ok(U256::zero());
        }
        return U256::from_str_radix(hex, 16)
            .map_err(|_| format!("invalid hex quantity {:?}", s));
    }
    if s.is_empty() {
        return Err("empty quantity".to_string());
    }
    U256::from_dec_str(s).map_err(|_| format!("invalid decimal quantity {:?}", s))
}

/// `null` 或缺省时取零
pub fn deserialize_quantity<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Quantity>::deserialize(deserializer)?
        .map(Quantity::into_inner)
        .unwrap_or_default())
}

pub fn deserialize_quantity_opt<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Quantity>::deserialize(deserializer)?.map(Quantity::into_inner))
}

/// 数值形式的 `u64`（时间戳等），超出范围报错
pub fn deserialize_u64_quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_quantity(deserializer)?;
    if value.bits() > 64 {
        return Err(de::Error::custom(format!("quantity {} overflows u64", value)));
    }
    Ok(value.low_u64())
}

/// Go 的 nil slice / nil map 编码成 `null`
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quantity(v: serde_json::Value) -> Result<U256, serde_json::Error> {
        serde_json::from_value::<Quantity>(v).map(Quantity::into_inner)
    }

    #[test]
    fn test_quantity_formats() {
        assert_eq!(quantity(json!(3_000_000_000u64)).unwrap(), U256::from(3_000_000_000u64));
        assert_eq!(quantity(json!("3000000000")).unwrap(), U256::from(3_000_000_000u64));
        assert_eq!(quantity(json!("0xb2d05e00")).unwrap(), U256::from(3_000_000_000u64));
        assert_eq!(quantity(json!("0XB2D05E00")).unwrap(), U256::from(3_000_000_000u64));
        assert_eq!(quantity(json!("0x")).unwrap(), U256::zero());
    }

    #[test]
    fn test_quantity_beyond_u64_as_string() {
        let big = "340282366920938463463374607431768211456"; // 2^128
        assert_eq!(quantity(json!(big)).unwrap(), U256::from(2u8).pow(U256::from(128u8)));
    }

    #[test]
    fn test_quantity_beyond_u64_as_bare_number() {
        // 2^65，Go 的 *big.Int 直接编码成 JSON 数字
        let expected = U256::from(2u8).pow(U256::from(65u8));

        let from_text: Quantity = serde_json::from_str("36893488147419103232").unwrap();
        assert_eq!(from_text.into_inner(), expected);

        let value: serde_json::Value = serde_json::from_str("36893488147419103232").unwrap();
        assert_eq!(quantity(value).unwrap(), expected);
    }

    #[test]
    fn test_quantity_rejects_invalid() {
        assert!(quantity(json!(-1)).is_err());
        assert!(quantity(json!(1.5)).is_err());
        assert!(quantity(json!("")).is_err());
        assert!(quantity(json!("0xzz")).is_err());
        assert!(quantity(json!(true)).is_err());
        assert!(serde_json::from_str::<Quantity>("-36893488147419103232").is_err());
        assert!(serde_json::from_str::<Quantity>("1e3").is_err());
    }

    #[test]
    fn test_parse_quantity_trims() {
        assert_eq!(parse_quantity(" 42 ").unwrap(), U256::from(42));
    }
}
