use crate::utils::constants::NORMALIZED_DECIMALS;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::default::Default;
use std::hash::{Hash, Hasher};

/// Canonical identity of an asset on the home chain ("L1 token").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Token {
    address: Address,
    decimals: u8,
    name: Option<String>,
    symbol: Option<String>,
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.get_address()
    }
}

impl Eq for Token {}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address.cmp(&other.get_address())
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Token {
    pub fn new(address: Address) -> Token {
        Token { address, decimals: 18, ..Token::default() }
    }

    pub fn new_with_data(address: Address, symbol: Option<String>, name: Option<String>, decimals: Option<u8>) -> Token {
        Token { address, symbol, name, decimals: decimals.unwrap_or(18) }
    }

    pub fn get_symbol(&self) -> String {
        self.symbol.clone().unwrap_or(self.address.to_string())
    }

    pub fn get_decimals(&self) -> u8 {
        self.decimals
    }

    pub fn get_address(&self) -> Address {
        self.address
    }

    /// Scale a raw native amount to the 18 decimal representation used for share arithmetic.
    pub fn to_normalized(&self, value: U256) -> U256 {
        match self.decimals.cmp(&NORMALIZED_DECIMALS) {
            Ordering::Equal => value,
            Ordering::Less => value * pow10(NORMALIZED_DECIMALS - self.decimals),
            Ordering::Greater => value / pow10(self.decimals - NORMALIZED_DECIMALS),
        }
    }

    /// Inverse of [`Token::to_normalized`]. Truncates any precision the token cannot hold.
    pub fn from_normalized(&self, value: U256) -> U256 {
        match self.decimals.cmp(&NORMALIZED_DECIMALS) {
            Ordering::Equal => value,
            Ordering::Less => value / pow10(NORMALIZED_DECIMALS - self.decimals),
            Ordering::Greater => value * pow10(self.decimals - NORMALIZED_DECIMALS),
        }
    }
}

fn pow10(exp: u8) -> U256 {
    U256::from(10).pow(U256::from(exp))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::constants::{USDC, WETH};
    use alloy_primitives::utils::Unit;

    fn usdc() -> Token {
        Token::new_with_data(USDC, Some("USDC".to_string()), None, Some(6))
    }

    #[test]
    fn test_serialize() {
        let weth_token = Token::new_with_data(WETH, Some("WETH".to_string()), None, Some(18));

        let serialized = serde_json::to_string(&weth_token).unwrap();
        assert_eq!(
            serialized,
            "{\"address\":\"0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2\",\"decimals\":18,\"name\":null,\"symbol\":\"WETH\"}"
        );
    }

    #[test]
    fn test_symbol_falls_back_to_address() {
        let token = Token::new(WETH);
        assert_eq!(token.get_symbol(), WETH.to_string());
    }

    #[test]
    fn test_normalize_six_decimals() {
        let token = usdc();
        let raw = U256::from(445_000_000u64);

        let normalized = token.to_normalized(raw);
        assert_eq!(normalized, U256::from(445u64) * Unit::ETHER.wei());
        assert_eq!(token.from_normalized(normalized), raw);
    }

    #[test]
    fn test_from_normalized_truncates() {
        let token = usdc();
        // 444.9999999999 USDC in 18 decimals only keeps 6 digits
        let normalized = U256::from(444_999_999_999_999_999_999u128);
        assert_eq!(token.from_normalized(normalized), U256::from(444_999_999u64));
    }

    #[test]
    fn test_normalize_more_than_eighteen_decimals() {
        let token = Token::new_with_data(Address::repeat_byte(7), None, None, Some(20));
        let raw = U256::from(12_345u64);

        assert_eq!(token.to_normalized(raw), U256::from(123u64));
        assert_eq!(token.from_normalized(U256::from(123u64)), U256::from(12_300u64));
    }

    #[test]
    fn test_eighteen_decimals_is_identity() {
        let token = Token::new(WETH);
        let raw = U256::from(17_799_999_999_999_999_880u128);
        assert_eq!(token.to_normalized(raw), raw);
    }
}
