use alloy_primitives::{Address, U256, address};

pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// Chain holding the canonical reserve of every L1 token (Ethereum mainnet).
pub const HOME_CHAIN_ID: u64 = 1;

/// All share arithmetic happens on amounts scaled to this many decimals.
pub const NORMALIZED_DECIMALS: u8 = 18;

/// 1.0 in fixed-point.
pub const FIXED_POINT_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

pub const ONE_HUNDRED: U256 = U256::from_limbs([100, 0, 0, 0]);
