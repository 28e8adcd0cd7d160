//! In-memory token registry and balance/shortfall source.
//!
//! Used by the scenario tests, the demo cycle and the benches. Every setter takes `&self` so a
//! test can keep an `Arc` to the mock while the inventory client holds another.

use super::providers::{BalanceProvider, ProviderError, RegistryError, ShortfallProvider, TokenRegistry};
use crate::utils::{ChainId, Token};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

/// Balances and shortfalls keyed by (chain id, token address on that chain).
#[derive(Debug, Default)]
pub struct MockTokenClient {
    balances: DashMap<(ChainId, Address), U256>,
    shortfalls: DashMap<(ChainId, Address), ShortfallData>,
    failing: DashSet<(ChainId, Address)>,
}

#[derive(Debug, Clone, Default)]
pub struct ShortfallData {
    pub amount: U256,
    /// Deposits whose fill is blocked by the shortfall.
    pub deposit_ids: Vec<u32>,
}

impl MockTokenClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token_data(&self, chain_id: ChainId, token: Address, balance: U256) {
        self.balances.insert((chain_id, token), balance);
    }

    pub fn set_token_shortfall(&self, chain_id: ChainId, token: Address, amount: U256) {
        self.set_token_shortfall_data(chain_id, token, Vec::new(), amount);
    }

    pub fn set_token_shortfall_data(&self, chain_id: ChainId, token: Address, deposit_ids: Vec<u32>, amount: U256) {
        self.shortfalls.insert((chain_id, token), ShortfallData { amount, deposit_ids });
    }

    pub fn shortfall_data(&self, chain_id: ChainId, token: Address) -> Option<ShortfallData> {
        self.shortfalls.get(&(chain_id, token)).map(|entry| entry.clone())
    }

    /// Mirror funds leaving a chain, as a live balance source would after a bridge deposit.
    pub fn decrement_local_balance(&self, chain_id: ChainId, token: Address, amount: U256) {
        if let Some(mut balance) = self.balances.get_mut(&(chain_id, token)) {
            *balance = balance.saturating_sub(amount);
        }
    }

    pub fn get_balance(&self, chain_id: ChainId, token: Address) -> U256 {
        self.balances.get(&(chain_id, token)).map(|balance| *balance).unwrap_or_default()
    }

    /// Make every balance and shortfall lookup for the pair fail until cleared.
    pub fn fail_lookups_for(&self, chain_id: ChainId, token: Address) {
        self.failing.insert((chain_id, token));
    }

    pub fn clear_failures(&self) {
        self.failing.clear();
    }

    fn check_available(&self, chain_id: ChainId, token: Address) -> Result<(), ProviderError> {
        if self.failing.contains(&(chain_id, token)) {
            return Err(ProviderError::RequestFailed { chain_id, reason: format!("mocked failure for {token}") });
        }
        Ok(())
    }
}

#[async_trait]
impl BalanceProvider for MockTokenClient {
    async fn balance(&self, chain_id: ChainId, l2_token: Address) -> Result<U256, ProviderError> {
        self.check_available(chain_id, l2_token)?;
        self.balances.get(&(chain_id, l2_token)).map(|balance| *balance).ok_or(ProviderError::MissingData { chain_id, token: l2_token })
    }
}

#[async_trait]
impl ShortfallProvider for MockTokenClient {
    async fn shortfall(&self, chain_id: ChainId, l2_token: Address) -> Result<U256, ProviderError> {
        self.check_available(chain_id, l2_token)?;
        Ok(self.shortfalls.get(&(chain_id, l2_token)).map(|data| data.amount).unwrap_or_default())
    }
}

/// Registry of L1 tokens and their destination addresses.
#[derive(Debug, Default)]
pub struct MockTokenRegistry {
    tokens: DashMap<Address, Token>,
    destinations: DashMap<(Address, ChainId), Address>,
}

impl MockTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_l1_token(&self, token: Token) {
        self.tokens.insert(token.get_address(), token);
    }

    pub fn set_destination_token(&self, l1_token: Address, chain_id: ChainId, l2_token: Address) {
        self.destinations.insert((l1_token, chain_id), l2_token);
    }

    pub fn remove_destination_token(&self, l1_token: Address, chain_id: ChainId) {
        self.destinations.remove(&(l1_token, chain_id));
    }
}

impl TokenRegistry for MockTokenRegistry {
    fn l1_token(&self, address: Address) -> Result<Token, RegistryError> {
        self.tokens.get(&address).map(|token| token.clone()).ok_or(RegistryError::UnknownL1Token(address))
    }

    fn l2_token_for(&self, l1_token: Address, chain_id: ChainId) -> Result<Address, RegistryError> {
        self.destinations
            .get(&(l1_token, chain_id))
            .map(|address| *address)
            .ok_or(RegistryError::NoDestinationToken { l1_token, chain_id })
    }
}
