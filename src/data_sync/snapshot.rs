use super::config::InventoryConfig;
use super::providers::{BalanceProvider, ProviderError, RegistryError, ShortfallProvider, TokenRegistry};
use crate::utils::{ChainId, Token};
use ahash::{HashMap, HashSet};
use alloy_primitives::{Address, U256};
use thiserror::Error;
use tracing::{debug, warn};

/// (chain id, L1 token address)
pub type PairKey = (ChainId, Address);

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Balances and shortfalls of every configured (chain, token) pair, taken once per cycle.
///
/// Amounts are raw native units of the L1 token. Pairs whose data could not be fetched are
/// marked unavailable and take no part in the cycle's decisions.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    tokens: HashMap<Address, Token>,
    l2_tokens: HashMap<PairKey, Address>,
    balances: HashMap<PairKey, U256>,
    shortfalls: HashMap<PairKey, U256>,
    unavailable: HashSet<PairKey>,
    /// Unix seconds when the snapshot was taken
    pub timestamp: u64,
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self {
            timestamp: std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs(),
            ..Self::default()
        }
    }

    /// Build a fresh snapshot for every configured token on every enabled chain.
    ///
    /// A failing lookup only removes its own pair from the cycle.
    pub async fn refresh(
        config: &InventoryConfig,
        registry: &dyn TokenRegistry,
        balance_provider: &dyn BalanceProvider,
        shortfall_provider: &dyn ShortfallProvider,
    ) -> Self {
        let mut snapshot = Self::new();

        for l1_token in config.l1_tokens() {
            let token = match registry.l1_token(l1_token) {
                Ok(token) => token,
                Err(e) => {
                    warn!(%l1_token, error = %e, "L1 token not resolvable, skipping it for this cycle");
                    for chain_id in config.enabled_chains() {
                        snapshot.mark_unavailable(*chain_id, l1_token);
                    }
                    continue;
                }
            };
            snapshot.set_token(token);

            for chain_id in config.enabled_chains().iter().copied() {
                let fetched = snapshot
                    .refresh_pair(config.home_chain_id(), chain_id, l1_token, registry, balance_provider, shortfall_provider)
                    .await;
                if let Err(e) = fetched {
                    warn!(chain_id, %l1_token, error = %e, "Inventory data unavailable, skipping pair for this cycle");
                    snapshot.mark_unavailable(chain_id, l1_token);
                }
            }
        }

        debug!(
            tokens = snapshot.tokens.len(),
            pairs = snapshot.balances.len(),
            unavailable = snapshot.unavailable.len(),
            "Inventory snapshot refreshed"
        );
        snapshot
    }

    async fn refresh_pair(
        &mut self,
        home_chain_id: ChainId,
        chain_id: ChainId,
        l1_token: Address,
        registry: &dyn TokenRegistry,
        balance_provider: &dyn BalanceProvider,
        shortfall_provider: &dyn ShortfallProvider,
    ) -> Result<(), SnapshotError> {
        let l2_token = if chain_id == home_chain_id { l1_token } else { registry.l2_token_for(l1_token, chain_id)? };

        let balance = balance_provider.balance(chain_id, l2_token).await?;
        let shortfall = shortfall_provider.shortfall(chain_id, l2_token).await?;

        self.l2_tokens.insert((chain_id, l1_token), l2_token);
        self.set_balance(chain_id, l1_token, balance);
        self.set_shortfall(chain_id, l1_token, shortfall);
        Ok(())
    }

    pub fn set_token(&mut self, token: Token) {
        self.tokens.insert(token.get_address(), token);
    }

    pub fn token(&self, l1_token: Address) -> Option<&Token> {
        self.tokens.get(&l1_token)
    }

    pub fn set_l2_token(&mut self, chain_id: ChainId, l1_token: Address, l2_token: Address) {
        self.l2_tokens.insert((chain_id, l1_token), l2_token);
    }

    pub fn l2_token(&self, chain_id: ChainId, l1_token: Address) -> Option<Address> {
        self.l2_tokens.get(&(chain_id, l1_token)).copied()
    }

    pub fn set_balance(&mut self, chain_id: ChainId, l1_token: Address, amount: U256) {
        self.balances.insert((chain_id, l1_token), amount);
        self.unavailable.remove(&(chain_id, l1_token));
    }

    pub fn balance(&self, chain_id: ChainId, l1_token: Address) -> U256 {
        self.balances.get(&(chain_id, l1_token)).copied().unwrap_or_default()
    }

    /// Reflect funds that left `chain_id` since the snapshot was taken.
    pub fn decrement_balance(&mut self, chain_id: ChainId, l1_token: Address, amount: U256) {
        if let Some(balance) = self.balances.get_mut(&(chain_id, l1_token)) {
            *balance = balance.saturating_sub(amount);
        }
    }

    pub fn set_shortfall(&mut self, chain_id: ChainId, l1_token: Address, amount: U256) {
        self.shortfalls.insert((chain_id, l1_token), amount);
    }

    pub fn shortfall(&self, chain_id: ChainId, l1_token: Address) -> U256 {
        self.shortfalls.get(&(chain_id, l1_token)).copied().unwrap_or_default()
    }

    pub fn mark_unavailable(&mut self, chain_id: ChainId, l1_token: Address) {
        self.balances.remove(&(chain_id, l1_token));
        self.shortfalls.remove(&(chain_id, l1_token));
        self.unavailable.insert((chain_id, l1_token));
    }

    pub fn is_available(&self, chain_id: ChainId, l1_token: Address) -> bool {
        !self.unavailable.contains(&(chain_id, l1_token)) && self.balances.contains_key(&(chain_id, l1_token))
    }

    /// Raw balances of `l1_token` on every chain present in the snapshot.
    pub fn balances_of(&self, l1_token: Address) -> impl Iterator<Item = (ChainId, U256)> + '_ {
        self.balances.iter().filter(move |((_, token), _)| *token == l1_token).map(|((chain_id, _), amount)| (*chain_id, *amount))
    }
}
