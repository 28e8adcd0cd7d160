//! Contracts of the data sources the inventory engine reads once per cycle.

use crate::utils::{ChainId, Token};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("L1 token {0} is not registered")]
    UnknownL1Token(Address),
    #[error("no destination token for {l1_token} on chain {chain_id}")]
    NoDestinationToken { l1_token: Address, chain_id: ChainId },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no data for token {token} on chain {chain_id}")]
    MissingData { chain_id: ChainId, token: Address },
    #[error("provider request failed on chain {chain_id}: {reason}")]
    RequestFailed { chain_id: ChainId, reason: String },
}

/// Resolves token metadata and the per-chain address of each L1 token.
pub trait TokenRegistry: Send + Sync {
    fn l1_token(&self, address: Address) -> Result<Token, RegistryError>;

    /// Address of the token representing `l1_token` on `chain_id`.
    fn l2_token_for(&self, l1_token: Address, chain_id: ChainId) -> Result<Address, RegistryError>;
}

#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn balance(&self, chain_id: ChainId, l2_token: Address) -> Result<U256, ProviderError>;
}

/// Funds needed on a chain beyond its balance to fill the relays waiting there.
#[async_trait]
pub trait ShortfallProvider: Send + Sync {
    async fn shortfall(&self, chain_id: ChainId, l2_token: Address) -> Result<U256, ProviderError>;
}
