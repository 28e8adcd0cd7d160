use crate::utils::ChainId;
use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("bridge submission of {amount} {l1_token} to chain {chain_id} rejected: {reason}")]
    SubmissionRejected { chain_id: ChainId, l1_token: Address, amount: U256, reason: String },
    #[error("outstanding transfer query for {l1_token} on chain {chain_id} failed: {reason}")]
    QueryFailed { chain_id: ChainId, l1_token: Address, reason: String },
}

/// Moves L1 tokens from the home chain to a remote chain through that chain's canonical bridge.
#[async_trait]
pub trait BridgeAdapter: Send + Sync {
    /// Submit the deposit. Returns once the submission is accepted, not when funds arrive.
    async fn send_token_cross_chain(
        &self,
        chain_id: ChainId,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
    ) -> Result<TxHash, BridgeError>;

    /// Aggregate amount of `l1_token` deposited toward `chain_id` and not yet credited there.
    async fn outstanding_cross_chain_transfer_amount(&self, chain_id: ChainId, l1_token: Address)
    -> Result<U256, BridgeError>;
}
